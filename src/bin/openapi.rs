use anyhow::Result;
use donor_api::api::openapi;

// Print the OpenAPI document, used to publish the contract without a database
fn main() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&openapi())?);
    Ok(())
}
