use crate::{api, cli::actions::Action};
use anyhow::{bail, Context, Result};
use tracing::info;
use url::Url;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server { port, dsn, auth } => {
            let url = Url::parse(&dsn).context("Invalid database connection string")?;

            if !matches!(url.scheme(), "postgres" | "postgresql") {
                bail!("Unsupported database scheme: {}", url.scheme());
            }

            info!(
                port,
                db_host = url.host_str().unwrap_or_default(),
                token_ttl_hours = auth.token_ttl_hours(),
                "starting donor-api"
            );

            api::new(port, dsn, auth).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthConfig;
    use secrecy::SecretString;

    fn action(dsn: &str) -> Action {
        Action::Server {
            port: 8080,
            dsn: dsn.to_string(),
            auth: AuthConfig::new(SecretString::from("secret")),
        }
    }

    #[tokio::test]
    async fn test_rejects_malformed_dsn() {
        let err = handle(action("not a url")).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid database connection string");
    }

    #[tokio::test]
    async fn test_rejects_non_postgres_dsn() {
        let err = handle(action("mysql://user@localhost/donor")).await.unwrap_err();
        assert_eq!(err.to_string(), "Unsupported database scheme: mysql");
    }
}
