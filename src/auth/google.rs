//! Federated identity verification.
//!
//! [`IdentityVerifier`] is the seam the authentication service calls to turn a
//! third-party ID token into a verified email and display name. The production
//! implementation asks Google's `tokeninfo` endpoint to check the token and then
//! checks audience, issuer and email verification locally.

use crate::{error::Error, APP_USER_AGENT};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, Instrument, info_span};
use url::Url;

const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub email: String,
    pub name: String,
}

#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify `id_token` for `audience`.
    ///
    /// # Errors
    /// `Error::InvalidCredential` when the token is rejected, `Error::Internal`
    /// when the provider cannot be reached.
    async fn verify(&self, id_token: &str, audience: &str) -> Result<VerifiedIdentity, Error>;
}

#[derive(Clone, Debug)]
pub struct GoogleVerifier {
    client: Client,
    tokeninfo_url: Url,
}

impl GoogleVerifier {
    /// # Errors
    /// Returns an error if the endpoint URL is invalid or the HTTP client cannot be built.
    pub fn new(tokeninfo_url: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_secs(5))
            .build()?;

        Ok(Self {
            client,
            tokeninfo_url: Url::parse(tokeninfo_url)?,
        })
    }
}

#[async_trait]
impl IdentityVerifier for GoogleVerifier {
    #[instrument(skip_all)]
    async fn verify(&self, id_token: &str, audience: &str) -> Result<VerifiedIdentity, Error> {
        if audience.is_empty() {
            debug!("Google login is not configured: empty client id");
            return Err(Error::InvalidCredential);
        }

        let mut url = self.tokeninfo_url.clone();
        url.query_pairs_mut().append_pair("id_token", id_token);

        let span = info_span!("http.client", http.method = "GET", peer.service = "google");
        let response = self
            .client
            .get(url)
            .send()
            .instrument(span)
            .await
            .map_err(|err| Error::Internal(format!("tokeninfo request failed: {err}")))?;

        if response.status().is_server_error() {
            return Err(Error::Internal(format!(
                "tokeninfo returned {}",
                response.status()
            )));
        }

        if !response.status().is_success() {
            debug!("tokeninfo rejected token: {}", response.status());
            return Err(Error::InvalidCredential);
        }

        let claims: Value = response
            .json()
            .await
            .map_err(|err| Error::Internal(format!("tokeninfo response unreadable: {err}")))?;

        check_claims(&claims, audience)
    }
}

/// Checks tokeninfo claims and extracts the verified identity.
pub(crate) fn check_claims(claims: &Value, audience: &str) -> Result<VerifiedIdentity, Error> {
    if claims["aud"].as_str() != Some(audience) {
        debug!("tokeninfo audience mismatch");
        return Err(Error::InvalidCredential);
    }

    let issuer = claims["iss"].as_str().unwrap_or_default();
    if !GOOGLE_ISSUERS.contains(&issuer) {
        debug!("tokeninfo issuer mismatch: {issuer}");
        return Err(Error::InvalidCredential);
    }

    // tokeninfo reports booleans as strings
    let verified = match &claims["email_verified"] {
        Value::Bool(flag) => *flag,
        Value::String(flag) => flag == "true",
        _ => false,
    };

    let email = claims["email"]
        .as_str()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or(Error::InvalidCredential)?;

    if !verified {
        debug!("tokeninfo email is not verified");
        return Err(Error::InvalidCredential);
    }

    let name = claims["name"]
        .as_str()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map_or_else(
            || email.split('@').next().unwrap_or(email).to_string(),
            ToString::to_string,
        );

    Ok(VerifiedIdentity {
        email: email.to_string(),
        name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const AUDIENCE: &str = "client.apps.googleusercontent.com";

    #[test]
    fn accepts_verified_token() {
        let claims = json!({
            "aud": AUDIENCE,
            "iss": "https://accounts.google.com",
            "email": "jane@example.com",
            "email_verified": "true",
            "name": "Jane Donor",
        });
        let identity = check_claims(&claims, AUDIENCE).unwrap();
        assert_eq!(identity.email, "jane@example.com");
        assert_eq!(identity.name, "Jane Donor");
    }

    #[test]
    fn name_falls_back_to_local_part() {
        let claims = json!({
            "aud": AUDIENCE,
            "iss": "accounts.google.com",
            "email": "jane@example.com",
            "email_verified": true,
        });
        let identity = check_claims(&claims, AUDIENCE).unwrap();
        assert_eq!(identity.name, "jane");
    }

    #[test]
    fn rejects_wrong_audience_issuer_or_unverified_email() {
        let base = json!({
            "aud": AUDIENCE,
            "iss": "accounts.google.com",
            "email": "jane@example.com",
            "email_verified": "true",
        });

        let mut wrong_aud = base.clone();
        wrong_aud["aud"] = json!("someone-else");
        assert!(matches!(
            check_claims(&wrong_aud, AUDIENCE),
            Err(Error::InvalidCredential)
        ));

        let mut wrong_iss = base.clone();
        wrong_iss["iss"] = json!("https://evil.example.com");
        assert!(matches!(
            check_claims(&wrong_iss, AUDIENCE),
            Err(Error::InvalidCredential)
        ));

        let mut unverified = base.clone();
        unverified["email_verified"] = json!("false");
        assert!(matches!(
            check_claims(&unverified, AUDIENCE),
            Err(Error::InvalidCredential)
        ));

        let mut no_email = base;
        no_email["email"] = json!("");
        assert!(matches!(
            check_claims(&no_email, AUDIENCE),
            Err(Error::InvalidCredential)
        ));
    }

    #[tokio::test]
    async fn empty_audience_is_rejected_without_a_request() {
        let verifier = GoogleVerifier::new("http://127.0.0.1:9/tokeninfo").unwrap();
        assert!(matches!(
            verifier.verify("token", "").await,
            Err(Error::InvalidCredential)
        ));
    }
}
