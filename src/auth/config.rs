//! Immutable authentication settings built once at startup.

use secrecy::{ExposeSecret, SecretString};

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;
pub const DEFAULT_GOOGLE_TOKENINFO_URL: &str = "https://oauth2.googleapis.com/tokeninfo";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    jwt_secret: SecretString,
    token_ttl_hours: i64,
    google_client_id: String,
    google_tokeninfo_url: String,
}

impl AuthConfig {
    #[must_use]
    pub fn new(jwt_secret: SecretString) -> Self {
        Self {
            jwt_secret,
            token_ttl_hours: DEFAULT_TOKEN_TTL_HOURS,
            google_client_id: String::new(),
            google_tokeninfo_url: DEFAULT_GOOGLE_TOKENINFO_URL.to_string(),
        }
    }

    #[must_use]
    pub fn with_token_ttl_hours(mut self, hours: i64) -> Self {
        self.token_ttl_hours = hours;
        self
    }

    #[must_use]
    pub fn with_google_client_id(mut self, client_id: String) -> Self {
        self.google_client_id = client_id;
        self
    }

    #[must_use]
    pub fn with_google_tokeninfo_url(mut self, url: String) -> Self {
        self.google_tokeninfo_url = url;
        self
    }

    #[must_use]
    pub fn token_ttl_hours(&self) -> i64 {
        self.token_ttl_hours
    }

    #[must_use]
    pub fn google_client_id(&self) -> &str {
        &self.google_client_id
    }

    #[must_use]
    pub fn google_tokeninfo_url(&self) -> &str {
        &self.google_tokeninfo_url
    }

    pub(crate) fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.expose_secret().as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_overrides() {
        let config = AuthConfig::new(SecretString::from("secret"));
        assert_eq!(config.token_ttl_hours(), 24);
        assert_eq!(config.google_client_id(), "");
        assert_eq!(config.google_tokeninfo_url(), DEFAULT_GOOGLE_TOKENINFO_URL);

        let config = config
            .with_token_ttl_hours(2)
            .with_google_client_id("client.apps.googleusercontent.com".to_string());
        assert_eq!(config.token_ttl_hours(), 2);
        assert_eq!(config.google_client_id(), "client.apps.googleusercontent.com");
        assert_eq!(config.jwt_secret_bytes(), b"secret");
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config = AuthConfig::new(SecretString::from("super-secret-value"));
        assert!(!format!("{config:?}").contains("super-secret-value"));
    }
}
