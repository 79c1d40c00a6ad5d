//! Signed bearer tokens (HS256).
//!
//! Tokens carry the account id (`sub`), the role, the tenant for tenant-scoped
//! roles, and `iat`/`exp` as Unix seconds. `exp` is always `iat + ttl`.
//! Validation accepts only the HMAC family and rejects every failure with the
//! same [`Error::InvalidToken`].

use crate::{
    auth::{config::AuthConfig, role::Role},
    error::Error,
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

const SECONDS_PER_HOUR: i64 = 60 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    pub iat: i64,
    pub exp: i64,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_seconds: i64,
}

impl TokenService {
    #[must_use]
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_seconds: config.token_ttl_hours().saturating_mul(SECONDS_PER_HOUR),
        }
    }

    /// Issue a token valid from now.
    ///
    /// # Errors
    /// Returns `Error::Internal` if signing fails.
    pub fn issue(
        &self,
        account_id: Uuid,
        role: Role,
        tenant_id: Option<Uuid>,
    ) -> Result<String, Error> {
        self.issue_at(account_id, role, tenant_id, Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `now` (Unix seconds).
    ///
    /// # Errors
    /// Returns `Error::Internal` if signing fails.
    pub fn issue_at(
        &self,
        account_id: Uuid,
        role: Role,
        tenant_id: Option<Uuid>,
        now: i64,
    ) -> Result<String, Error> {
        let tenant_id = if role.is_tenant_scoped() {
            tenant_id.map(|id| id.to_string())
        } else {
            None
        };

        let claims = Claims {
            sub: account_id.to_string(),
            role: role.as_str().to_string(),
            tenant_id,
            iat: now,
            exp: now.saturating_add(self.ttl_seconds),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|err| Error::Internal(format!("token signing failed: {err}")))
    }

    /// Validate a token against the current time.
    ///
    /// # Errors
    /// Returns `Error::InvalidToken` on any structural, algorithm, signature or expiry failure.
    pub fn validate(&self, token: &str) -> Result<Claims, Error> {
        self.validate_at(token, Utc::now().timestamp())
    }

    /// Validate a token as if the current time were `now` (Unix seconds).
    ///
    /// # Errors
    /// Returns `Error::InvalidToken` on any structural, algorithm, signature or expiry failure.
    pub fn validate_at(&self, token: &str, now: i64) -> Result<Claims, Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        // Expiry is checked below against the injected clock, without leeway.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = jsonwebtoken::decode::<Claims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .map_err(|err| {
                debug!("Token rejected: {err}");
                Error::InvalidToken
            })?;

        if now >= claims.exp {
            debug!("Token rejected: expired at {}", claims.exp);
            return Err(Error::InvalidToken);
        }

        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    // {"alg":"none","typ":"JWT"}
    const NONE_HEADER: &str = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0";
    // {"alg":"RS256","typ":"JWT"}
    const RS256_HEADER: &str = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9";

    fn service(secret: &str, ttl_hours: i64) -> TokenService {
        TokenService::new(&AuthConfig::new(SecretString::from(secret)).with_token_ttl_hours(ttl_hours))
    }

    fn swap_header(token: &str, header: &str) -> String {
        let mut parts = token.splitn(2, '.');
        let _ = parts.next();
        format!("{header}.{}", parts.next().unwrap())
    }

    #[test]
    fn round_trip_keeps_claims() {
        let tokens = service("secret", 24);
        let account = Uuid::new_v4();
        let tenant = Uuid::new_v4();

        for role in [Role::Donor, Role::Admin] {
            let token = tokens.issue(account, role, Some(tenant)).unwrap();
            let claims = tokens.validate(&token).unwrap();
            assert_eq!(claims.sub, account.to_string());
            assert_eq!(claims.role, role.as_str());
            assert_eq!(claims.tenant_id, Some(tenant.to_string()));
        }
    }

    #[test]
    fn superadmin_tokens_omit_tenant() {
        let tokens = service("secret", 24);
        let token = tokens
            .issue(Uuid::new_v4(), Role::SuperAdmin, Some(Uuid::new_v4()))
            .unwrap();
        let claims = tokens.validate(&token).unwrap();
        assert_eq!(claims.role, "superadmin");
        assert_eq!(claims.tenant_id, None);
    }

    #[test]
    fn expiry_is_issued_at_plus_ttl() {
        let tokens = service("secret", 3);
        let now = 1_700_000_000;
        let token = tokens.issue_at(Uuid::new_v4(), Role::Donor, None, now).unwrap();
        let claims = tokens.validate_at(&token, now).unwrap();
        assert_eq!(claims.iat, now);
        assert_eq!(claims.exp, now + 3 * 3600);
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let tokens = service("secret", 1);
        let now = 1_700_000_000;
        let token = tokens.issue_at(Uuid::new_v4(), Role::Donor, None, now).unwrap();

        assert!(tokens.validate_at(&token, now + 3599).is_ok());
        assert!(matches!(
            tokens.validate_at(&token, now + 3600),
            Err(Error::InvalidToken)
        ));
        assert!(matches!(
            tokens.validate_at(&token, now + 7200),
            Err(Error::InvalidToken)
        ));
    }

    #[test]
    fn different_secret_is_rejected() {
        let issuer = service("secret-a", 24);
        let verifier = service("secret-b", 24);
        let token = issuer.issue(Uuid::new_v4(), Role::Admin, None).unwrap();
        assert!(matches!(verifier.validate(&token), Err(Error::InvalidToken)));
    }

    #[test]
    fn algorithm_confusion_is_rejected() {
        let tokens = service("secret", 24);
        let token = tokens.issue(Uuid::new_v4(), Role::Admin, None).unwrap();

        let unsigned = swap_header(&token, NONE_HEADER);
        assert!(matches!(tokens.validate(&unsigned), Err(Error::InvalidToken)));

        let rs256 = swap_header(&token, RS256_HEADER);
        assert!(matches!(tokens.validate(&rs256), Err(Error::InvalidToken)));

        let stripped = token.rsplit_once('.').map(|(head, _)| format!("{head}.")).unwrap();
        assert!(matches!(tokens.validate(&stripped), Err(Error::InvalidToken)));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let tokens = service("secret", 24);
        for token in ["", "abc", "a.b", "a.b.c", "....."] {
            assert!(matches!(tokens.validate(token), Err(Error::InvalidToken)));
        }
    }

    #[test]
    fn altered_signature_is_rejected() {
        let tokens = service("secret", 24);
        let token = tokens.issue(Uuid::new_v4(), Role::Donor, None).unwrap();
        let (head, signature) = token.rsplit_once('.').unwrap();
        let first = signature.chars().next().unwrap();
        let replacement = if first == 'A' { 'B' } else { 'A' };
        let tampered = format!("{head}.{replacement}{}", &signature[1..]);
        assert!(matches!(tokens.validate(&tampered), Err(Error::InvalidToken)));
    }
}
