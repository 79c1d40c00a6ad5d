//! Argon2id password hashing.

use crate::error::Error;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

#[derive(Clone, Debug)]
pub struct CredentialHasher {
    params: Params,
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self {
            params: Params::default(),
        }
    }
}

impl CredentialHasher {
    /// Hasher with explicit cost parameters. Verification always uses the
    /// parameters encoded in the stored hash.
    #[must_use]
    pub fn with_params(params: Params) -> Self {
        Self { params }
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash a plaintext password into a PHC string with a random salt.
    ///
    /// # Errors
    /// Returns `Error::Internal` if hashing fails.
    pub fn hash(&self, plaintext: &str) -> Result<String, Error> {
        let salt = SaltString::generate(&mut rand::thread_rng());
        self.argon2()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|err| Error::Internal(format!("password hashing failed: {err}")))
    }

    /// Returns `false` on mismatch or on an unparsable hash; never errors.
    #[must_use]
    pub fn verify(&self, plaintext: &str, hash: &str) -> bool {
        PasswordHash::new(hash).is_ok_and(|parsed| {
            self.argon2()
                .verify_password(plaintext.as_bytes(), &parsed)
                .is_ok()
        })
    }
}

#[cfg(test)]
pub(crate) fn test_hasher() -> CredentialHasher {
    // Cheap parameters keep debug-build tests fast.
    CredentialHasher::with_params(Params::new(1024, 1, 1, None).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hasher = test_hasher();
        let hash = hasher.hash("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("correct horse battery", &hash));
        assert!(!hasher.verify("wrong horse battery", &hash));
    }

    #[test]
    fn salts_differ() {
        let hasher = test_hasher();
        let first = hasher.hash("password123").unwrap();
        let second = hasher.hash("password123").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn garbage_hash_is_a_mismatch() {
        let hasher = test_hasher();
        assert!(!hasher.verify("password123", "not-a-phc-string"));
        assert!(!hasher.verify("password123", ""));
    }
}
