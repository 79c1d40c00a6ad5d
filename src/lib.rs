//! # Donor API (multi-tenant blood donation backend)
//!
//! `donor-api` manages tenants, donation locations, donors, events, blood stock
//! and blood requests behind bearer-token authentication.
//!
//! ## Tenants
//!
//! Every self-registered account gets its own tenant. The tenant slug is derived
//! from the registrant's name and is unique across the system; collisions are
//! resolved with a numeric suffix (`-2`, `-3`, ...).
//!
//! ## Authentication
//!
//! Accounts log in with email and password (Argon2id hashes) or with a Google ID
//! token. Both flows return the same signed HS256 token carrying `sub`, `role`,
//! `tenant_id`, `iat` and `exp`. Superadmin tokens never carry a tenant.
//!
//! ## Authorization
//!
//! Protected routes run the bearer middleware first, which places an
//! [`auth::Identity`] in the request extensions, and then an optional role gate
//! with a fixed allow-list of roles. Tenant-scoped roles only see rows that belong
//! to their tenant.

pub mod api;
pub mod auth;
pub mod cli;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use error::Error;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(GIT_COMMIT_HASH.len() >= 7);
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
