//! Authentication and authorization.
//!
//! Leaves first: [`password`] hashes credentials, [`token`] signs and checks
//! bearer tokens, [`google`] verifies federated ID tokens. [`service`] wires them
//! into registration and the two login flows, and [`middleware`] turns a bearer
//! token into a request-scoped [`Identity`] and enforces role allow-lists.

pub mod config;
pub mod google;
pub mod middleware;
pub mod password;
pub mod role;
pub mod service;
pub mod slug;
pub mod token;

pub use config::AuthConfig;
pub use google::{GoogleVerifier, IdentityVerifier, VerifiedIdentity};
pub use middleware::{require_auth, require_roles, Identity, RoleGate};
pub use password::CredentialHasher;
pub use role::Role;
pub use service::{AuthService, LoginResult, Registration};
pub use token::{Claims, TokenService};
