//! Business operations behind the HTTP handlers.
//!
//! Services take typed input, enforce tenant scope and map store failures onto
//! [`crate::Error`]. They hold their stores as trait objects so the same code runs
//! over Postgres and the in-memory store.

pub mod accounts;
pub mod locations;
pub mod resource;
pub mod tenants;

pub use accounts::{AccountService, DetailInput, Profile};
pub use locations::NearbyLocation;
pub use resource::ResourceService;
