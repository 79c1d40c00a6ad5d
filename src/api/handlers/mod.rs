//! HTTP handlers.
//!
//! Handlers parse and validate the wire format, call a service and wrap the
//! result in the JSON envelope. Identity comes from the bearer middleware; they
//! never read the token themselves.

pub mod auth;
pub mod blood_requests;
pub mod donations;
pub mod events;
pub mod health;
pub mod locations;
pub mod profile;
pub mod root;
pub mod stocks;
pub mod tenants;
pub mod users;

use crate::{auth::Identity, error::Error, store::PageRequest};
use axum::{extract::Query, Json};
use uuid::Uuid;

pub(crate) fn payload<T>(payload: Option<Json<T>>) -> Result<T, Error> {
    payload
        .map(|Json(payload)| payload)
        .ok_or_else(|| Error::Validation("missing or malformed payload".to_string()))
}

pub(crate) fn page(query: Option<Query<PageRequest>>) -> PageRequest {
    query
        .map(|Query(page)| page)
        .unwrap_or_default()
        .normalized()
}

pub(crate) fn parse_id(field: &str, value: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(value.trim()).map_err(|_| Error::Validation(format!("{field} is not a valid id")))
}

pub(crate) fn parse_optional_id(field: &str, value: Option<&str>) -> Result<Option<Uuid>, Error> {
    value
        .filter(|value| !value.trim().is_empty())
        .map(|value| parse_id(field, value))
        .transpose()
}

pub(crate) fn required(field: &str, value: &str) -> Result<String, Error> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }
    Ok(value.to_string())
}

/// Tenant that owns a new row: the caller's own tenant for tenant-scoped roles,
/// the requested one for superadmins.
pub(crate) fn owning_tenant(identity: &Identity, requested: Option<Uuid>) -> Result<Uuid, Error> {
    if identity.role.is_tenant_scoped() {
        return identity.tenant_id.ok_or(Error::Forbidden);
    }
    requested.ok_or_else(|| Error::Validation("tenant_id is required".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    #[test]
    fn owning_tenant_rules() {
        let tenant = Uuid::new_v4();
        let admin = Identity {
            account_id: Uuid::new_v4(),
            role: Role::Admin,
            tenant_id: Some(tenant),
        };
        assert_eq!(owning_tenant(&admin, Some(Uuid::new_v4())).unwrap(), tenant);

        let superadmin = Identity {
            account_id: Uuid::new_v4(),
            role: Role::SuperAdmin,
            tenant_id: None,
        };
        assert!(matches!(
            owning_tenant(&superadmin, None),
            Err(Error::Validation(_))
        ));
        assert_eq!(owning_tenant(&superadmin, Some(tenant)).unwrap(), tenant);

        let unbound = Identity {
            tenant_id: None,
            ..admin
        };
        assert!(matches!(owning_tenant(&unbound, None), Err(Error::Forbidden)));
    }

    #[test]
    fn id_parsing() {
        assert!(parse_id("id", "nope").is_err());
        assert_eq!(parse_optional_id("location_id", Some("  ")).unwrap(), None);
        assert_eq!(parse_optional_id("location_id", None).unwrap(), None);
        let id = Uuid::new_v4();
        assert_eq!(
            parse_optional_id("location_id", Some(&id.to_string())).unwrap(),
            Some(id)
        );
    }
}
