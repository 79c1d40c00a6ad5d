//! Tenant creation and renaming with slug collision handling.

use super::resource::ResourceService;
use crate::{
    auth::slug::{candidates, slugify},
    error::{Error, SLUG_TAKEN},
    models::Tenant,
    store::TenantScope,
};
use chrono::Utc;
use uuid::Uuid;

const SLUG_ATTEMPTS: usize = 5;

fn tenant_name(name: &str) -> Result<&str, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Validation("name is required".to_string()));
    }
    Ok(name)
}

fn is_slug_conflict(err: &Error) -> bool {
    matches!(err, Error::Conflict(reason) if reason == SLUG_TAKEN)
}

impl ResourceService<Tenant> {
    /// # Errors
    /// `Validation` for an empty name, `Conflict` when every slug candidate is taken.
    pub async fn create_named(&self, name: &str) -> Result<Tenant, Error> {
        let name = tenant_name(name)?;

        for slug in candidates(&slugify(name), SLUG_ATTEMPTS) {
            match self.create(Tenant::new(name.to_string(), slug)).await {
                Err(err) if is_slug_conflict(&err) => continue,
                result => return result,
            }
        }

        Err(Error::Conflict("tenant slug is unavailable".to_string()))
    }

    /// Renames the tenant and derives a fresh slug from the new name.
    ///
    /// # Errors
    /// `NotFound` for an unknown id, otherwise as [`Self::create_named`].
    pub async fn rename(&self, id: Uuid, name: &str) -> Result<Tenant, Error> {
        let name = tenant_name(name)?;

        for slug in candidates(&slugify(name), SLUG_ATTEMPTS) {
            let result = self
                .update(id, TenantScope::All, |tenant| {
                    tenant.name = name.to_string();
                    tenant.slug = slug;
                    tenant.updated_at = Utc::now();
                    Ok(())
                })
                .await;

            match result {
                Err(err) if is_slug_conflict(&err) => continue,
                result => return result,
            }
        }

        Err(Error::Conflict("tenant slug is unavailable".to_string()))
    }
}
