//! Generic tenant-scoped CRUD.

use crate::{
    error::Error,
    store::{Page, PageRequest, Record, Repository, TenantScope},
};
use std::sync::Arc;
use tracing::{debug, instrument};
use uuid::Uuid;

/// CRUD over one record type. `update` and `delete` fetch first, so a missing
/// or out-of-scope id is always `Error::NotFound`.
pub struct ResourceService<T: Record> {
    repo: Arc<dyn Repository<T>>,
}

impl<T: Record> Clone for ResourceService<T> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<T: Record> ResourceService<T> {
    #[must_use]
    pub fn new(repo: Arc<dyn Repository<T>>) -> Self {
        Self { repo }
    }

    /// # Errors
    /// `Conflict` on a unique rule, `Internal` on storage failure.
    #[instrument(skip_all, fields(kind = T::KIND))]
    pub async fn create(&self, record: T) -> Result<T, Error> {
        self.repo.save(&record).await?;
        debug!(id = %record.id(), "Created {}", T::KIND);
        Ok(record)
    }

    /// # Errors
    /// `Internal` on storage failure.
    pub async fn find_all(&self, page: PageRequest, scope: TenantScope) -> Result<Page<T>, Error> {
        Ok(self.repo.find_all(page.normalized(), scope).await?)
    }

    /// # Errors
    /// `NotFound` when the id does not exist or belongs to another tenant.
    pub async fn find_by_id(&self, id: Uuid, scope: TenantScope) -> Result<T, Error> {
        let record = self.repo.find_by_id(id).await?;

        if T::TENANT_SCOPED && !scope.permits(record.tenant_id()) {
            debug!(%id, "{} outside caller scope", T::KIND);
            return Err(Error::NotFound);
        }

        Ok(record)
    }

    /// Fetch, apply `change`, persist.
    ///
    /// # Errors
    /// `NotFound` as in [`Self::find_by_id`], whatever `change` returns, or a
    /// store failure.
    #[instrument(skip_all, fields(kind = T::KIND, id = %id))]
    pub async fn update<F>(&self, id: Uuid, scope: TenantScope, change: F) -> Result<T, Error>
    where
        F: FnOnce(&mut T) -> Result<(), Error> + Send,
    {
        let mut record = self.find_by_id(id, scope).await?;
        change(&mut record)?;
        self.repo.update(&record).await?;
        Ok(record)
    }

    /// # Errors
    /// `NotFound` as in [`Self::find_by_id`].
    #[instrument(skip_all, fields(kind = T::KIND, id = %id))]
    pub async fn delete(&self, id: Uuid, scope: TenantScope) -> Result<(), Error> {
        self.find_by_id(id, scope).await?;
        self.repo.delete(id).await?;
        Ok(())
    }
}
