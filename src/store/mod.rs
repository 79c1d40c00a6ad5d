//! Storage contracts.
//!
//! Services depend on the object-safe traits in this module and never on a
//! concrete engine. [`postgres::PgStore`] is the production implementation;
//! [`memory::MemoryStore`] keeps everything in process and backs the tests.
//!
//! Uniqueness (account email, tenant slug, one stock row per blood variant and
//! location) is enforced by the store itself, which is the only place a
//! concurrent duplicate can be caught reliably.

pub mod memory;
pub mod postgres;

use crate::models::{Account, Location, UserDetail, Tenant};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use utoipa::IntoParams;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub(crate) const STOCK_EXISTS: &str = "stock for this blood variant already exists at the location";
pub(crate) const DETAIL_EXISTS: &str = "donor details already exist";
pub(crate) const RECORD_EXISTS: &str = "record already exists";

const DEFAULT_PAGE: u32 = 1;
const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 100;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("email already in use")]
    DuplicateEmail,

    #[error("tenant slug already in use")]
    DuplicateSlug,

    #[error("{0}")]
    Conflict(String),

    #[error("referenced record does not exist")]
    MissingReference,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// A persisted entity handled by the generic [`Repository`].
pub trait Record: Clone + Send + Sync + 'static {
    /// Name used in logs and spans.
    const KIND: &'static str;
    /// Whether rows are owned by a tenant and filtered by [`TenantScope`].
    const TENANT_SCOPED: bool;

    fn id(&self) -> Uuid;

    fn tenant_id(&self) -> Option<Uuid> {
        None
    }
}

/// Which tenants' rows a caller may see.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TenantScope {
    /// Cross-tenant access.
    All,
    Tenant(Uuid),
    /// Tenant-scoped role without a tenant; sees no tenant-owned rows.
    Unbound,
}

impl TenantScope {
    #[must_use]
    pub fn permits(self, tenant_id: Option<Uuid>) -> bool {
        match self {
            Self::All => true,
            Self::Tenant(scope) => tenant_id == Some(scope),
            Self::Unbound => false,
        }
    }
}

/// Pagination query: `page` starts at 1, `limit` is clamped to `1..=100`.
#[derive(Clone, Copy, Debug, Deserialize, IntoParams, PartialEq, Eq)]
#[into_params(parameter_in = Query)]
pub struct PageRequest {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_page() -> u32 {
    DEFAULT_PAGE
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    #[must_use]
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }.normalized()
    }

    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            page: self.page.max(1),
            limit: self.limit.clamp(1, MAX_LIMIT),
        }
    }

    #[must_use]
    pub fn offset(self) -> u64 {
        let page = self.normalized();
        u64::from(page.page - 1) * u64::from(page.limit)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> Page<T> {
    #[must_use]
    pub fn empty(request: PageRequest) -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: request.page,
            limit: request.limit,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Uniform persistence for a resource record.
#[async_trait]
pub trait Repository<T: Record>: Send + Sync {
    async fn save(&self, record: &T) -> Result<(), StoreError>;

    /// Newest first.
    async fn find_all(&self, page: PageRequest, scope: TenantScope)
        -> Result<Page<T>, StoreError>;

    /// # Errors
    /// `StoreError::NotFound` when no row has this id.
    async fn find_by_id(&self, id: Uuid) -> Result<T, StoreError>;

    async fn update(&self, record: &T) -> Result<(), StoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Accounts, their donor details and atomic tenant provisioning.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn save(&self, account: &Account) -> Result<(), StoreError>;

    /// Lookup by normalized email. Soft-deleted accounts are not returned.
    async fn find_by_email(&self, email: &str) -> Result<Account, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Account, StoreError>;

    async fn update_account(&self, account: &Account) -> Result<(), StoreError>;

    async fn find_all(
        &self,
        page: PageRequest,
        scope: TenantScope,
    ) -> Result<Page<Account>, StoreError>;

    /// Inserts the tenant and the account in one transaction. Either both rows
    /// exist afterwards or neither does.
    ///
    /// # Errors
    /// `DuplicateSlug` or `DuplicateEmail` when a unique constraint rejects the write.
    async fn provision(&self, tenant: &Tenant, account: &Account) -> Result<(), StoreError>;

    async fn save_detail(&self, detail: &UserDetail) -> Result<(), StoreError>;

    async fn find_detail_by_user_id(&self, user_id: Uuid) -> Result<UserDetail, StoreError>;

    async fn update_detail(&self, detail: &UserDetail) -> Result<(), StoreError>;

    /// Account plus detail in one transaction.
    async fn save_with_detail(
        &self,
        account: &Account,
        detail: &UserDetail,
    ) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Location lookups beyond plain CRUD.
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Every location in scope that has both coordinates.
    async fn find_with_coordinates(&self, scope: TenantScope)
        -> Result<Vec<Location>, StoreError>;
}
