//! In-process store.
//!
//! Holds every table in a `tokio::sync::RwLock<Vec<_>>` and enforces the same
//! uniqueness rules as the Postgres schema. Used by the test suite and for
//! running the router without a database.

use super::{
    AccountStore, LocationStore, Page, PageRequest, Record, Repository, StoreError, TenantScope,
    DETAIL_EXISTS, STOCK_EXISTS,
};
use crate::models::{
    Account, BloodRequest, Donation, Event, Location, Stock, Tenant, UserDetail,
};
use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct MemoryStore {
    accounts: RwLock<Vec<Account>>,
    details: RwLock<Vec<UserDetail>>,
    tenants: RwLock<Vec<Tenant>>,
    locations: RwLock<Vec<Location>>,
    events: RwLock<Vec<Event>>,
    donations: RwLock<Vec<Donation>>,
    stocks: RwLock<Vec<Stock>>,
    blood_requests: RwLock<Vec<BloodRequest>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn tenant_count(&self) -> usize {
        self.tenants.read().await.len()
    }

    pub async fn account_count(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn tenant(&self, id: Uuid) -> Option<Tenant> {
        self.tenants
            .read()
            .await
            .iter()
            .find(|tenant| tenant.id == id)
            .cloned()
    }
}

/// Selects the table backing a record type and its uniqueness rule.
pub trait InMemory: Record {
    fn table(store: &MemoryStore) -> &RwLock<Vec<Self>>;

    /// Conflict raised when `self` would violate a unique rule against `other`.
    fn conflicts_with(&self, _other: &Self) -> Option<StoreError> {
        None
    }
}

impl InMemory for Tenant {
    fn table(store: &MemoryStore) -> &RwLock<Vec<Self>> {
        &store.tenants
    }

    fn conflicts_with(&self, other: &Self) -> Option<StoreError> {
        (self.slug == other.slug).then_some(StoreError::DuplicateSlug)
    }
}

impl InMemory for Location {
    fn table(store: &MemoryStore) -> &RwLock<Vec<Self>> {
        &store.locations
    }
}

impl InMemory for Event {
    fn table(store: &MemoryStore) -> &RwLock<Vec<Self>> {
        &store.events
    }
}

impl InMemory for Donation {
    fn table(store: &MemoryStore) -> &RwLock<Vec<Self>> {
        &store.donations
    }
}

impl InMemory for Stock {
    fn table(store: &MemoryStore) -> &RwLock<Vec<Self>> {
        &store.stocks
    }

    fn conflicts_with(&self, other: &Self) -> Option<StoreError> {
        self.same_variant(other)
            .then(|| StoreError::Conflict(STOCK_EXISTS.to_string()))
    }
}

impl InMemory for BloodRequest {
    fn table(store: &MemoryStore) -> &RwLock<Vec<Self>> {
        &store.blood_requests
    }
}

fn check_unique<T: InMemory>(rows: &[T], record: &T) -> Result<(), StoreError> {
    rows.iter()
        .filter(|row| row.id() != record.id())
        .find_map(|row| record.conflicts_with(row))
        .map_or(Ok(()), Err)
}

fn paginate<T: Clone>(rows: Vec<T>, page: PageRequest) -> Page<T> {
    let page = page.normalized();
    let total = rows.len() as u64;
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    let items = rows
        .into_iter()
        .skip(offset)
        .take(page.limit as usize)
        .collect();
    Page {
        items,
        total,
        page: page.page,
        limit: page.limit,
    }
}

#[async_trait]
impl<T: InMemory> Repository<T> for MemoryStore {
    async fn save(&self, record: &T) -> Result<(), StoreError> {
        let mut rows = T::table(self).write().await;
        if rows.iter().any(|row| row.id() == record.id()) {
            return Err(StoreError::Conflict(super::RECORD_EXISTS.to_string()));
        }
        check_unique(rows.as_slice(), record)?;
        rows.push(record.clone());
        Ok(())
    }

    async fn find_all(&self, page: PageRequest, scope: TenantScope) -> Result<Page<T>, StoreError> {
        let rows = T::table(self).read().await;
        // newest first
        let visible: Vec<T> = rows
            .iter()
            .rev()
            .filter(|row| !T::TENANT_SCOPED || scope.permits(row.tenant_id()))
            .cloned()
            .collect();
        Ok(paginate(visible, page))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<T, StoreError> {
        T::table(self)
            .read()
            .await
            .iter()
            .find(|row| row.id() == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, record: &T) -> Result<(), StoreError> {
        let mut rows = T::table(self).write().await;
        check_unique(rows.as_slice(), record)?;
        let slot = rows
            .iter_mut()
            .find(|row| row.id() == record.id())
            .ok_or(StoreError::NotFound)?;
        *slot = record.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut rows = T::table(self).write().await;
        let before = rows.len();
        rows.retain(|row| row.id() != id);
        if rows.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

fn email_taken(accounts: &[Account], account: &Account) -> bool {
    account.email.as_ref().is_some_and(|email| {
        accounts
            .iter()
            .any(|row| row.id != account.id && row.email.as_ref() == Some(email))
    })
}

#[async_trait]
impl AccountStore for MemoryStore {
    async fn save(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        if email_taken(accounts.as_slice(), account) {
            return Err(StoreError::DuplicateEmail);
        }
        accounts.push(account.clone());
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Account, StoreError> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|row| row.deleted_at.is_none() && row.email.as_deref() == Some(email))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Account, StoreError> {
        self.accounts
            .read()
            .await
            .iter()
            .find(|row| row.deleted_at.is_none() && row.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        if email_taken(accounts.as_slice(), account) {
            return Err(StoreError::DuplicateEmail);
        }
        let slot = accounts
            .iter_mut()
            .find(|row| row.id == account.id)
            .ok_or(StoreError::NotFound)?;
        *slot = account.clone();
        Ok(())
    }

    async fn find_all(
        &self,
        page: PageRequest,
        scope: TenantScope,
    ) -> Result<Page<Account>, StoreError> {
        let accounts = self.accounts.read().await;
        let visible: Vec<Account> = accounts
            .iter()
            .rev()
            .filter(|row| row.deleted_at.is_none() && scope.permits(row.tenant_id))
            .cloned()
            .collect();
        Ok(paginate(visible, page))
    }

    async fn provision(&self, tenant: &Tenant, account: &Account) -> Result<(), StoreError> {
        // Both locks are held so the pair is written atomically.
        let locations = self.locations.read().await;
        let mut tenants = self.tenants.write().await;
        let mut accounts = self.accounts.write().await;

        if let Some(location_id) = account.location_id {
            if !locations.iter().any(|location| location.id == location_id) {
                return Err(StoreError::MissingReference);
            }
        }

        check_unique(tenants.as_slice(), tenant)?;
        if email_taken(accounts.as_slice(), account) {
            return Err(StoreError::DuplicateEmail);
        }

        tenants.push(tenant.clone());
        accounts.push(account.clone());
        Ok(())
    }

    async fn save_detail(&self, detail: &UserDetail) -> Result<(), StoreError> {
        let mut details = self.details.write().await;
        if details.iter().any(|row| row.user_id == detail.user_id) {
            return Err(StoreError::Conflict(DETAIL_EXISTS.to_string()));
        }
        details.push(detail.clone());
        Ok(())
    }

    async fn find_detail_by_user_id(&self, user_id: Uuid) -> Result<UserDetail, StoreError> {
        self.details
            .read()
            .await
            .iter()
            .find(|row| row.user_id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_detail(&self, detail: &UserDetail) -> Result<(), StoreError> {
        let mut details = self.details.write().await;
        let slot = details
            .iter_mut()
            .find(|row| row.id == detail.id)
            .ok_or(StoreError::NotFound)?;
        *slot = detail.clone();
        Ok(())
    }

    async fn save_with_detail(
        &self,
        account: &Account,
        detail: &UserDetail,
    ) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().await;
        let mut details = self.details.write().await;

        if email_taken(accounts.as_slice(), account) {
            return Err(StoreError::DuplicateEmail);
        }
        if details.iter().any(|row| row.user_id == detail.user_id) {
            return Err(StoreError::Conflict(DETAIL_EXISTS.to_string()));
        }

        accounts.push(account.clone());
        details.push(detail.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[async_trait]
impl LocationStore for MemoryStore {
    async fn find_with_coordinates(
        &self,
        scope: TenantScope,
    ) -> Result<Vec<Location>, StoreError> {
        Ok(self
            .locations
            .read()
            .await
            .iter()
            .filter(|row| row.latitude.is_some() && row.longitude.is_some())
            .filter(|row| scope.permits(Some(row.tenant_id)))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;

    fn account(email: &str, tenant: Uuid) -> Account {
        Account::claimed(
            "Jane".to_string(),
            email.to_string(),
            None,
            Role::Donor,
            tenant,
            None,
        )
    }

    #[tokio::test]
    async fn provision_is_all_or_nothing() {
        let store = MemoryStore::new();
        let first = Tenant::new("Jane".to_string(), "jane".to_string());
        store
            .provision(&first, &account("jane@example.com", first.id))
            .await
            .unwrap();

        // duplicate email: the new tenant must not be written
        let second = Tenant::new("Jane".to_string(), "jane-2".to_string());
        let err = store
            .provision(&second, &account("jane@example.com", second.id))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));

        // duplicate slug: the account must not be written
        let third = Tenant::new("Jane".to_string(), "jane".to_string());
        let err = store
            .provision(&third, &account("other@example.com", third.id))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateSlug));

        assert_eq!(store.tenant_count().await, 1);
        assert_eq!(store.account_count().await, 1);
    }

    #[tokio::test]
    async fn provision_rejects_unknown_location() {
        let store = MemoryStore::new();
        let tenant = Tenant::new("Jane".to_string(), "jane".to_string());
        let mut jane = account("jane@example.com", tenant.id);
        jane.location_id = Some(Uuid::new_v4());

        let err = store.provision(&tenant, &jane).await.unwrap_err();
        assert!(matches!(err, StoreError::MissingReference));
        assert_eq!(store.tenant_count().await, 0);
        assert_eq!(store.account_count().await, 0);
    }

    #[tokio::test]
    async fn repository_scopes_and_paginates() {
        let store = MemoryStore::new();
        let tenant_a = Uuid::new_v4();
        let tenant_b = Uuid::new_v4();
        for (index, tenant) in [tenant_a, tenant_a, tenant_a, tenant_b].iter().enumerate() {
            let location = Location {
                id: Uuid::new_v4(),
                tenant_id: *tenant,
                name: format!("Site {index}"),
                slug: format!("site-{index}"),
                address: "Jl. Merdeka".to_string(),
                city: "Jakarta".to_string(),
                latitude: None,
                longitude: None,
                created_at: chrono::Utc::now(),
                updated_at: chrono::Utc::now(),
            };
            Repository::<Location>::save(&store, &location).await.unwrap();
        }

        let page = Repository::<Location>::find_all(
            &store,
            PageRequest::new(1, 2),
            TenantScope::Tenant(tenant_a),
        )
        .await
        .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].name, "Site 2");

        let page = Repository::<Location>::find_all(
            &store,
            PageRequest::new(2, 2),
            TenantScope::Tenant(tenant_a),
        )
        .await
        .unwrap();
        assert_eq!(page.items.len(), 1);

        let page = Repository::<Location>::find_all(&store, PageRequest::default(), TenantScope::All)
            .await
            .unwrap();
        assert_eq!(page.total, 4);

        let page =
            Repository::<Location>::find_all(&store, PageRequest::default(), TenantScope::Unbound)
                .await
                .unwrap();
        assert_eq!(page.total, 0);
    }

    #[tokio::test]
    async fn update_and_delete_missing_rows() {
        let store = MemoryStore::new();
        let tenant = Tenant::new("Ghost".to_string(), "ghost".to_string());
        assert!(matches!(
            Repository::<Tenant>::update(&store, &tenant).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            Repository::<Tenant>::delete(&store, tenant.id).await,
            Err(StoreError::NotFound)
        ));
    }
}
