//! Profile, donor details and tenant user management.

use crate::{
    error::Error,
    models::{Account, BloodType, Gender, Rhesus, UserDetail},
    store::{AccountStore, Page, PageRequest, StoreError, TenantScope},
};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

const PHONE_MIN: usize = 10;
const PHONE_MAX: usize = 15;

/// Donor detail fields as accepted from clients.
#[derive(Clone, Debug, PartialEq)]
pub struct DetailInput {
    pub full_name: String,
    pub gender: Gender,
    pub date_of_birth: NaiveDate,
    pub blood_type: Option<BloodType>,
    pub rhesus: Option<Rhesus>,
    pub phone_number: String,
    pub address: String,
    pub is_active_donor: bool,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub weight: f64,
}

impl DetailInput {
    /// # Errors
    /// `Validation` naming the first offending field.
    pub fn validate(&self) -> Result<(), Error> {
        if self.full_name.trim().is_empty() {
            return Err(Error::Validation("full_name is required".to_string()));
        }

        let phone_len = self.phone_number.trim().chars().count();
        if !(PHONE_MIN..=PHONE_MAX).contains(&phone_len) {
            return Err(Error::Validation(format!(
                "phone_number must be {PHONE_MIN} to {PHONE_MAX} characters"
            )));
        }

        if self.address.trim().is_empty() {
            return Err(Error::Validation("address is required".to_string()));
        }

        if self.weight.is_nan() || self.weight < 0.0 {
            return Err(Error::Validation("weight must not be negative".to_string()));
        }

        if self.date_of_birth > Utc::now().date_naive() {
            return Err(Error::Validation(
                "date_of_birth must not be in the future".to_string(),
            ));
        }

        Ok(())
    }

    fn apply(self, detail: &mut UserDetail) {
        detail.full_name = self.full_name.trim().to_string();
        detail.gender = self.gender;
        detail.date_of_birth = self.date_of_birth;
        detail.blood_type = self.blood_type;
        detail.rhesus = self.rhesus;
        detail.phone_number = self.phone_number.trim().to_string();
        detail.address = self.address.trim().to_string();
        detail.is_active_donor = self.is_active_donor;
        detail.latitude = self.latitude;
        detail.longitude = self.longitude;
        detail.weight = self.weight;
        detail.updated_at = Utc::now();
    }

    fn into_detail(self, user_id: Uuid) -> UserDetail {
        let now = Utc::now();
        let mut detail = UserDetail {
            id: Uuid::now_v7(),
            user_id,
            full_name: String::new(),
            gender: self.gender,
            date_of_birth: self.date_of_birth,
            blood_type: None,
            rhesus: None,
            phone_number: String::new(),
            address: String::new(),
            is_active_donor: self.is_active_donor,
            latitude: None,
            longitude: None,
            weight: 0.0,
            created_at: now,
            updated_at: now,
        };
        self.apply(&mut detail);
        detail
    }
}

#[derive(Clone, Debug)]
pub struct Profile {
    pub account: Account,
    pub detail: Option<UserDetail>,
}

#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
}

impl AccountService {
    #[must_use]
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self { store }
    }

    /// # Errors
    /// `Internal` when the store is unreachable.
    pub async fn ping(&self) -> Result<(), Error> {
        Ok(self.store.ping().await?)
    }

    /// # Errors
    /// `NotFound` when the account no longer exists.
    pub async fn profile(&self, account_id: Uuid) -> Result<Profile, Error> {
        let account = self.store.find_by_id(account_id).await?;
        let detail = match self.store.find_detail_by_user_id(account_id).await {
            Ok(detail) => Some(detail),
            Err(StoreError::NotFound) => None,
            Err(err) => return Err(err.into()),
        };
        Ok(Profile { account, detail })
    }

    /// Changes the display name only.
    ///
    /// # Errors
    /// `Validation` for an empty name, `NotFound` for an unknown account.
    #[instrument(skip_all, fields(account_id = %account_id))]
    pub async fn rename(&self, account_id: Uuid, name: &str) -> Result<Account, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("name is required".to_string()));
        }

        let mut account = self.store.find_by_id(account_id).await?;
        account.name = name.to_string();
        account.updated_at = Utc::now();
        self.store.update_account(&account).await?;

        Ok(account)
    }

    /// # Errors
    /// `Conflict` when the account already has details.
    #[instrument(skip_all, fields(account_id = %account_id))]
    pub async fn create_detail(
        &self,
        account_id: Uuid,
        input: DetailInput,
    ) -> Result<UserDetail, Error> {
        input.validate()?;
        self.store.find_by_id(account_id).await?;

        let detail = input.into_detail(account_id);
        self.store.save_detail(&detail).await?;

        Ok(detail)
    }

    /// # Errors
    /// `NotFound` when the account has no details yet.
    pub async fn detail(&self, account_id: Uuid) -> Result<UserDetail, Error> {
        Ok(self.store.find_detail_by_user_id(account_id).await?)
    }

    /// # Errors
    /// `NotFound` when the account has no details yet.
    #[instrument(skip_all, fields(account_id = %account_id))]
    pub async fn update_detail(
        &self,
        account_id: Uuid,
        input: DetailInput,
    ) -> Result<UserDetail, Error> {
        input.validate()?;

        let mut detail = self.store.find_detail_by_user_id(account_id).await?;
        input.apply(&mut detail);
        self.store.update_detail(&detail).await?;

        Ok(detail)
    }

    /// # Errors
    /// `Internal` on storage failure.
    pub async fn list(&self, page: PageRequest, scope: TenantScope) -> Result<Page<Account>, Error> {
        Ok(self.store.find_all(page.normalized(), scope).await?)
    }

    /// Creates an unclaimed donor (no email, no password) with its details in
    /// `tenant_id`.
    ///
    /// # Errors
    /// `Validation` for bad input.
    #[instrument(skip_all)]
    pub async fn create_unclaimed(
        &self,
        name: &str,
        tenant_id: Option<Uuid>,
        location_id: Option<Uuid>,
        input: DetailInput,
    ) -> Result<Profile, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("name is required".to_string()));
        }
        input.validate()?;

        let account = Account::unclaimed(name.to_string(), tenant_id, location_id);
        let detail = input.into_detail(account.id);
        self.store.save_with_detail(&account, &detail).await?;

        info!(account_id = %account.id, "Unclaimed donor created");

        Ok(Profile {
            account,
            detail: Some(detail),
        })
    }
}
