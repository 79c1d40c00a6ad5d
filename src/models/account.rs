use super::{BloodType, InvalidValue, Rhesus};
use crate::auth::Role;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// `unclaimed` accounts were created by an administrator and have no login
/// credential yet. The transition to `claimed` is one-way.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Unclaimed,
    Claimed,
}

impl AccountStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unclaimed => "unclaimed",
            Self::Claimed => "claimed",
        }
    }
}

impl FromStr for AccountStatus {
    type Err = InvalidValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "unclaimed" => Ok(Self::Unclaimed),
            "claimed" => Ok(Self::Claimed),
            other => Err(InvalidValue {
                field: "account_status",
                value: other.to_string(),
            }),
        }
    }
}

/// A person or service identity. The password hash never leaves the service
/// layer; responses are built from explicit DTOs.
#[derive(Clone, Debug, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub name: String,
    pub role: Role,
    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Account {
    /// A new account that can log in, either with a password or through a
    /// federated identity (`password_hash` is `None`).
    #[must_use]
    pub fn claimed(
        name: String,
        email: String,
        password_hash: Option<String>,
        role: Role,
        tenant_id: Uuid,
        location_id: Option<Uuid>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            tenant_id: Some(tenant_id),
            location_id,
            email: Some(email),
            password_hash,
            name,
            role,
            status: AccountStatus::Claimed,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// A donor record created on someone's behalf, with no credential.
    #[must_use]
    pub fn unclaimed(name: String, tenant_id: Option<Uuid>, location_id: Option<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            tenant_id,
            location_id,
            email: None,
            password_hash: None,
            name,
            role: Role::Donor,
            status: AccountStatus::Unclaimed,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum Gender {
    #[serde(rename = "L")]
    Male,
    #[serde(rename = "P")]
    Female,
}

impl Gender {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "L",
            Self::Female => "P",
        }
    }
}

impl FromStr for Gender {
    type Err = InvalidValue;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "L" => Ok(Self::Male),
            "P" => Ok(Self::Female),
            other => Err(InvalidValue {
                field: "gender",
                value: other.to_string(),
            }),
        }
    }
}

/// Donor profile attached one-to-one to an account.
#[derive(Clone, Debug, PartialEq)]
pub struct UserDetail {
    pub id: Uuid,
    pub user_id: Uuid,
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
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unclaimed_accounts_have_no_credential() {
        let account = Account::unclaimed("Budi".to_string(), Some(Uuid::new_v4()), None);
        assert_eq!(account.status, AccountStatus::Unclaimed);
        assert_eq!(account.role, Role::Donor);
        assert!(account.email.is_none());
        assert!(account.password_hash.is_none());
    }

    #[test]
    fn status_and_gender_wire_names() {
        assert_eq!("claimed".parse::<AccountStatus>(), Ok(AccountStatus::Claimed));
        assert!("Claimed".parse::<AccountStatus>().is_err());
        assert_eq!("P".parse::<Gender>(), Ok(Gender::Female));
        assert_eq!(Gender::Male.as_str(), "L");
    }
}
