//! Domain records.

mod account;
mod blood;
mod blood_request;
mod donation;
mod event;
mod location;
mod stock;
mod tenant;

pub use account::{Account, AccountStatus, Gender, UserDetail};
pub use blood::{BloodType, Rhesus};
pub use blood_request::{BloodRequest, RequestStatus};
pub use donation::{Donation, DonationStatus};
pub use event::Event;
pub use location::Location;
pub use stock::Stock;
pub use tenant::Tenant;

use std::{fmt, str::FromStr};

/// Error for a string that is not one of an enum's wire names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidValue {
    pub field: &'static str,
    pub value: String,
}

impl fmt::Display for InvalidValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.field, self.value)
    }
}

impl std::error::Error for InvalidValue {}

/// Parses an optional wire value, mapping failures to a validation error.
pub(crate) fn parse_field<T>(value: &str) -> Result<T, crate::Error>
where
    T: FromStr<Err = InvalidValue>,
{
    value
        .parse::<T>()
        .map_err(|err| crate::Error::Validation(err.to_string()))
}
