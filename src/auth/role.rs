//! Account roles.

use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use utoipa::ToSchema;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Donor,
    Admin,
    #[serde(rename = "superadmin")]
    SuperAdmin,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Donor => "donor",
            Self::Admin => "admin",
            Self::SuperAdmin => "superadmin",
        }
    }

    /// Tenant-scoped roles only see rows owned by their tenant and carry the
    /// tenant id in issued tokens.
    #[must_use]
    pub const fn is_tenant_scoped(self) -> bool {
        match self {
            Self::Donor | Self::Admin => true,
            Self::SuperAdmin => false,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownRole(pub String);

impl fmt::Display for UnknownRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown role: {}", self.0)
    }
}

impl std::error::Error for UnknownRole {}

impl FromStr for Role {
    type Err = UnknownRole;

    // `user` is the legacy name for donors.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "donor" | "user" => Ok(Self::Donor),
            "admin" => Ok(Self::Admin),
            "superadmin" => Ok(Self::SuperAdmin),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}
