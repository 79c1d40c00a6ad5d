use super::{BloodType, Rhesus};
use crate::store::Record;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Bag count for one blood variant at one location; the
/// `(blood_type, rhesus, location_id)` triple is unique.
#[derive(Clone, Debug, PartialEq)]
pub struct Stock {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub location_id: Uuid,
    pub blood_type: BloodType,
    pub rhesus: Rhesus,
    pub bag_quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Stock {
    #[must_use]
    pub fn same_variant(&self, other: &Self) -> bool {
        self.location_id == other.location_id
            && self.blood_type == other.blood_type
            && self.rhesus == other.rhesus
    }
}

impl Record for Stock {
    const KIND: &'static str = "stock";
    const TENANT_SCOPED: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Option<Uuid> {
        Some(self.tenant_id)
    }
}
