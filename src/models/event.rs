use crate::store::Record;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

/// A donation drive at a location. `tenant_id` is inherited from the location.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub location_id: Uuid,
    pub name: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Event {
    const KIND: &'static str = "event";
    const TENANT_SCOPED: bool = true;

    fn id(&self) -> Uuid {
        self.id
    }

    fn tenant_id(&self) -> Option<Uuid> {
        Some(self.tenant_id)
    }
}
