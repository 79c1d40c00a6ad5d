use crate::store::Record;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// An independent organisational scope. The slug is derived from the name.
#[derive(Clone, Debug, PartialEq)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    #[must_use]
    pub fn new(name: String, slug: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            name,
            slug,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Record for Tenant {
    const KIND: &'static str = "tenant";
    const TENANT_SCOPED: bool = false;

    fn id(&self) -> Uuid {
        self.id
    }
}
