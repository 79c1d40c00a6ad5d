//! Postgres implementation of the storage contracts.
//!
//! Resource tables share one generic [`Repository`] implementation driven by
//! [`PgRecord`], which names the table, lists the columns (id first) and binds
//! them in that order. Unique-constraint names are mapped to typed
//! [`StoreError`] kinds so callers never see raw database errors.

use super::{
    AccountStore, LocationStore, Page, PageRequest, Record, Repository, StoreError, TenantScope,
    DETAIL_EXISTS, RECORD_EXISTS, STOCK_EXISTS,
};
use crate::models::{
    Account, BloodRequest, Donation, Event, Location, Stock, Tenant, UserDetail,
};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    postgres::{PgArguments, PgPoolOptions, PgRow},
    query::Query,
    Connection, PgPool, Postgres, Row,
};
use std::{str::FromStr, time::Duration};
use tracing::{debug, info_span, Instrument};
use uuid::Uuid;

const SCHEMA: &str = include_str!("../../sql/schema.sql");
const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

const USER_COLUMNS: &str = "id, tenant_id, location_id, email, password, name, role, \
                            account_status, created_at, updated_at, deleted_at";
const DETAIL_COLUMNS: &str = "id, user_id, full_name, gender, date_of_birth, blood_type, rhesus, \
                              phone_number, address, is_active_donor, latitude, longitude, \
                              weight, created_at, updated_at";

pub type PgQuery<'q> = Query<'q, Postgres, PgArguments>;

#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect with the service's pool settings.
    ///
    /// # Errors
    /// Returns an error if the database is unreachable.
    pub async fn connect(dsn: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .min_connections(1)
            .max_connections(5)
            .max_lifetime(Duration::from_secs(60 * 2))
            .test_before_acquire(true)
            .connect(dsn)
            .await
            .context("Failed to connect to database")?;

        Ok(Self::new(pool))
    }

    /// Apply `sql/schema.sql`. Every statement is idempotent.
    ///
    /// # Errors
    /// Returns an error if a statement fails.
    pub async fn migrate(&self) -> Result<()> {
        for statement in split_sql_statements(SCHEMA) {
            sqlx::query(&statement)
                .execute(&self.pool)
                .await
                .with_context(|| format!("Failed to apply schema statement: {statement}"))?;
        }
        debug!("Schema applied");
        Ok(())
    }
}

fn split_sql_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();

    for line in sql.lines() {
        let trimmed = line.trim();
        if trimmed.starts_with("--") {
            continue;
        }
        current.push_str(line);
        current.push('\n');

        if trimmed.ends_with(';') {
            let statement = current.trim();
            if !statement.is_empty() {
                statements.push(statement.to_string());
            }
            current.clear();
        }
    }

    let leftover = current.trim();
    if !leftover.is_empty() {
        statements.push(leftover.to_string());
    }

    statements
}

/// Translate a driver error into a store error, by SQLSTATE and constraint name.
fn map_db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some(UNIQUE_VIOLATION) => {
                return match db_err.constraint() {
                    Some("users_email_key") => StoreError::DuplicateEmail,
                    Some("tenants_slug_key") => StoreError::DuplicateSlug,
                    Some("stocks_variant_key") => StoreError::Conflict(STOCK_EXISTS.to_string()),
                    Some("user_details_user_id_key") => {
                        StoreError::Conflict(DETAIL_EXISTS.to_string())
                    }
                    _ => StoreError::Conflict(RECORD_EXISTS.to_string()),
                };
            }
            Some(FOREIGN_KEY_VIOLATION) => {
                return StoreError::MissingReference;
            }
            _ => {}
        }
    }

    match err {
        sqlx::Error::RowNotFound => StoreError::NotFound,
        other => StoreError::Database(other),
    }
}

fn decode<T>(column: &str, value: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.parse::<T>().map_err(|err| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(err),
    })
}

fn decode_opt<T>(column: &str, value: Option<String>) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.map(|value| decode(column, &value)).transpose()
}

fn query_span(operation: &'static str, statement: &str) -> tracing::Span {
    info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = operation,
        db.statement = statement
    )
}

/// Table mapping for a resource record.
pub trait PgRecord: Record + Sized {
    const TABLE: &'static str;
    /// Column list with `id` first; [`PgRecord::bind`] binds in this order.
    const COLUMNS: &'static [&'static str];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error>;

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q>;
}

fn insert_sql<T: PgRecord>() -> String {
    let placeholders: Vec<String> = (1..=T::COLUMNS.len()).map(|n| format!("${n}")).collect();
    format!(
        "INSERT INTO {} ({}) VALUES ({})",
        T::TABLE,
        T::COLUMNS.join(", "),
        placeholders.join(", ")
    )
}

fn update_sql<T: PgRecord>() -> String {
    let assignments: Vec<String> = T::COLUMNS
        .iter()
        .enumerate()
        .skip(1)
        .map(|(index, column)| format!("{column} = ${}", index + 1))
        .collect();
    format!(
        "UPDATE {} SET {} WHERE id = $1",
        T::TABLE,
        assignments.join(", ")
    )
}

#[async_trait]
impl<T: PgRecord> Repository<T> for PgStore {
    async fn save(&self, record: &T) -> Result<(), StoreError> {
        let sql = insert_sql::<T>();
        record
            .bind(sqlx::query(&sql))
            .execute(&self.pool)
            .instrument(query_span("INSERT", &sql))
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    async fn find_all(&self, page: PageRequest, scope: TenantScope) -> Result<Page<T>, StoreError> {
        let page = page.normalized();
        let tenant = if T::TENANT_SCOPED {
            match scope {
                TenantScope::All => None,
                TenantScope::Tenant(id) => Some(id),
                TenantScope::Unbound => return Ok(Page::empty(page)),
            }
        } else {
            None
        };

        let filter = if tenant.is_some() {
            " WHERE tenant_id = $1"
        } else {
            ""
        };
        let next = if tenant.is_some() { 2 } else { 1 };

        let count_sql = format!("SELECT COUNT(*) FROM {}{filter}", T::TABLE);
        let list_sql = format!(
            "SELECT {} FROM {}{filter} ORDER BY created_at DESC, id DESC LIMIT ${} OFFSET ${}",
            T::COLUMNS.join(", "),
            T::TABLE,
            next,
            next + 1
        );

        let mut count = sqlx::query(&count_sql);
        let mut list = sqlx::query(&list_sql);
        if let Some(id) = tenant {
            count = count.bind(id);
            list = list.bind(id);
        }

        let total: i64 = count
            .fetch_one(&self.pool)
            .instrument(query_span("SELECT", &count_sql))
            .await
            .and_then(|row| row.try_get(0))
            .map_err(map_db_error)?;

        let rows = list
            .bind(i64::from(page.limit))
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", &list_sql))
            .await
            .map_err(map_db_error)?;

        let items = rows
            .iter()
            .map(T::from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_db_error)?;

        Ok(Page {
            items,
            total: u64::try_from(total).unwrap_or_default(),
            page: page.page,
            limit: page.limit,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<T, StoreError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            T::COLUMNS.join(", "),
            T::TABLE
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &sql))
            .await
            .map_err(map_db_error)?
            .ok_or(StoreError::NotFound)?;

        T::from_row(&row).map_err(map_db_error)
    }

    async fn update(&self, record: &T) -> Result<(), StoreError> {
        let sql = update_sql::<T>();
        let result = record
            .bind(sqlx::query(&sql))
            .execute(&self.pool)
            .instrument(query_span("UPDATE", &sql))
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", T::TABLE);
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .instrument(query_span("DELETE", &sql))
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

impl PgRecord for Tenant {
    const TABLE: &'static str = "tenants";
    const COLUMNS: &'static [&'static str] = &["id", "name", "slug", "created_at", "updated_at"];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            slug: row.try_get("slug")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.id)
            .bind(&self.name)
            .bind(&self.slug)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl PgRecord for Location {
    const TABLE: &'static str = "locations";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "tenant_id",
        "location_name",
        "slug",
        "address",
        "city",
        "latitude",
        "longitude",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            name: row.try_get("location_name")?,
            slug: row.try_get("slug")?,
            address: row.try_get("address")?,
            city: row.try_get("city")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.id)
            .bind(self.tenant_id)
            .bind(&self.name)
            .bind(&self.slug)
            .bind(&self.address)
            .bind(&self.city)
            .bind(self.latitude)
            .bind(self.longitude)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl PgRecord for Event {
    const TABLE: &'static str = "events";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "tenant_id",
        "location_id",
        "event_name",
        "description",
        "start_date",
        "end_date",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            location_id: row.try_get("location_id")?,
            name: row.try_get("event_name")?,
            description: row.try_get("description")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.id)
            .bind(self.tenant_id)
            .bind(self.location_id)
            .bind(&self.name)
            .bind(&self.description)
            .bind(self.start_date)
            .bind(self.end_date)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl PgRecord for Donation {
    const TABLE: &'static str = "donations";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "tenant_id",
        "location_id",
        "user_id",
        "event_id",
        "name",
        "donation_date",
        "status",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let status: String = row.try_get("status")?;
        Ok(Self {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            location_id: row.try_get("location_id")?,
            user_id: row.try_get("user_id")?,
            event_id: row.try_get("event_id")?,
            donor_name: row.try_get("name")?,
            donation_date: row.try_get("donation_date")?,
            status: decode("status", &status)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.id)
            .bind(self.tenant_id)
            .bind(self.location_id)
            .bind(self.user_id)
            .bind(self.event_id)
            .bind(&self.donor_name)
            .bind(self.donation_date)
            .bind(self.status.as_str())
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl PgRecord for Stock {
    const TABLE: &'static str = "stocks";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "tenant_id",
        "location_id",
        "blood_type",
        "rhesus",
        "bag_quantity",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let blood_type: String = row.try_get("blood_type")?;
        let rhesus: String = row.try_get("rhesus")?;
        Ok(Self {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            location_id: row.try_get("location_id")?,
            blood_type: decode("blood_type", &blood_type)?,
            rhesus: decode("rhesus", &rhesus)?,
            bag_quantity: row.try_get("bag_quantity")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.id)
            .bind(self.tenant_id)
            .bind(self.location_id)
            .bind(self.blood_type.as_str())
            .bind(self.rhesus.as_str())
            .bind(self.bag_quantity)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

impl PgRecord for BloodRequest {
    const TABLE: &'static str = "blood_requests";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "tenant_id",
        "location_id",
        "blood_type",
        "quantity",
        "status",
        "description",
        "created_by",
        "created_at",
        "updated_at",
    ];

    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let blood_type: String = row.try_get("blood_type")?;
        let status: String = row.try_get("status")?;
        Ok(Self {
            id: row.try_get("id")?,
            tenant_id: row.try_get("tenant_id")?,
            location_id: row.try_get("location_id")?,
            blood_type: decode("blood_type", &blood_type)?,
            quantity: row.try_get("quantity")?,
            status: decode("status", &status)?,
            description: row.try_get("description")?,
            created_by: row.try_get("created_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn bind<'q>(&'q self, query: PgQuery<'q>) -> PgQuery<'q> {
        query
            .bind(self.id)
            .bind(self.tenant_id)
            .bind(self.location_id)
            .bind(self.blood_type.as_str())
            .bind(self.quantity)
            .bind(self.status.as_str())
            .bind(&self.description)
            .bind(self.created_by)
            .bind(self.created_at)
            .bind(self.updated_at)
    }
}

fn account_from_row(row: &PgRow) -> Result<Account, sqlx::Error> {
    let role: String = row.try_get("role")?;
    let status: String = row.try_get("account_status")?;
    Ok(Account {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        location_id: row.try_get("location_id")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password")?,
        name: row.try_get("name")?,
        role: decode("role", &role)?,
        status: decode("account_status", &status)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        deleted_at: row.try_get("deleted_at")?,
    })
}

fn bind_account<'q>(account: &'q Account, query: PgQuery<'q>) -> PgQuery<'q> {
    query
        .bind(account.id)
        .bind(account.tenant_id)
        .bind(account.location_id)
        .bind(account.email.as_deref())
        .bind(account.password_hash.as_deref())
        .bind(&account.name)
        .bind(account.role.as_str())
        .bind(account.status.as_str())
        .bind(account.created_at)
        .bind(account.updated_at)
        .bind(account.deleted_at)
}

fn detail_from_row(row: &PgRow) -> Result<UserDetail, sqlx::Error> {
    let gender: String = row.try_get("gender")?;
    Ok(UserDetail {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        full_name: row.try_get("full_name")?,
        gender: decode("gender", &gender)?,
        date_of_birth: row.try_get("date_of_birth")?,
        blood_type: decode_opt("blood_type", row.try_get("blood_type")?)?,
        rhesus: decode_opt("rhesus", row.try_get("rhesus")?)?,
        phone_number: row.try_get("phone_number")?,
        address: row.try_get("address")?,
        is_active_donor: row.try_get("is_active_donor")?,
        latitude: row.try_get("latitude")?,
        longitude: row.try_get("longitude")?,
        weight: row.try_get("weight")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn bind_detail<'q>(detail: &'q UserDetail, query: PgQuery<'q>) -> PgQuery<'q> {
    query
        .bind(detail.id)
        .bind(detail.user_id)
        .bind(&detail.full_name)
        .bind(detail.gender.as_str())
        .bind(detail.date_of_birth)
        .bind(detail.blood_type.map(|value| value.as_str()))
        .bind(detail.rhesus.map(|value| value.as_str()))
        .bind(&detail.phone_number)
        .bind(&detail.address)
        .bind(detail.is_active_donor)
        .bind(detail.latitude)
        .bind(detail.longitude)
        .bind(detail.weight)
        .bind(detail.created_at)
        .bind(detail.updated_at)
}

const INSERT_USER: &str = "INSERT INTO users (id, tenant_id, location_id, email, password, name, \
                           role, account_status, created_at, updated_at, deleted_at) \
                           VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)";

const INSERT_DETAIL: &str = "INSERT INTO user_details (id, user_id, full_name, gender, \
                             date_of_birth, blood_type, rhesus, phone_number, address, \
                             is_active_donor, latitude, longitude, weight, created_at, \
                             updated_at) \
                             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, \
                             $14, $15)";

#[async_trait]
impl AccountStore for PgStore {
    async fn save(&self, account: &Account) -> Result<(), StoreError> {
        bind_account(account, sqlx::query(INSERT_USER))
            .execute(&self.pool)
            .instrument(query_span("INSERT", INSERT_USER))
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Account, StoreError> {
        let sql =
            format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL");
        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &sql))
            .await
            .map_err(map_db_error)?
            .ok_or(StoreError::NotFound)?;

        account_from_row(&row).map_err(map_db_error)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Account, StoreError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &sql))
            .await
            .map_err(map_db_error)?
            .ok_or(StoreError::NotFound)?;

        account_from_row(&row).map_err(map_db_error)
    }

    async fn update_account(&self, account: &Account) -> Result<(), StoreError> {
        let sql = "UPDATE users SET tenant_id = $2, location_id = $3, email = $4, password = $5, \
                   name = $6, role = $7, account_status = $8, created_at = $9, updated_at = $10, \
                   deleted_at = $11 WHERE id = $1";
        let result = bind_account(account, sqlx::query(sql))
            .execute(&self.pool)
            .instrument(query_span("UPDATE", sql))
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn find_all(
        &self,
        page: PageRequest,
        scope: TenantScope,
    ) -> Result<Page<Account>, StoreError> {
        let page = page.normalized();
        let tenant = match scope {
            TenantScope::All => None,
            TenantScope::Tenant(id) => Some(id),
            TenantScope::Unbound => return Ok(Page::empty(page)),
        };

        let filter = if tenant.is_some() {
            " AND tenant_id = $1"
        } else {
            ""
        };
        let next = if tenant.is_some() { 2 } else { 1 };
        let count_sql = format!("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL{filter}");
        let list_sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE deleted_at IS NULL{filter} \
             ORDER BY created_at DESC, id DESC LIMIT ${} OFFSET ${}",
            next,
            next + 1
        );

        let mut count = sqlx::query(&count_sql);
        let mut list = sqlx::query(&list_sql);
        if let Some(id) = tenant {
            count = count.bind(id);
            list = list.bind(id);
        }

        let total: i64 = count
            .fetch_one(&self.pool)
            .instrument(query_span("SELECT", &count_sql))
            .await
            .and_then(|row| row.try_get(0))
            .map_err(map_db_error)?;

        let rows = list
            .bind(i64::from(page.limit))
            .bind(i64::try_from(page.offset()).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", &list_sql))
            .await
            .map_err(map_db_error)?;

        let items = rows
            .iter()
            .map(account_from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_db_error)?;

        Ok(Page {
            items,
            total: u64::try_from(total).unwrap_or_default(),
            page: page.page,
            limit: page.limit,
        })
    }

    async fn provision(&self, tenant: &Tenant, account: &Account) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        let insert_tenant = insert_sql::<Tenant>();
        tenant
            .bind(sqlx::query(&insert_tenant))
            .execute(&mut *tx)
            .instrument(query_span("INSERT", &insert_tenant))
            .await
            .map_err(map_db_error)?;

        bind_account(account, sqlx::query(INSERT_USER))
            .execute(&mut *tx)
            .instrument(query_span("INSERT", INSERT_USER))
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)
    }

    async fn save_detail(&self, detail: &UserDetail) -> Result<(), StoreError> {
        bind_detail(detail, sqlx::query(INSERT_DETAIL))
            .execute(&self.pool)
            .instrument(query_span("INSERT", INSERT_DETAIL))
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    async fn find_detail_by_user_id(&self, user_id: Uuid) -> Result<UserDetail, StoreError> {
        let sql = format!("SELECT {DETAIL_COLUMNS} FROM user_details WHERE user_id = $1");
        let row = sqlx::query(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .instrument(query_span("SELECT", &sql))
            .await
            .map_err(map_db_error)?
            .ok_or(StoreError::NotFound)?;

        detail_from_row(&row).map_err(map_db_error)
    }

    async fn update_detail(&self, detail: &UserDetail) -> Result<(), StoreError> {
        let sql = "UPDATE user_details SET user_id = $2, full_name = $3, gender = $4, \
                   date_of_birth = $5, blood_type = $6, rhesus = $7, phone_number = $8, \
                   address = $9, is_active_donor = $10, latitude = $11, longitude = $12, \
                   weight = $13, created_at = $14, updated_at = $15 WHERE id = $1";
        let result = bind_detail(detail, sqlx::query(sql))
            .execute(&self.pool)
            .instrument(query_span("UPDATE", sql))
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn save_with_detail(
        &self,
        account: &Account,
        detail: &UserDetail,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;

        bind_account(account, sqlx::query(INSERT_USER))
            .execute(&mut *tx)
            .instrument(query_span("INSERT", INSERT_USER))
            .await
            .map_err(map_db_error)?;

        bind_detail(detail, sqlx::query(INSERT_DETAIL))
            .execute(&mut *tx)
            .instrument(query_span("INSERT", INSERT_DETAIL))
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let acquire_span = info_span!(
            "db.acquire",
            db.system = "postgresql",
            db.operation = "ACQUIRE"
        );
        let mut conn = self
            .pool
            .acquire()
            .instrument(acquire_span)
            .await
            .map_err(map_db_error)?;

        let ping_span = info_span!("db.ping", db.system = "postgresql", db.operation = "PING");
        conn.ping()
            .instrument(ping_span)
            .await
            .map_err(map_db_error)
    }
}

#[async_trait]
impl LocationStore for PgStore {
    async fn find_with_coordinates(
        &self,
        scope: TenantScope,
    ) -> Result<Vec<Location>, StoreError> {
        let tenant = match scope {
            TenantScope::All => None,
            TenantScope::Tenant(id) => Some(id),
            TenantScope::Unbound => return Ok(Vec::new()),
        };
        let filter = if tenant.is_some() {
            " AND tenant_id = $1"
        } else {
            ""
        };
        let sql = format!(
            "SELECT {} FROM locations WHERE latitude IS NOT NULL AND longitude IS NOT NULL{filter}",
            Location::COLUMNS.join(", ")
        );

        let mut query = sqlx::query(&sql);
        if let Some(id) = tenant {
            query = query.bind(id);
        }

        let rows = query
            .fetch_all(&self.pool)
            .instrument(query_span("SELECT", &sql))
            .await
            .map_err(map_db_error)?;

        rows.iter()
            .map(Location::from_row)
            .collect::<Result<Vec<_>, _>>()
            .map_err(map_db_error)
    }
}
