//! Blood stock per location and variant.

use super::{page, parse_id, payload};
use crate::{
    api::{
        response::{reply, ApiResponse, PageResponse},
        AppState,
    },
    auth::Identity,
    error::Error,
    models::{parse_field, BloodType, Rhesus, Stock},
    store::PageRequest,
};
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Deserialize, Debug)]
pub struct StockRequest {
    location_id: String,
    /// `A`, `B`, `AB` or `O`
    blood_type: String,
    /// `+` or `-`
    rhesus: String,
    bag_quantity: i32,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct StockResponse {
    id: String,
    tenant_id: String,
    location_id: String,
    blood_type: BloodType,
    rhesus: Rhesus,
    bag_quantity: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&Stock> for StockResponse {
    fn from(stock: &Stock) -> Self {
        Self {
            id: stock.id.to_string(),
            tenant_id: stock.tenant_id.to_string(),
            location_id: stock.location_id.to_string(),
            blood_type: stock.blood_type,
            rhesus: stock.rhesus,
            bag_quantity: stock.bag_quantity,
            created_at: stock.created_at,
            updated_at: stock.updated_at,
        }
    }
}

async fn resolve(
    state: &AppState,
    identity: &Identity,
    request: &StockRequest,
) -> Result<Stock, Error> {
    let blood_type: BloodType = parse_field(&request.blood_type)?;
    let rhesus: Rhesus = parse_field(&request.rhesus)?;
    if request.bag_quantity < 0 {
        return Err(Error::Validation(
            "bag_quantity must not be negative".to_string(),
        ));
    }

    let location = state
        .locations
        .find_by_id(parse_id("location_id", &request.location_id)?, identity.scope())
        .await?;

    let now = Utc::now();
    Ok(Stock {
        id: Uuid::now_v7(),
        tenant_id: location.tenant_id,
        location_id: location.id,
        blood_type,
        rhesus,
        bag_quantity: request.bag_quantity,
        created_at: now,
        updated_at: now,
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/stocks",
    request_body = StockRequest,
    responses(
        (status = 201, description = "Stock created", body = StockResponse),
        (status = 404, description = "Location not found"),
        (status = 409, description = "Stock for this variant already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "stocks"
)]
pub async fn create_stock(
    Extension(state): Extension<AppState>,
    identity: Identity,
    request: Option<Json<StockRequest>>,
) -> Result<Response, Error> {
    let request = payload(request)?;
    let stock = resolve(&state, &identity, &request).await?;
    let stock = state.stocks.create(stock).await?;

    Ok(reply(
        StatusCode::CREATED,
        "Stock created successfully",
        StockResponse::from(&stock),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/stocks",
    params(PageRequest),
    responses((status = 200, description = "Stocks in scope", body = [StockResponse])),
    security(("bearer_auth" = [])),
    tag = "stocks"
)]
pub async fn list_stocks(
    Extension(state): Extension<AppState>,
    identity: Identity,
    query: Option<Query<PageRequest>>,
) -> Result<Response, Error> {
    let stocks = state.stocks.find_all(page(query), identity.scope()).await?;

    Ok(reply(
        StatusCode::OK,
        "Successfully retrieved stocks",
        PageResponse::<StockResponse>::from_page(stocks),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/stocks/{id}",
    params(("id" = String, Path, description = "Stock id")),
    responses(
        (status = 200, description = "Stock", body = StockResponse),
        (status = 404, description = "Stock not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "stocks"
)]
pub async fn get_stock(
    Extension(state): Extension<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let stock = state
        .stocks
        .find_by_id(parse_id("id", &id)?, identity.scope())
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Successfully retrieved stock",
        StockResponse::from(&stock),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/stocks/{id}",
    params(("id" = String, Path, description = "Stock id")),
    request_body = StockRequest,
    responses(
        (status = 200, description = "Stock updated", body = StockResponse),
        (status = 404, description = "Stock or location not found"),
        (status = 409, description = "Stock for this variant already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "stocks"
)]
pub async fn update_stock(
    Extension(state): Extension<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    request: Option<Json<StockRequest>>,
) -> Result<Response, Error> {
    let id = parse_id("id", &id)?;
    let request = payload(request)?;
    let changes = resolve(&state, &identity, &request).await?;

    let stock = state
        .stocks
        .update(id, identity.scope(), |stock| {
            stock.tenant_id = changes.tenant_id;
            stock.location_id = changes.location_id;
            stock.blood_type = changes.blood_type;
            stock.rhesus = changes.rhesus;
            stock.bag_quantity = changes.bag_quantity;
            stock.updated_at = changes.updated_at;
            Ok(())
        })
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Stock updated successfully",
        StockResponse::from(&stock),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/stocks/{id}",
    params(("id" = String, Path, description = "Stock id")),
    responses(
        (status = 200, description = "Stock deleted"),
        (status = 404, description = "Stock not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "stocks"
)]
pub async fn delete_stock(
    Extension(state): Extension<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    state
        .stocks
        .delete(parse_id("id", &id)?, identity.scope())
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::message("Stock deleted successfully")),
    )
        .into_response())
}
