//! Requests for blood raised at a location.

use super::{page, parse_id, payload};
use crate::{
    api::{
        response::{reply, ApiResponse, PageResponse},
        AppState,
    },
    auth::Identity,
    error::Error,
    models::{parse_field, BloodRequest, BloodType, RequestStatus},
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
pub struct BloodRequestRequest {
    location_id: String,
    /// `A`, `B`, `AB` or `O`
    blood_type: String,
    quantity: i32,
    #[serde(default)]
    description: String,
    /// `pending` (default), `fulfilled` or `cancelled`
    status: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct BloodRequestResponse {
    id: String,
    tenant_id: String,
    location_id: String,
    blood_type: BloodType,
    quantity: i32,
    status: RequestStatus,
    description: String,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&BloodRequest> for BloodRequestResponse {
    fn from(request: &BloodRequest) -> Self {
        Self {
            id: request.id.to_string(),
            tenant_id: request.tenant_id.to_string(),
            location_id: request.location_id.to_string(),
            blood_type: request.blood_type,
            quantity: request.quantity,
            status: request.status,
            description: request.description.clone(),
            created_by: request.created_by.to_string(),
            created_at: request.created_at,
            updated_at: request.updated_at,
        }
    }
}

async fn resolve(
    state: &AppState,
    identity: &Identity,
    request: &BloodRequestRequest,
) -> Result<BloodRequest, Error> {
    let blood_type: BloodType = parse_field(&request.blood_type)?;
    let status: RequestStatus = request
        .status
        .as_deref()
        .map(parse_field)
        .transpose()?
        .unwrap_or_default();
    if request.quantity <= 0 {
        return Err(Error::Validation("quantity must be positive".to_string()));
    }

    let location = state
        .locations
        .find_by_id(parse_id("location_id", &request.location_id)?, identity.scope())
        .await?;

    let now = Utc::now();
    Ok(BloodRequest {
        id: Uuid::now_v7(),
        tenant_id: location.tenant_id,
        location_id: location.id,
        blood_type,
        quantity: request.quantity,
        status,
        description: request.description.trim().to_string(),
        created_by: identity.account_id,
        created_at: now,
        updated_at: now,
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/blood-requests",
    request_body = BloodRequestRequest,
    responses(
        (status = 201, description = "Blood request created", body = BloodRequestResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Location not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "blood-requests"
)]
pub async fn create_blood_request(
    Extension(state): Extension<AppState>,
    identity: Identity,
    request: Option<Json<BloodRequestRequest>>,
) -> Result<Response, Error> {
    let request = payload(request)?;
    let blood_request = resolve(&state, &identity, &request).await?;
    let blood_request = state.blood_requests.create(blood_request).await?;

    Ok(reply(
        StatusCode::CREATED,
        "Blood request created successfully",
        BloodRequestResponse::from(&blood_request),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/blood-requests",
    params(PageRequest),
    responses((status = 200, description = "Blood requests in scope", body = [BloodRequestResponse])),
    security(("bearer_auth" = [])),
    tag = "blood-requests"
)]
pub async fn list_blood_requests(
    Extension(state): Extension<AppState>,
    identity: Identity,
    query: Option<Query<PageRequest>>,
) -> Result<Response, Error> {
    let requests = state
        .blood_requests
        .find_all(page(query), identity.scope())
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Successfully retrieved blood requests",
        PageResponse::<BloodRequestResponse>::from_page(requests),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/blood-requests/{id}",
    params(("id" = String, Path, description = "Blood request id")),
    responses(
        (status = 200, description = "Blood request", body = BloodRequestResponse),
        (status = 404, description = "Blood request not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "blood-requests"
)]
pub async fn get_blood_request(
    Extension(state): Extension<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let request = state
        .blood_requests
        .find_by_id(parse_id("id", &id)?, identity.scope())
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Successfully retrieved blood request",
        BloodRequestResponse::from(&request),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/blood-requests/{id}",
    params(("id" = String, Path, description = "Blood request id")),
    request_body = BloodRequestRequest,
    responses(
        (status = 200, description = "Blood request updated", body = BloodRequestResponse),
        (status = 404, description = "Blood request not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "blood-requests"
)]
pub async fn update_blood_request(
    Extension(state): Extension<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    request: Option<Json<BloodRequestRequest>>,
) -> Result<Response, Error> {
    let id = parse_id("id", &id)?;
    let request = payload(request)?;
    let changes = resolve(&state, &identity, &request).await?;

    let updated = state
        .blood_requests
        .update(id, identity.scope(), |current| {
            current.tenant_id = changes.tenant_id;
            current.location_id = changes.location_id;
            current.blood_type = changes.blood_type;
            current.quantity = changes.quantity;
            current.status = changes.status;
            current.description = changes.description;
            current.updated_at = changes.updated_at;
            Ok(())
        })
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Blood request updated successfully",
        BloodRequestResponse::from(&updated),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/blood-requests/{id}",
    params(("id" = String, Path, description = "Blood request id")),
    responses(
        (status = 200, description = "Blood request deleted"),
        (status = 404, description = "Blood request not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "blood-requests"
)]
pub async fn delete_blood_request(
    Extension(state): Extension<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    state
        .blood_requests
        .delete(parse_id("id", &id)?, identity.scope())
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::message("Blood request deleted successfully")),
    )
        .into_response())
}
