//! Tenant administration (superadmin only).

use super::{page, parse_id, payload};
use crate::{
    api::{
        response::{reply, ApiResponse, PageResponse},
        AppState,
    },
    error::Error,
    models::Tenant,
    store::{PageRequest, TenantScope},
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

#[derive(ToSchema, Deserialize, Debug)]
pub struct TenantRequest {
    name: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct TenantResponse {
    id: String,
    name: String,
    slug: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&Tenant> for TenantResponse {
    fn from(tenant: &Tenant) -> Self {
        Self {
            id: tenant.id.to_string(),
            name: tenant.name.clone(),
            slug: tenant.slug.clone(),
            created_at: tenant.created_at,
            updated_at: tenant.updated_at,
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/v1/tenants",
    request_body = TenantRequest,
    responses(
        (status = 201, description = "Tenant created", body = TenantResponse),
        (status = 403, description = "Caller is not a superadmin"),
    ),
    security(("bearer_auth" = [])),
    tag = "tenants"
)]
pub async fn create_tenant(
    Extension(state): Extension<AppState>,
    request: Option<Json<TenantRequest>>,
) -> Result<Response, Error> {
    let request = payload(request)?;
    let tenant = state.tenants.create_named(&request.name).await?;

    Ok(reply(
        StatusCode::CREATED,
        "Tenant created successfully",
        TenantResponse::from(&tenant),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/tenants",
    params(PageRequest),
    responses((status = 200, description = "All tenants", body = [TenantResponse])),
    security(("bearer_auth" = [])),
    tag = "tenants"
)]
pub async fn list_tenants(
    Extension(state): Extension<AppState>,
    query: Option<Query<PageRequest>>,
) -> Result<Response, Error> {
    let tenants = state.tenants.find_all(page(query), TenantScope::All).await?;

    Ok(reply(
        StatusCode::OK,
        "Successfully retrieved tenants",
        PageResponse::<TenantResponse>::from_page(tenants),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/tenants/{id}",
    params(("id" = String, Path, description = "Tenant id")),
    responses(
        (status = 200, description = "Tenant", body = TenantResponse),
        (status = 404, description = "Tenant not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "tenants"
)]
pub async fn get_tenant(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let tenant = state
        .tenants
        .find_by_id(parse_id("id", &id)?, TenantScope::All)
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Successfully retrieved tenant",
        TenantResponse::from(&tenant),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/tenants/{id}",
    params(("id" = String, Path, description = "Tenant id")),
    request_body = TenantRequest,
    responses(
        (status = 200, description = "Tenant renamed", body = TenantResponse),
        (status = 404, description = "Tenant not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "tenants"
)]
pub async fn update_tenant(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    request: Option<Json<TenantRequest>>,
) -> Result<Response, Error> {
    let id = parse_id("id", &id)?;
    let request = payload(request)?;
    let tenant = state.tenants.rename(id, &request.name).await?;

    Ok(reply(
        StatusCode::OK,
        "Tenant updated successfully",
        TenantResponse::from(&tenant),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/tenants/{id}",
    params(("id" = String, Path, description = "Tenant id")),
    responses(
        (status = 200, description = "Tenant deleted"),
        (status = 404, description = "Tenant not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "tenants"
)]
pub async fn delete_tenant(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    state
        .tenants
        .delete(parse_id("id", &id)?, TenantScope::All)
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::message("Tenant deleted successfully")),
    )
        .into_response())
}
