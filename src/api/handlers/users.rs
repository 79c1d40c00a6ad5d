//! Tenant user management for admins.

use super::{page, parse_optional_id, payload, profile::{ProfileResponse, UserDetailRequest}};
use crate::{
    api::{response::{reply, PageResponse}, AppState},
    auth::{Identity, Role},
    error::Error,
    models::Account,
    services::DetailInput,
    store::PageRequest,
};
use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Account summary; never carries credentials.
#[derive(ToSchema, Serialize, Debug, Clone)]
pub struct UserResponse {
    id: String,
    name: String,
    email: Option<String>,
    role: Role,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    tenant_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    location_id: Option<String>,
}

impl From<&Account> for UserResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id.to_string(),
            name: account.name.clone(),
            email: account.email.clone(),
            role: account.role,
            status: account.status.as_str().to_string(),
            tenant_id: account.tenant_id.map(|id| id.to_string()),
            location_id: account.location_id.map(|id| id.to_string()),
        }
    }
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct CreateUserRequest {
    name: String,
    location_id: Option<String>,
    /// Superadmin only; others always create in their own tenant.
    tenant_id: Option<String>,
    details: UserDetailRequest,
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PageRequest),
    responses(
        (status = 200, description = "Accounts in the caller's tenant", body = [UserResponse]),
        (status = 403, description = "Caller is not an admin"),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn list_users(
    Extension(state): Extension<AppState>,
    identity: Identity,
    query: Option<Query<PageRequest>>,
) -> Result<Response, Error> {
    let accounts = state.accounts.list(page(query), identity.scope()).await?;

    Ok(reply(
        StatusCode::OK,
        "Successfully retrieved users",
        PageResponse::<UserResponse>::from_page(accounts),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "Unclaimed donor created", body = ProfileResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Location not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "users"
)]
pub async fn create_user(
    Extension(state): Extension<AppState>,
    identity: Identity,
    request: Option<Json<CreateUserRequest>>,
) -> Result<Response, Error> {
    let request = payload(request)?;
    let location_id = parse_optional_id("location_id", request.location_id.as_deref())?;
    let requested_tenant = parse_optional_id("tenant_id", request.tenant_id.as_deref())?;

    let tenant_id = match location_id {
        Some(location_id) => Some(
            state
                .locations
                .find_by_id(location_id, identity.scope())
                .await?
                .tenant_id,
        ),
        None if identity.role.is_tenant_scoped() => {
            Some(identity.tenant_id.ok_or(Error::Forbidden)?)
        }
        None => requested_tenant,
    };

    let input = DetailInput::try_from(request.details)?;
    let profile = state
        .accounts
        .create_unclaimed(&request.name, tenant_id, location_id, input)
        .await?;

    Ok(reply(
        StatusCode::CREATED,
        "User created successfully",
        ProfileResponse::from(&profile),
    ))
}
