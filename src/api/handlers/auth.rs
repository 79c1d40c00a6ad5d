//! Registration and login endpoints.

use super::{parse_optional_id, payload, users::UserResponse};
use crate::{
    api::{response::reply, AppState},
    auth::{middleware::bearer_token, LoginResult, Registration, Role},
    error::Error,
};
use axum::{
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize, Debug)]
pub struct RegisterRequest {
    name: String,
    email: String,
    password: String,
    location_id: Option<String>,
}

#[derive(ToSchema, Deserialize, Debug)]
pub struct LoginRequest {
    email: String,
    password: String,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct LoginResponse {
    token: String,
    user: UserResponse,
}

impl From<LoginResult> for LoginResponse {
    fn from(result: LoginResult) -> Self {
        Self {
            user: UserResponse::from(&result.account),
            token: result.token,
        }
    }
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = Error;

    fn try_from(request: RegisterRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            location_id: parse_optional_id("location_id", request.location_id.as_deref())?,
            name: request.name,
            email: request.email,
            password: request.password,
        })
    }
}

async fn register_as(
    state: &AppState,
    request: Option<Json<RegisterRequest>>,
    role: Role,
) -> Result<Response, Error> {
    let registration = Registration::try_from(payload(request)?)?;
    let account = state.auth.register(registration, role).await?;

    Ok(reply(
        StatusCode::CREATED,
        "User registered successfully",
        UserResponse::from(&account),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Donor registered", body = UserResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Unable to register with the provided details"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn register(
    Extension(state): Extension<AppState>,
    request: Option<Json<RegisterRequest>>,
) -> Result<Response, Error> {
    register_as(&state, request, Role::Donor).await
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register/admin",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Admin registered", body = UserResponse),
        (status = 401, description = "Missing or invalid bearer token"),
        (status = 403, description = "Caller is not a superadmin"),
    ),
    security(("bearer_auth" = [])),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn register_admin(
    Extension(state): Extension<AppState>,
    request: Option<Json<RegisterRequest>>,
) -> Result<Response, Error> {
    register_as(&state, request, Role::Admin).await
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/register/super-admin",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Superadmin registered", body = UserResponse),
        (status = 400, description = "Invalid input"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn register_super_admin(
    Extension(state): Extension<AppState>,
    request: Option<Json<RegisterRequest>>,
) -> Result<Response, Error> {
    register_as(&state, request, Role::SuperAdmin).await
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    Extension(state): Extension<AppState>,
    request: Option<Json<LoginRequest>>,
) -> Result<Response, Error> {
    let request = payload(request)?;
    let result = state.auth.login(&request.email, &request.password).await?;

    Ok(reply(
        StatusCode::OK,
        "Login successful",
        LoginResponse::from(result),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/google",
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Missing identity token"),
        (status = 401, description = "Identity token rejected"),
    ),
    security(("google_id_token" = [])),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn google(
    Extension(state): Extension<AppState>,
    headers: HeaderMap,
) -> Result<Response, Error> {
    let id_token = bearer_token(&headers)
        .ok_or_else(|| Error::Validation("missing identity token".to_string()))?;

    let result = state.auth.authenticate_with_google(id_token).await?;

    Ok(reply(
        StatusCode::OK,
        "Login successful",
        LoginResponse::from(result),
    ))
}
