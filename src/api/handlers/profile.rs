//! The caller's own account and donor details.

use super::{payload, required, users::UserResponse};
use crate::{
    api::{response::reply, AppState},
    auth::Identity,
    error::Error,
    models::{parse_field, UserDetail},
    services::{DetailInput, Profile},
};
use axum::{extract::Extension, http::StatusCode, response::Response, Json};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(ToSchema, Deserialize, Debug)]
pub struct UpdateProfileRequest {
    name: String,
}

#[derive(ToSchema, Deserialize, Debug, Clone)]
pub struct UserDetailRequest {
    full_name: String,
    /// `L` or `P`
    gender: String,
    date_of_birth: NaiveDate,
    blood_type: Option<String>,
    rhesus: Option<String>,
    phone_number: String,
    address: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    weight: f64,
    #[serde(default)]
    is_active_donor: bool,
}

impl TryFrom<UserDetailRequest> for DetailInput {
    type Error = Error;

    fn try_from(request: UserDetailRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            full_name: required("full_name", &request.full_name)?,
            gender: parse_field(&request.gender)?,
            date_of_birth: request.date_of_birth,
            blood_type: request.blood_type.as_deref().map(parse_field).transpose()?,
            rhesus: request.rhesus.as_deref().map(parse_field).transpose()?,
            phone_number: request.phone_number,
            address: request.address,
            is_active_donor: request.is_active_donor,
            latitude: request.latitude,
            longitude: request.longitude,
            weight: request.weight,
        })
    }
}

#[derive(ToSchema, Serialize, Debug)]
pub struct UserDetailResponse {
    id: String,
    user_id: String,
    full_name: String,
    gender: String,
    date_of_birth: NaiveDate,
    blood_type: Option<String>,
    rhesus: Option<String>,
    phone_number: String,
    address: String,
    is_active_donor: bool,
    latitude: Option<f64>,
    longitude: Option<f64>,
    weight: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&UserDetail> for UserDetailResponse {
    fn from(detail: &UserDetail) -> Self {
        Self {
            id: detail.id.to_string(),
            user_id: detail.user_id.to_string(),
            full_name: detail.full_name.clone(),
            gender: detail.gender.as_str().to_string(),
            date_of_birth: detail.date_of_birth,
            blood_type: detail.blood_type.map(|b| b.as_str().to_string()),
            rhesus: detail.rhesus.map(|r| r.as_str().to_string()),
            phone_number: detail.phone_number.clone(),
            address: detail.address.clone(),
            is_active_donor: detail.is_active_donor,
            latitude: detail.latitude,
            longitude: detail.longitude,
            weight: detail.weight,
            created_at: detail.created_at,
            updated_at: detail.updated_at,
        }
    }
}

#[derive(ToSchema, Serialize, Debug)]
pub struct ProfileResponse {
    user: UserResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<UserDetailResponse>,
}

impl From<&Profile> for ProfileResponse {
    fn from(profile: &Profile) -> Self {
        Self {
            user: UserResponse::from(&profile.account),
            details: profile.detail.as_ref().map(UserDetailResponse::from),
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "Caller profile", body = ProfileResponse),
        (status = 401, description = "Missing or invalid bearer token"),
    ),
    security(("bearer_auth" = [])),
    tag = "profile"
)]
pub async fn get_profile(
    Extension(state): Extension<AppState>,
    identity: Identity,
) -> Result<Response, Error> {
    let profile = state.accounts.profile(identity.account_id).await?;

    Ok(reply(
        StatusCode::OK,
        "User profile retrieved successfully",
        ProfileResponse::from(&profile),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Name updated", body = UserResponse),
        (status = 400, description = "Invalid input"),
    ),
    security(("bearer_auth" = [])),
    tag = "profile"
)]
pub async fn update_profile(
    Extension(state): Extension<AppState>,
    identity: Identity,
    request: Option<Json<UpdateProfileRequest>>,
) -> Result<Response, Error> {
    let request = payload(request)?;
    let account = state
        .accounts
        .rename(identity.account_id, &request.name)
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Profile updated successfully",
        UserResponse::from(&account),
    ))
}

#[utoipa::path(
    post,
    path = "/api/v1/profile/details",
    request_body = UserDetailRequest,
    responses(
        (status = 201, description = "Details created", body = UserDetailResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Details already exist"),
    ),
    security(("bearer_auth" = [])),
    tag = "profile"
)]
pub async fn create_detail(
    Extension(state): Extension<AppState>,
    identity: Identity,
    request: Option<Json<UserDetailRequest>>,
) -> Result<Response, Error> {
    let input = DetailInput::try_from(payload(request)?)?;
    let detail = state
        .accounts
        .create_detail(identity.account_id, input)
        .await?;

    Ok(reply(
        StatusCode::CREATED,
        "User detail created successfully",
        UserDetailResponse::from(&detail),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/profile/details",
    responses(
        (status = 200, description = "Caller details", body = UserDetailResponse),
        (status = 404, description = "No details yet"),
    ),
    security(("bearer_auth" = [])),
    tag = "profile"
)]
pub async fn get_detail(
    Extension(state): Extension<AppState>,
    identity: Identity,
) -> Result<Response, Error> {
    let detail = state.accounts.detail(identity.account_id).await?;

    Ok(reply(
        StatusCode::OK,
        "User detail retrieved successfully",
        UserDetailResponse::from(&detail),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/profile/details",
    request_body = UserDetailRequest,
    responses(
        (status = 200, description = "Details updated", body = UserDetailResponse),
        (status = 404, description = "No details yet"),
    ),
    security(("bearer_auth" = [])),
    tag = "profile"
)]
pub async fn update_detail(
    Extension(state): Extension<AppState>,
    identity: Identity,
    request: Option<Json<UserDetailRequest>>,
) -> Result<Response, Error> {
    let input = DetailInput::try_from(payload(request)?)?;
    let detail = state
        .accounts
        .update_detail(identity.account_id, input)
        .await?;

    Ok(reply(
        StatusCode::OK,
        "User detail updated successfully",
        UserDetailResponse::from(&detail),
    ))
}
