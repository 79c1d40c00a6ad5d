//! Donation records.
//!
//! Any authenticated caller may record a donation for themselves; admins may
//! record one on behalf of another account by passing `user_id`.

use super::{page, parse_id, parse_optional_id, payload, required};
use crate::{
    api::{
        response::{reply, ApiResponse, PageResponse},
        AppState,
    },
    auth::Identity,
    error::Error,
    models::{parse_field, Donation, DonationStatus},
    store::PageRequest,
};
use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(ToSchema, Deserialize, Debug)]
pub struct DonationRequest {
    location_id: String,
    event_id: Option<String>,
    /// Admins only; defaults to the caller.
    user_id: Option<String>,
    donor_name: String,
    donation_date: NaiveDate,
    /// `pending` (default), `completed` or `cancelled`
    status: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct DonationResponse {
    id: String,
    tenant_id: String,
    location_id: String,
    user_id: String,
    event_id: Option<String>,
    donor_name: String,
    donation_date: NaiveDate,
    status: DonationStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&Donation> for DonationResponse {
    fn from(donation: &Donation) -> Self {
        Self {
            id: donation.id.to_string(),
            tenant_id: donation.tenant_id.to_string(),
            location_id: donation.location_id.to_string(),
            user_id: donation.user_id.to_string(),
            event_id: donation.event_id.map(|id| id.to_string()),
            donor_name: donation.donor_name.clone(),
            donation_date: donation.donation_date,
            status: donation.status,
            created_at: donation.created_at,
            updated_at: donation.updated_at,
        }
    }
}

async fn resolve(
    state: &AppState,
    identity: &Identity,
    request: &DonationRequest,
) -> Result<Donation, Error> {
    let donor_name = required("donor_name", &request.donor_name)?;
    let status: DonationStatus = request
        .status
        .as_deref()
        .map(parse_field)
        .transpose()?
        .unwrap_or_default();

    let requested_user = parse_optional_id("user_id", request.user_id.as_deref())?;
    let user_id = match requested_user {
        Some(user_id) if identity.is_admin() => user_id,
        Some(user_id) if user_id != identity.account_id => return Err(Error::Forbidden),
        _ => identity.account_id,
    };

    let location = state
        .locations
        .find_by_id(parse_id("location_id", &request.location_id)?, identity.scope())
        .await?;

    let event_id = parse_optional_id("event_id", request.event_id.as_deref())?;
    if let Some(event_id) = event_id {
        let event = state.events.find_by_id(event_id, identity.scope()).await?;
        if event.location_id != location.id {
            return Err(Error::Validation(
                "event does not take place at this location".to_string(),
            ));
        }
    }

    let now = Utc::now();
    Ok(Donation {
        id: Uuid::now_v7(),
        tenant_id: location.tenant_id,
        location_id: location.id,
        user_id,
        event_id,
        donor_name,
        donation_date: request.donation_date,
        status,
        created_at: now,
        updated_at: now,
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/donations",
    request_body = DonationRequest,
    responses(
        (status = 201, description = "Donation recorded", body = DonationResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Location or event not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "donations"
)]
pub async fn create_donation(
    Extension(state): Extension<AppState>,
    identity: Identity,
    request: Option<Json<DonationRequest>>,
) -> Result<Response, Error> {
    let request = payload(request)?;
    let donation = resolve(&state, &identity, &request).await?;
    let donation = state.donations.create(donation).await?;

    Ok(reply(
        StatusCode::CREATED,
        "Donation created successfully",
        DonationResponse::from(&donation),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/donations",
    params(PageRequest),
    responses((status = 200, description = "Donations in scope", body = [DonationResponse])),
    security(("bearer_auth" = [])),
    tag = "donations"
)]
pub async fn list_donations(
    Extension(state): Extension<AppState>,
    identity: Identity,
    query: Option<Query<PageRequest>>,
) -> Result<Response, Error> {
    let donations = state
        .donations
        .find_all(page(query), identity.scope())
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Successfully retrieved donations",
        PageResponse::<DonationResponse>::from_page(donations),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/donations/{id}",
    params(("id" = String, Path, description = "Donation id")),
    responses(
        (status = 200, description = "Donation", body = DonationResponse),
        (status = 404, description = "Donation not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "donations"
)]
pub async fn get_donation(
    Extension(state): Extension<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let donation = state
        .donations
        .find_by_id(parse_id("id", &id)?, identity.scope())
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Successfully retrieved donation",
        DonationResponse::from(&donation),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/donations/{id}",
    params(("id" = String, Path, description = "Donation id")),
    request_body = DonationRequest,
    responses(
        (status = 200, description = "Donation updated", body = DonationResponse),
        (status = 404, description = "Donation not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "donations"
)]
pub async fn update_donation(
    Extension(state): Extension<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    request: Option<Json<DonationRequest>>,
) -> Result<Response, Error> {
    let id = parse_id("id", &id)?;
    let request = payload(request)?;
    let changes = resolve(&state, &identity, &request).await?;
    let keep_user = request.user_id.is_none();

    let donation = state
        .donations
        .update(id, identity.scope(), |donation| {
            donation.tenant_id = changes.tenant_id;
            donation.location_id = changes.location_id;
            if !keep_user {
                donation.user_id = changes.user_id;
            }
            donation.event_id = changes.event_id;
            donation.donor_name = changes.donor_name;
            donation.donation_date = changes.donation_date;
            donation.status = changes.status;
            donation.updated_at = changes.updated_at;
            Ok(())
        })
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Donation updated successfully",
        DonationResponse::from(&donation),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/donations/{id}",
    params(("id" = String, Path, description = "Donation id")),
    responses(
        (status = 200, description = "Donation deleted"),
        (status = 404, description = "Donation not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "donations"
)]
pub async fn delete_donation(
    Extension(state): Extension<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    state
        .donations
        .delete(parse_id("id", &id)?, identity.scope())
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::message("Donation deleted successfully")),
    )
        .into_response())
}
