//! Donation locations.

use super::{owning_tenant, page, parse_id, parse_optional_id, payload, required};
use crate::{
    api::{
        response::{reply, ApiResponse, PageResponse},
        AppState,
    },
    auth::{slug::slugify, Identity},
    error::Error,
    models::Location,
    services::{locations::nearby, NearbyLocation},
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
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(ToSchema, Deserialize, Debug)]
pub struct LocationRequest {
    name: String,
    address: String,
    city: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    /// Required for superadmins, ignored for admins.
    tenant_id: Option<String>,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct LocationResponse {
    id: String,
    tenant_id: String,
    name: String,
    slug: String,
    address: String,
    city: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&Location> for LocationResponse {
    fn from(location: &Location) -> Self {
        Self {
            id: location.id.to_string(),
            tenant_id: location.tenant_id.to_string(),
            name: location.name.clone(),
            slug: location.slug.clone(),
            address: location.address.clone(),
            city: location.city.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
            created_at: location.created_at,
            updated_at: location.updated_at,
        }
    }
}

#[derive(Deserialize, IntoParams, Debug)]
#[into_params(parameter_in = Query)]
pub struct NearbyQuery {
    lat: f64,
    lon: f64,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct NearbyLocationResponse {
    id: String,
    name: String,
    address: String,
    lat: f64,
    lon: f64,
    /// Kilometres
    distance: f64,
}

impl From<&NearbyLocation> for NearbyLocationResponse {
    fn from(nearby: &NearbyLocation) -> Self {
        Self {
            id: nearby.location.id.to_string(),
            name: nearby.location.name.clone(),
            address: nearby.location.address.clone(),
            lat: nearby.location.latitude.unwrap_or_default(),
            lon: nearby.location.longitude.unwrap_or_default(),
            distance: nearby.distance_km,
        }
    }
}

fn coordinates(request: &LocationRequest) -> Result<(Option<f64>, Option<f64>), Error> {
    match (request.latitude, request.longitude) {
        (Some(lat), Some(lon))
            if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) =>
        {
            Err(Error::Validation(
                "latitude or longitude out of range".to_string(),
            ))
        }
        (Some(_), None) | (None, Some(_)) => Err(Error::Validation(
            "latitude and longitude must be given together".to_string(),
        )),
        pair => Ok(pair),
    }
}

fn build_location(request: &LocationRequest, tenant_id: Uuid) -> Result<Location, Error> {
    let name = required("name", &request.name)?;
    let (latitude, longitude) = coordinates(request)?;
    let now = Utc::now();

    Ok(Location {
        id: Uuid::now_v7(),
        tenant_id,
        slug: slugify(&name),
        name,
        address: required("address", &request.address)?,
        city: required("city", &request.city)?,
        latitude,
        longitude,
        created_at: now,
        updated_at: now,
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/locations",
    request_body = LocationRequest,
    responses(
        (status = 201, description = "Location created", body = LocationResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Caller is not an admin"),
    ),
    security(("bearer_auth" = [])),
    tag = "locations"
)]
pub async fn create_location(
    Extension(state): Extension<AppState>,
    identity: Identity,
    request: Option<Json<LocationRequest>>,
) -> Result<Response, Error> {
    let request = payload(request)?;
    let requested = parse_optional_id("tenant_id", request.tenant_id.as_deref())?;
    let tenant_id = owning_tenant(&identity, requested)?;

    if !identity.role.is_tenant_scoped() {
        // Superadmins may target any tenant, but it has to exist.
        state
            .tenants
            .find_by_id(tenant_id, identity.scope())
            .await?;
    }

    let location = state
        .locations
        .create(build_location(&request, tenant_id)?)
        .await?;

    Ok(reply(
        StatusCode::CREATED,
        "Location created successfully",
        LocationResponse::from(&location),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations",
    params(PageRequest),
    responses((status = 200, description = "Locations in scope", body = [LocationResponse])),
    security(("bearer_auth" = [])),
    tag = "locations"
)]
pub async fn list_locations(
    Extension(state): Extension<AppState>,
    identity: Identity,
    query: Option<Query<PageRequest>>,
) -> Result<Response, Error> {
    let locations = state
        .locations
        .find_all(page(query), identity.scope())
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Successfully retrieved locations",
        PageResponse::<LocationResponse>::from_page(locations),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/by-user-location",
    params(NearbyQuery),
    responses(
        (status = 200, description = "Locations nearest first", body = [NearbyLocationResponse]),
        (status = 400, description = "Invalid latitude or longitude"),
    ),
    security(("bearer_auth" = [])),
    tag = "locations"
)]
pub async fn nearby_locations(
    Extension(state): Extension<AppState>,
    identity: Identity,
    query: Option<Query<NearbyQuery>>,
) -> Result<Response, Error> {
    let Some(Query(query)) = query else {
        return Err(Error::Validation(
            "invalid latitude or longitude format".to_string(),
        ));
    };

    let locations = nearby(
        state.location_lookup.as_ref(),
        identity.scope(),
        query.lat,
        query.lon,
    )
    .await?;

    let body: Vec<NearbyLocationResponse> = locations.iter().map(Into::into).collect();

    Ok(reply(
        StatusCode::OK,
        "Successfully retrieved locations",
        body,
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/locations/{id}",
    params(("id" = String, Path, description = "Location id")),
    responses(
        (status = 200, description = "Location", body = LocationResponse),
        (status = 404, description = "Location not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "locations"
)]
pub async fn get_location(
    Extension(state): Extension<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let location = state
        .locations
        .find_by_id(parse_id("id", &id)?, identity.scope())
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Successfully retrieved location",
        LocationResponse::from(&location),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/locations/{id}",
    params(("id" = String, Path, description = "Location id")),
    request_body = LocationRequest,
    responses(
        (status = 200, description = "Location updated", body = LocationResponse),
        (status = 404, description = "Location not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "locations"
)]
pub async fn update_location(
    Extension(state): Extension<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    request: Option<Json<LocationRequest>>,
) -> Result<Response, Error> {
    let id = parse_id("id", &id)?;
    let request = payload(request)?;

    let location = state
        .locations
        .update(id, identity.scope(), |location| {
            let changes = build_location(&request, location.tenant_id)?;
            location.name = changes.name;
            location.slug = changes.slug;
            location.address = changes.address;
            location.city = changes.city;
            location.latitude = changes.latitude;
            location.longitude = changes.longitude;
            location.updated_at = changes.updated_at;
            Ok(())
        })
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Location updated successfully",
        LocationResponse::from(&location),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/locations/{id}",
    params(("id" = String, Path, description = "Location id")),
    responses(
        (status = 200, description = "Location deleted"),
        (status = 404, description = "Location not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "locations"
)]
pub async fn delete_location(
    Extension(state): Extension<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    state
        .locations
        .delete(parse_id("id", &id)?, identity.scope())
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::message("Location deleted successfully")),
    )
        .into_response())
}
