//! Donation events.

use super::{page, parse_id, payload, required};
use crate::{
    api::{
        response::{reply, ApiResponse, PageResponse},
        AppState,
    },
    auth::Identity,
    error::Error,
    models::Event,
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
pub struct EventRequest {
    location_id: String,
    name: String,
    #[serde(default)]
    description: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

#[derive(ToSchema, Serialize, Debug)]
pub struct EventResponse {
    id: String,
    tenant_id: String,
    location_id: String,
    name: String,
    description: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<&Event> for EventResponse {
    fn from(event: &Event) -> Self {
        Self {
            id: event.id.to_string(),
            tenant_id: event.tenant_id.to_string(),
            location_id: event.location_id.to_string(),
            name: event.name.clone(),
            description: event.description.clone(),
            start_date: event.start_date,
            end_date: event.end_date,
            created_at: event.created_at,
            updated_at: event.updated_at,
        }
    }
}

/// Validated request with its location resolved in the caller's scope.
async fn resolve(
    state: &AppState,
    identity: &Identity,
    request: &EventRequest,
) -> Result<Event, Error> {
    let name = required("name", &request.name)?;
    if request.end_date < request.start_date {
        return Err(Error::Validation(
            "end_date must not be before start_date".to_string(),
        ));
    }

    let location = state
        .locations
        .find_by_id(parse_id("location_id", &request.location_id)?, identity.scope())
        .await?;

    let now = Utc::now();
    Ok(Event {
        id: Uuid::now_v7(),
        tenant_id: location.tenant_id,
        location_id: location.id,
        name,
        description: request.description.trim().to_string(),
        start_date: request.start_date,
        end_date: request.end_date,
        created_at: now,
        updated_at: now,
    })
}

#[utoipa::path(
    post,
    path = "/api/v1/events",
    request_body = EventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Invalid input"),
        (status = 404, description = "Location not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn create_event(
    Extension(state): Extension<AppState>,
    identity: Identity,
    request: Option<Json<EventRequest>>,
) -> Result<Response, Error> {
    let request = payload(request)?;
    let event = resolve(&state, &identity, &request).await?;
    let event = state.events.create(event).await?;

    Ok(reply(
        StatusCode::CREATED,
        "Event created successfully",
        EventResponse::from(&event),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/events",
    params(PageRequest),
    responses((status = 200, description = "Events in scope", body = [EventResponse])),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn list_events(
    Extension(state): Extension<AppState>,
    identity: Identity,
    query: Option<Query<PageRequest>>,
) -> Result<Response, Error> {
    let events = state.events.find_all(page(query), identity.scope()).await?;

    Ok(reply(
        StatusCode::OK,
        "Successfully retrieved events",
        PageResponse::<EventResponse>::from_page(events),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/events/{id}",
    params(("id" = String, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event", body = EventResponse),
        (status = 404, description = "Event not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn get_event(
    Extension(state): Extension<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    let event = state
        .events
        .find_by_id(parse_id("id", &id)?, identity.scope())
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Successfully retrieved event",
        EventResponse::from(&event),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/events/{id}",
    params(("id" = String, Path, description = "Event id")),
    request_body = EventRequest,
    responses(
        (status = 200, description = "Event updated", body = EventResponse),
        (status = 404, description = "Event or location not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn update_event(
    Extension(state): Extension<AppState>,
    identity: Identity,
    Path(id): Path<String>,
    request: Option<Json<EventRequest>>,
) -> Result<Response, Error> {
    let id = parse_id("id", &id)?;
    let request = payload(request)?;
    let changes = resolve(&state, &identity, &request).await?;

    let event = state
        .events
        .update(id, identity.scope(), |event| {
            event.tenant_id = changes.tenant_id;
            event.location_id = changes.location_id;
            event.name = changes.name;
            event.description = changes.description;
            event.start_date = changes.start_date;
            event.end_date = changes.end_date;
            event.updated_at = changes.updated_at;
            Ok(())
        })
        .await?;

    Ok(reply(
        StatusCode::OK,
        "Event updated successfully",
        EventResponse::from(&event),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/v1/events/{id}",
    params(("id" = String, Path, description = "Event id")),
    responses(
        (status = 200, description = "Event deleted"),
        (status = 404, description = "Event not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "events"
)]
pub async fn delete_event(
    Extension(state): Extension<AppState>,
    identity: Identity,
    Path(id): Path<String>,
) -> Result<Response, Error> {
    state
        .events
        .delete(parse_id("id", &id)?, identity.scope())
        .await?;

    Ok((
        StatusCode::OK,
        Json(ApiResponse::message("Event deleted successfully")),
    )
        .into_response())
}
