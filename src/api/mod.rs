//! HTTP delivery: router, shared state and server startup.

use crate::{
    api::handlers::{
        auth, blood_requests, donations, events, health, locations, profile, root, stocks,
        tenants, users,
    },
    auth::{
        middleware::{ADMINS, SUPERADMINS},
        require_auth, require_roles, AuthConfig, AuthService, GoogleVerifier, Role, RoleGate,
        TokenService,
    },
    models::{BloodRequest, Donation, Event, Location, Stock, Tenant},
    services::{AccountService, ResourceService},
    store::{AccountStore, LocationStore, PgStore, Repository},
};
use anyhow::{Context, Result};
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE, ORIGIN},
        HeaderName, HeaderValue, Method, Request,
    },
    middleware::from_fn_with_state,
    routing::{get, post, put, MethodRouter},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::PropagateRequestIdLayer,
    set_header::SetRequestHeaderLayer,
    trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;

pub mod handlers;
pub mod openapi;
pub mod response;

pub use openapi::openapi;

pub const API_PREFIX: &str = "/api/v1";

/// Services shared by every handler, injected as an `Extension`.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub accounts: AccountService,
    pub tenants: ResourceService<Tenant>,
    pub locations: ResourceService<Location>,
    pub location_lookup: Arc<dyn LocationStore>,
    pub events: ResourceService<Event>,
    pub stocks: ResourceService<Stock>,
    pub donations: ResourceService<Donation>,
    pub blood_requests: ResourceService<BloodRequest>,
}

impl AppState {
    /// Wire every service over one store.
    pub fn new<S>(store: Arc<S>, auth: AuthService) -> Self
    where
        S: AccountStore
            + LocationStore
            + Repository<Tenant>
            + Repository<Location>
            + Repository<Event>
            + Repository<Stock>
            + Repository<Donation>
            + Repository<BloodRequest>
            + 'static,
    {
        Self {
            auth: Arc::new(auth),
            accounts: AccountService::new(store.clone()),
            tenants: ResourceService::new(store.clone()),
            locations: ResourceService::new(store.clone()),
            events: ResourceService::new(store.clone()),
            stocks: ResourceService::new(store.clone()),
            donations: ResourceService::new(store.clone()),
            blood_requests: ResourceService::new(store.clone()),
            location_lookup: store,
        }
    }
}

fn gate(roles: &'static [Role], route: MethodRouter) -> MethodRouter {
    route.route_layer(from_fn_with_state(RoleGate::new(roles), require_roles))
}

/// The complete application router.
///
/// Public auth routes and the bearer-protected routes live under
/// [`API_PREFIX`]; `/` and `/health` stay at the root. Role gates wrap single
/// methods, the bearer check wraps the whole protected group.
pub fn router(state: AppState) -> Router {
    let tokens: Arc<TokenService> = state.auth.tokens().clone();

    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/register/super-admin", post(auth::register_super_admin))
        .route("/auth/login", post(auth::login))
        .route("/auth/google", post(auth::google));

    let protected = Router::new()
        .route(
            "/auth/register/admin",
            gate(SUPERADMINS, post(auth::register_admin)),
        )
        .route(
            "/profile",
            get(profile::get_profile).put(profile::update_profile),
        )
        .route(
            "/profile/details",
            get(profile::get_detail)
                .post(profile::create_detail)
                .put(profile::update_detail),
        )
        .route(
            "/users",
            gate(ADMINS, get(users::list_users).post(users::create_user)),
        )
        .route(
            "/tenants",
            gate(
                SUPERADMINS,
                get(tenants::list_tenants).post(tenants::create_tenant),
            ),
        )
        .route(
            "/tenants/:id",
            gate(
                SUPERADMINS,
                get(tenants::get_tenant)
                    .put(tenants::update_tenant)
                    .delete(tenants::delete_tenant),
            ),
        )
        .route(
            "/locations",
            gate(
                ADMINS,
                get(locations::list_locations).post(locations::create_location),
            ),
        )
        .route(
            "/locations/by-user-location",
            gate(ADMINS, get(locations::nearby_locations)),
        )
        .route(
            "/locations/:id",
            gate(
                ADMINS,
                get(locations::get_location)
                    .put(locations::update_location)
                    .delete(locations::delete_location),
            ),
        )
        .route("/events", get(events::list_events))
        .route("/events", gate(ADMINS, post(events::create_event)))
        .route("/events/:id", get(events::get_event))
        .route(
            "/events/:id",
            gate(
                ADMINS,
                put(events::update_event).delete(events::delete_event),
            ),
        )
        .route("/stocks", get(stocks::list_stocks))
        .route("/stocks", gate(ADMINS, post(stocks::create_stock)))
        .route("/stocks/:id", get(stocks::get_stock))
        .route(
            "/stocks/:id",
            gate(
                ADMINS,
                put(stocks::update_stock).delete(stocks::delete_stock),
            ),
        )
        .route(
            "/donations",
            get(donations::list_donations).post(donations::create_donation),
        )
        .route("/donations/:id", get(donations::get_donation))
        .route(
            "/donations/:id",
            gate(
                ADMINS,
                put(donations::update_donation)
                    .delete(donations::delete_donation),
            ),
        )
        .route(
            "/blood-requests",
            get(blood_requests::list_blood_requests).post(blood_requests::create_blood_request),
        )
        .route("/blood-requests/:id", get(blood_requests::get_blood_request))
        .route(
            "/blood-requests/:id",
            gate(
                ADMINS,
                put(blood_requests::update_blood_request)
                    .delete(blood_requests::delete_blood_request),
            ),
        )
        .route_layer(from_fn_with_state(tokens, require_auth));

    let cors = CorsLayer::new()
        .allow_headers([ORIGIN, CONTENT_TYPE, AUTHORIZATION])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_origin(Any);

    Router::new()
        .nest(API_PREFIX, public.merge(protected))
        .route("/", get(root::root))
        .route("/health", get(health::health).options(health::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(cors)
                .layer(Extension(state)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to start the server
pub async fn new(port: u16, dsn: String, config: AuthConfig) -> Result<()> {
    let store = Arc::new(PgStore::connect(&dsn).await?);

    store
        .migrate()
        .await
        .context("Failed to apply database schema")?;

    let tokens = Arc::new(TokenService::new(&config));
    let verifier = Arc::new(
        GoogleVerifier::new(config.google_tokeninfo_url())
            .context("Failed to build identity provider client")?,
    );
    let auth = AuthService::new(store.clone(), tokens, verifier, &config);

    let app = router(AppState::new(store, auth));

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Gracefully shutdown");
            }
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
