use crate::{api::AppState, GIT_COMMIT_HASH};
use axum::{
    extract::Extension,
    http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use utoipa::ToSchema;

const X_APP: HeaderName = HeaderName::from_static("x-app");

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseStatus {
    Ok,
    Error,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    name: String,
    version: String,
    build: String,
    database: DatabaseStatus,
}

impl Health {
    fn current(database: DatabaseStatus) -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            build: GIT_COMMIT_HASH.to_string(),
            database,
        }
    }

    fn status(&self) -> StatusCode {
        match self.database {
            DatabaseStatus::Ok => StatusCode::OK,
            DatabaseStatus::Error => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// `name:version:short-hash`, the hash is empty for non-git builds.
    fn x_app(&self) -> HeaderMap {
        let short_hash = self.build.get(..7).filter(|_| self.build.len() > 7).unwrap_or("");

        let mut headers = HeaderMap::new();
        match HeaderValue::from_str(&format!("{}:{}:{short_hash}", self.name, self.version)) {
            Ok(value) => {
                headers.insert(X_APP, value);
            }
            Err(err) => warn!("Failed to build X-App header: {err}"),
        }
        headers
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Database is healthy", body = Health),
        (status = 503, description = "Database is unhealthy", body = Health)
    ),
    tag = "health"
)]
pub async fn health(method: Method, Extension(state): Extension<AppState>) -> Response {
    let database = match state.accounts.ping().await {
        Ok(()) => DatabaseStatus::Ok,
        Err(err) => {
            error!("Failed to ping database: {err}");
            DatabaseStatus::Error
        }
    };

    let health = Health::current(database);
    let headers = health.x_app();
    let status = health.status();

    // OPTIONS only reports through the status and the X-App header
    if method == Method::OPTIONS {
        return (status, headers).into_response();
    }

    (status, headers, Json(health)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_follows_database() {
        assert_eq!(Health::current(DatabaseStatus::Ok).status(), StatusCode::OK);
        assert_eq!(
            Health::current(DatabaseStatus::Error).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn x_app_header_shape() {
        let mut health = Health::current(DatabaseStatus::Ok);
        health.build = "0123456789abcdef".to_string();

        let headers = health.x_app();
        let value = headers.get("x-app").and_then(|v| v.to_str().ok());
        assert_eq!(
            value,
            Some(format!("{}:{}:0123456", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")).as_str())
        );

        health.build = "unknown".to_string();
        let headers = health.x_app();
        let value = headers.get("x-app").and_then(|v| v.to_str().ok());
        assert_eq!(
            value,
            Some(format!("{}:{}:", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")).as_str())
        );
    }

    #[test]
    fn body_serializes_database_status() {
        let body = serde_json::to_value(Health::current(DatabaseStatus::Error)).unwrap();
        assert_eq!(body["database"], "error");
        assert_eq!(body["name"], env!("CARGO_PKG_NAME"));
    }
}
