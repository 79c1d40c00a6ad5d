//! Error kinds shared by the services and the HTTP boundary.
//!
//! Services return [`Error`]; the router turns each kind into a status code and a
//! fixed message. Only validation failures carry detail back to the client.

use crate::{api::response::ApiResponse, store::StoreError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

/// Conflict detail for a tenant slug collision.
pub(crate) const SLUG_TAKEN: &str = "slug is already taken";

#[derive(Debug, Error)]
pub enum Error {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("email is already registered")]
    DuplicateEmail,

    #[error("invalid credentials")]
    InvalidCredential,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("role is not permitted for this action")]
    Forbidden,

    #[error("resource not found")]
    NotFound,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateEmail | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::InvalidCredential | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message sent to clients. Stable per kind.
    #[must_use]
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "Invalid request",
            Self::DuplicateEmail => "Unable to register with the provided details",
            Self::InvalidCredential => "Invalid credentials",
            Self::InvalidToken => "Unauthorized",
            Self::Forbidden => "You don't have permission",
            Self::NotFound => "Resource not found",
            Self::Conflict(_) => "Resource conflict",
            Self::Internal(_) => "Internal server error",
        }
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => Self::NotFound,
            StoreError::DuplicateEmail => Self::DuplicateEmail,
            StoreError::DuplicateSlug => Self::Conflict(SLUG_TAKEN.to_string()),
            StoreError::Conflict(reason) => Self::Conflict(reason),
            StoreError::MissingReference => {
                Self::Validation("referenced record does not exist".to_string())
            }
            StoreError::Database(err) => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let detail = match &self {
            Self::Validation(detail) | Self::Conflict(detail) => Some(detail.clone()),
            Self::Internal(detail) => {
                error!("Internal error: {detail}");
                None
            }
            _ => None,
        };

        let body = ApiResponse::<()>::failure(self.public_message(), detail);

        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(err: Error) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_detail() {
        let (status, body) = body_json(Error::Internal("connection refused".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Internal server error");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn validation_errors_carry_detail() {
        let (status, body) = body_json(Error::Validation("email is invalid".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "email is invalid");
    }

    #[test]
    fn status_mapping() {
        assert_eq!(Error::DuplicateEmail.status(), StatusCode::CONFLICT);
        assert_eq!(Error::InvalidCredential.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(Error::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(Error::NotFound.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn store_errors_map_to_kinds() {
        assert!(matches!(Error::from(StoreError::NotFound), Error::NotFound));
        assert!(matches!(
            Error::from(StoreError::DuplicateEmail),
            Error::DuplicateEmail
        ));
        assert!(matches!(
            Error::from(StoreError::DuplicateSlug),
            Error::Conflict(_)
        ));
        assert!(matches!(
            Error::from(StoreError::MissingReference),
            Error::Validation(_)
        ));
    }
}
