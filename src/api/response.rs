//! JSON envelope shared by every endpoint.

use crate::store::Page;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// `{success, message, data?, error?}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    #[must_use]
    pub fn failure(message: &str, error: Option<String>) -> Self {
        Self {
            success: false,
            message: message.to_string(),
            data: None,
            error,
        }
    }

    #[must_use]
    pub fn message(message: &str) -> Self {
        Self {
            success: true,
            message: message.to_string(),
            data: None,
            error: None,
        }
    }
}

/// Serialize `data` in a success envelope with `status`.
pub fn reply<T: Serialize>(status: StatusCode, message: &str, data: T) -> Response {
    (status, Json(ApiResponse::success(message, data))).into_response()
}

/// Paginated list payload.
#[derive(Debug, Serialize)]
pub struct PageResponse<T> {
    pub data: Vec<T>,
    pub total_items: u64,
    pub page: u32,
    pub limit: u32,
}

impl<T> PageResponse<T> {
    pub fn from_page<U>(page: Page<U>) -> Self
    where
        T: for<'a> From<&'a U>,
    {
        Self {
            data: page.items.iter().map(T::from).collect(),
            total_items: page.total,
            page: page.page,
            limit: page.limit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn failure_omits_data() {
        let body = serde_json::to_value(ApiResponse::<()>::failure("Invalid request", None)).unwrap();
        assert_eq!(body, json!({"success": false, "message": "Invalid request"}));
    }

    #[derive(Serialize)]
    struct Label(String);

    impl From<&u32> for Label {
        fn from(value: &u32) -> Self {
            Self(format!("#{value}"))
        }
    }

    #[test]
    fn page_envelope_fields() {
        let page = Page {
            items: vec![1_u32, 2],
            total: 7,
            page: 2,
            limit: 2,
        };
        let response: PageResponse<Label> = PageResponse::from_page(page);
        let body = serde_json::to_value(ApiResponse::success("ok", response)).unwrap();
        assert_eq!(body["data"]["total_items"], 7);
        assert_eq!(body["data"]["data"], json!(["#1", "#2"]));
        assert_eq!(body["data"]["page"], 2);
    }
}
