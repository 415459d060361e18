use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use log::*;
use serde::Serialize;

pub(crate) mod esp_integration_controller;
pub(crate) mod health_check_controller;

/// Uniform response envelope shared by every endpoint.
#[derive(Debug, Serialize)]
pub(crate) struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ApiError>,
    meta: Meta,
}

/// Machine readable failure description. `code` values are stable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiError {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

#[derive(Debug, Serialize)]
struct Meta {
    timestamp: DateTime<Utc>,
}

impl Meta {
    fn now() -> Self {
        Self {
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: Meta::now(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
            meta: Meta::now(),
        }
    }
}

/// Answers requests no route matched with a `NOT_FOUND` envelope.
pub(crate) async fn fallback(uri: Uri) -> impl IntoResponse {
    debug!("No route for {uri}");

    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::error(ApiError {
            code: "NOT_FOUND",
            message: format!("No route for {}", uri.path()),
            details: None,
        })),
    )
}
