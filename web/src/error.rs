use std::error::Error as StdError;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::*;

use domain::error::{
    DomainErrorKind, EntityErrorKind, Error as DomainError, ExternalErrorKind, InternalErrorKind,
};

use crate::controller::{ApiError, ApiResponse};
use crate::AppState;

pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug)]
pub struct Error(DomainError);

impl StdError for Error {}

impl std::fmt::Display for Error {
    fn fmt(&self, fmt: &mut std::fmt::Formatter) -> core::result::Result<(), std::fmt::Error> {
        write!(fmt, "{self:?}")
    }
}

/// Maps a domain error onto an HTTP status and a stable error code.
pub(crate) fn classify(err: &DomainError) -> (StatusCode, ApiError) {
    let (status, code, message) = match &err.error_kind {
        DomainErrorKind::Validation(message) => {
            (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message.clone())
        }
        DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::NotFound)) => (
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "ESP integration not found".to_string(),
        ),
        DomainErrorKind::Internal(InternalErrorKind::Entity(EntityErrorKind::Conflict)) => (
            StatusCode::CONFLICT,
            "CONFLICT",
            "An active integration for this provider already exists".to_string(),
        ),
        DomainErrorKind::Internal(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_ERROR",
            "Internal server error".to_string(),
        ),
        DomainErrorKind::External(external_error_kind) => match external_error_kind {
            ExternalErrorKind::Unauthenticated(message) => (
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_ERROR",
                message.clone(),
            ),
            ExternalErrorKind::NotFound(message) => {
                (StatusCode::NOT_FOUND, "NOT_FOUND", message.clone())
            }
            ExternalErrorKind::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                "ESP rate limit exceeded, retry later".to_string(),
            ),
            ExternalErrorKind::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                "TIMEOUT",
                "ESP did not respond in time".to_string(),
            ),
            ExternalErrorKind::ServiceUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
                "ESP is unreachable".to_string(),
            ),
            ExternalErrorKind::Provider { status, message } => (
                StatusCode::from_u16(*status)
                    .ok()
                    .filter(|s| s.is_client_error() || s.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
                "PROVIDER_ERROR",
                message.clone(),
            ),
            ExternalErrorKind::Other(message) => {
                (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", message.clone())
            }
        },
    };

    (
        status,
        ApiError {
            code,
            message,
            details: None,
        },
    )
}

/// Renders the chain of underlying causes, outermost first.
fn source_chain(err: &DomainError) -> Option<String> {
    let mut causes = Vec::new();
    let mut current = err.source();
    while let Some(cause) = current {
        causes.push(cause.to_string());
        current = cause.source();
    }

    (!causes.is_empty()).then(|| causes.join(": "))
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, api_error) = classify(&self.0);

        if status.is_server_error() {
            error!("{} {}: {:?}", status, api_error.code, self.0);
        } else {
            warn!("{} {}: {}", status, api_error.code, api_error.message);
        }

        let detailed = ApiError {
            details: source_chain(&self.0),
            ..api_error.clone()
        };
        let mut response = (status, Json(ApiResponse::error(api_error))).into_response();
        response.extensions_mut().insert(detailed);
        response
    }
}

/// Re-renders error envelopes with their `details` outside production.
pub(crate) async fn attach_error_details(
    State(app_state): State<AppState>,
    mut response: Response,
) -> Response {
    let Some(api_error) = response.extensions_mut().remove::<ApiError>() else {
        return response;
    };
    if app_state.config.is_production() || api_error.details.is_none() {
        return response;
    }

    (response.status(), Json(ApiResponse::error(api_error))).into_response()
}

impl<E> From<E> for Error
where
    E: Into<DomainError>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn external(kind: ExternalErrorKind) -> DomainError {
        DomainError {
            source: None,
            error_kind: DomainErrorKind::External(kind),
        }
    }

    #[test]
    fn taxonomy_maps_to_stable_codes_and_statuses() {
        let cases = [
            (
                DomainError::validation("bad key"),
                StatusCode::BAD_REQUEST,
                "VALIDATION_ERROR",
            ),
            (DomainError::not_found(), StatusCode::NOT_FOUND, "NOT_FOUND"),
            (
                external(ExternalErrorKind::Unauthenticated("rejected".to_string())),
                StatusCode::UNAUTHORIZED,
                "AUTHENTICATION_ERROR",
            ),
            (
                external(ExternalErrorKind::NotFound("no list".to_string())),
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
            ),
            (
                external(ExternalErrorKind::RateLimited),
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
            ),
            (
                external(ExternalErrorKind::Timeout),
                StatusCode::REQUEST_TIMEOUT,
                "TIMEOUT",
            ),
            (
                external(ExternalErrorKind::ServiceUnavailable),
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE",
            ),
            (
                DomainError {
                    source: None,
                    error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                        EntityErrorKind::Conflict,
                    )),
                },
                StatusCode::CONFLICT,
                "CONFLICT",
            ),
            (
                DomainError {
                    source: None,
                    error_kind: DomainErrorKind::Internal(InternalErrorKind::Entity(
                        EntityErrorKind::DbTransaction,
                    )),
                },
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
            ),
        ];

        for (err, status, code) in cases {
            let (actual_status, api_error) = classify(&err);
            assert_eq!(actual_status, status, "{err:?}");
            assert_eq!(api_error.code, code, "{err:?}");
        }
    }

    #[test]
    fn provider_errors_keep_upstream_error_statuses() {
        let (status, api_error) = classify(&external(ExternalErrorKind::Provider {
            status: 503,
            message: "GetResponse error (503)".to_string(),
        }));
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(api_error.code, "PROVIDER_ERROR");

        let (status, _) = classify(&external(ExternalErrorKind::Provider {
            status: 302,
            message: "redirected".to_string(),
        }));
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn response_body_leaves_details_to_the_details_layer() {
        let err = Error(DomainError {
            source: Some("connection reset".into()),
            error_kind: DomainErrorKind::External(ExternalErrorKind::ServiceUnavailable),
        });

        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let detailed = response.extensions().get::<ApiError>().unwrap();
        assert_eq!(detailed.code, "SERVICE_UNAVAILABLE");
        assert_eq!(detailed.details.as_deref(), Some("connection reset"));

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].get("details").is_none());
    }

    #[test]
    fn source_chain_lists_underlying_causes() {
        let err = DomainError {
            source: Some("connection reset".into()),
            error_kind: DomainErrorKind::External(ExternalErrorKind::ServiceUnavailable),
        };

        assert_eq!(source_chain(&err).as_deref(), Some("connection reset"));
        assert_eq!(source_chain(&DomainError::not_found()), None);
    }
}
