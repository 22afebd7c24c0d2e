//! HTTP error response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use growhub_app::rule_engine::TickError;
use growhub_domain::error::GrowHubError;

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Everything a handler can fail with, mapped to a status code.
pub enum ApiError {
    Domain(GrowHubError),
    Tick(TickError),
    /// The request body could not be decoded.
    BadRequest(String),
}

impl From<GrowHubError> for ApiError {
    fn from(err: GrowHubError) -> Self {
        Self::Domain(err)
    }
}

impl From<TickError> for ApiError {
    fn from(err: TickError) -> Self {
        Self::Tick(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

fn internal(err: &(dyn std::error::Error + 'static)) -> (StatusCode, String) {
    tracing::error!(error = %err, source = ?err.source().map(ToString::to_string), "request failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal server error".to_string(),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Domain(GrowHubError::Validation(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string())
            }
            Self::Domain(GrowHubError::NotFound(err)) => (StatusCode::NOT_FOUND, err.to_string()),
            Self::Domain(err) => internal(err),
            Self::Tick(TickError::Busy) => (StatusCode::CONFLICT, TickError::Busy.to_string()),
            Self::Tick(err) => internal(err),
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
