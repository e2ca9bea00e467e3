//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use flows::FlowError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client (malformed ids and the like).
    BadRequest(String),
    /// A creation flow failed.
    Flow(FlowError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => error_body(StatusCode::BAD_REQUEST, msg),
            ApiError::Flow(err) => flow_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                error_body(StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        }
    }
}

fn flow_error_to_response(err: FlowError) -> Response {
    match err {
        // Pre-flight rejections: nothing was written.
        FlowError::Draft(_) => error_body(StatusCode::BAD_REQUEST, err.to_string()),

        // A backend write failed and prior steps were rolled back. The
        // warnings list any rollbacks that themselves failed.
        FlowError::Step {
            ref failure,
            ref compensation_failures,
        } => {
            let warnings: Vec<String> = compensation_failures
                .iter()
                .map(|w| w.to_string())
                .collect();
            let body = serde_json::json!({
                "error": failure.to_string(),
                "compensation_warnings": warnings,
            });
            (StatusCode::BAD_GATEWAY, axum::Json(body)).into_response()
        }

        FlowError::Backend(_) | FlowError::Serialization(_) | FlowError::MissingResult(_) => {
            tracing::error!(error = %err, "flow infrastructure error");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    let body = serde_json::json!({ "error": message });
    (status, axum::Json(body)).into_response()
}

impl From<FlowError> for ApiError {
    fn from(err: FlowError) -> Self {
        ApiError::Flow(err)
    }
}
