//! Structured JSON error responses
//!
//! Every error leaving the API has the shape
//! `{"error": {"code": "...", "message": "..."}}` so clients can branch on
//! the machine-readable code and show the message to humans.

use crate::error::Error;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Build the standard error response body.
pub(crate) fn error_response(
    status: StatusCode,
    code: &str,
    message: impl Into<String>,
) -> Response {
    (
        status,
        Json(json!({"error": {"code": code, "message": message.into()}})),
    )
        .into_response()
}

/// Map a library error onto a status code and error body.
pub(crate) fn from_error(err: &Error) -> Response {
    let (status, code) = match err {
        Error::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        Error::Busy(_) => (StatusCode::CONFLICT, "operation_in_progress"),
        Error::Config { .. } => (StatusCode::BAD_REQUEST, "invalid_config"),
        Error::Catalog(_) => (StatusCode::BAD_GATEWAY, "catalog_unavailable"),
        Error::Network(_) => (StatusCode::BAD_GATEWAY, "upstream_unavailable"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    error_response(status, code, err.to_string())
}
