//! Response envelope: `{"status": "success" | "fail", "data": ...}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;

/// Wraps a payload in a `success` envelope.
pub fn success<T: Serialize>(status: StatusCode, data: T) -> Response {
    (status, Json(json!({ "status": "success", "data": data }))).into_response()
}

/// Reports an expected outcome that the caller cannot act on, such as
/// enabling an enabled wallet.
pub fn fail(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "status": "fail", "data": { "error": message } })),
    )
        .into_response()
}
