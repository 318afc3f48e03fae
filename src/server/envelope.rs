//! JSON response envelopes.
//!
//! Success bodies are objects with `success: true` plus the payload fields.
//! Failures are `{success: false, error, kind}` with the status code the
//! error variant maps to.

use crate::error::DocfillError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::{Map, Value, json};
use tracing::{error, warn};

/// Wrap an object payload in a success envelope.
pub fn success(payload: Value) -> Json<Value> {
    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    if let Value::Object(fields) = payload {
        body.extend(fields);
    }
    Json(Value::Object(body))
}

/// A [`DocfillError`] rendered as an error envelope.
#[derive(Debug)]
pub struct ApiError(pub DocfillError);

impl From<DocfillError> for ApiError {
    fn from(err: DocfillError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let kind = self.0.kind();
        let message = self.0.to_string();
        if status.is_server_error() {
            error!(status = status.as_u16(), kind, error = %message, "request failed");
        } else {
            warn!(status = status.as_u16(), kind, error = %message, "request rejected");
        }
        let body = json!({
            "success": false,
            "error": message,
            "kind": kind,
        });
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
