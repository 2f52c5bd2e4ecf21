//! Uniform `CallResult` → HTTP translation
//!
//! Every route funnels through one of the translators: [`listing`] for
//! collections, [`fetched`] for single-resource reads, [`forwarded`]
//! for plain passthroughs, and [`mutated`] for writes. None of them
//! perform business logic; keeping orchestration out of the routing
//! layer is the point.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use tracing::warn;

use crate::gateway::{CallError, CallResult};

/// JSON failure body: `{"detail": <message>}`
pub fn detail(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({"detail": message.into()}))).into_response()
}

/// Status for a failed call: a remote 4xx passes through, everything
/// else (5xx, transport, caller misuse) maps to 400.
fn error_status(error: &CallError) -> StatusCode {
    match error.status {
        Some(code @ 400..=499) => {
            StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST)
        }
        _ => StatusCode::BAD_REQUEST,
    }
}

fn error_detail(error: &CallError) -> String {
    if error.message.is_empty() {
        error.to_string()
    } else {
        error.message.clone()
    }
}

/// Collection endpoint translation.
///
/// Failures yield an empty list rather than an error; the UI treats the
/// collection as absent. The remote failure is still logged so genuine
/// empty results stay distinguishable in the logs.
pub fn listing(operation: &str, result: CallResult<Value>) -> Response {
    let data = match result {
        Ok(Value::Array(items)) => Value::Array(items),
        Ok(other) => {
            warn!(operation, ?other, "List operation returned non-array value");
            json!([])
        }
        Err(error) => {
            warn!(operation, %error, "List operation failed, returning empty list");
            json!([])
        }
    };
    Json(json!({"object": "list", "data": data})).into_response()
}

/// Single-resource GET translation: an empty result means the resource
/// does not exist (404); a remote error is a bad request (400) carrying
/// the remote text.
pub fn fetched(result: CallResult<Value>, not_found: &str) -> Response {
    match result {
        Ok(value) if is_empty(&value) => detail(StatusCode::NOT_FOUND, not_found),
        Ok(value) => Json(value).into_response(),
        Err(error) => detail(error_status(&error), error_detail(&error)),
    }
}

/// Single-shot passthrough translation: success passes the remote
/// payload through, failure becomes a `detail` error. A 200 payload
/// carrying an `error` field is still a business error; the mesh
/// reports some failures that way.
pub fn forwarded(result: CallResult<Value>) -> Response {
    match result {
        Ok(value) => {
            if let Some(message) = embedded_error(&value) {
                return detail(StatusCode::BAD_REQUEST, message);
            }
            Json(value).into_response()
        }
        Err(error) => detail(error_status(&error), error_detail(&error)),
    }
}

/// Mutation translation; same rules as [`forwarded`], named for the
/// write routes.
pub fn mutated(result: CallResult<Value>) -> Response {
    forwarded(result)
}

fn embedded_error(value: &Value) -> Option<String> {
    value
        .get("error")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Empty in the sense the source UI treats as "absent": null, `{}`,
/// `[]`, or `""`.
fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}
