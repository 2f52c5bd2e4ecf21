//! OpenAI-compatible model surface (`/v1/...`)
//!
//! Lists the gateway's models in OpenAI shape and proxies chat
//! completions through it. The passthrough never touches message
//! content; the only rewrite is stripping the `openclaw:` prefix from
//! the model id.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use reqwest::Method;
use serde_json::{Value, json};
use tracing::warn;

use super::{AppState, respond};
use crate::services::OPENCLAW;
use crate::services::openclaw::{ChatCompletionRequest, OpenAiModel, default_models};

pub(super) const USED_OPERATIONS: &[&str] = &["list_models", "chat_completions"];

pub(super) fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/models", get(list_models))
        .route("/v1/models/{model_id}", get(get_model))
        .route("/v1/chat/completions", post(chat_completions))
}

/// Fetch models from the gateway and convert to OpenAI shape. Falls
/// back to a static default set when the gateway is unreachable, so the
/// UI still renders a model picker.
async fn fetch_models(state: &AppState) -> Vec<OpenAiModel> {
    let models = match state.call(OPENCLAW, "list_models", &[], None).await {
        Ok(Value::Array(items)) => items
            .iter()
            .map(|m| {
                let id = m
                    .get("id")
                    .or_else(|| m.get("name"))
                    .and_then(Value::as_str)
                    .unwrap_or("unknown");
                let root = m.get("id").and_then(Value::as_str).unwrap_or("");
                let owned_by = m
                    .get("provider")
                    .and_then(Value::as_str)
                    .unwrap_or("openclaw");
                OpenAiModel::new(id, root, owned_by)
            })
            .collect(),
        Ok(_) => Vec::new(),
        Err(error) => {
            warn!(%error, "Failed to fetch models from gateway");
            Vec::new()
        }
    };

    if models.is_empty() {
        default_models()
    } else {
        models
    }
}

async fn list_models(State(state): State<Arc<AppState>>) -> Response {
    let models = fetch_models(&state).await;
    Json(json!({"object": "list", "data": models})).into_response()
}

async fn get_model(
    State(state): State<Arc<AppState>>,
    Path(model_id): Path<String>,
) -> Response {
    let models = fetch_models(&state).await;
    let model = models
        .into_iter()
        .find(|m| m.id == model_id || m.root == model_id)
        .unwrap_or_else(|| OpenAiModel::new(model_id.clone(), model_id, "openclaw"));
    Json(model).into_response()
}

/// Chat completion passthrough. Buffered JSON when `stream` is false;
/// an unmodified byte-stream forward when it is true.
async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ChatCompletionRequest>,
) -> Response {
    let body = request.forward_body();

    if !request.stream {
        return respond::forwarded(
            state
                .call(OPENCLAW, "chat_completions", &[], Some(&body))
                .await,
        );
    }

    let client = match state.clients.get(OPENCLAW) {
        Ok(client) => client,
        Err(e) => return respond::detail(StatusCode::BAD_REQUEST, e.to_string()),
    };

    let upstream = match client
        .send(Method::POST, "/v1/chat/completions", Some(&body))
        .await
    {
        Ok(response) => response,
        Err(error) => return respond::detail(StatusCode::BAD_REQUEST, error.to_string()),
    };

    let status = StatusCode::from_u16(upstream.status().as_u16())
        .unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("text/event-stream")
        .to_string();

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from_stream(upstream.bytes_stream()))
        .unwrap_or_else(|e| {
            respond::detail(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to build streaming response: {e}"),
            )
        })
}
