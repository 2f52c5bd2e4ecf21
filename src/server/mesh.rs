//! Agent Mesh routes (`/api/mesh/...`)

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, State},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;

use super::auth::{Caller, require_admin};
use super::{AppState, respond, to_body};
use crate::services::MESH;
use crate::services::mesh::{
    AcknowledgeUpdateRequest, CreateUpdateRequest, HealthMetrics, RegisterAgentRequest,
    ReportIncidentRequest, SendMessageRequest, UpdateAgentRequest, UploadFileRequest,
};

/// Operations these routes dispatch; verified against the registry at
/// startup.
pub(super) const USED_OPERATIONS: &[&str] = &[
    "list_agents",
    "register_agent",
    "get_agent",
    "update_agent",
    "delete_agent",
    "send_message",
    "list_messages",
    "agent_messages",
    "agent_inbox",
    "delete_message",
    "upload_file",
    "list_files",
    "get_file",
    "delete_file",
    "report_health",
    "get_agent_health",
    "health_dashboard",
    "list_updates",
    "create_update",
    "acknowledge_update",
    "report_incident",
    "recovery_protocols",
];

pub(super) fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/mesh/agents", get(list_agents))
        .route("/api/mesh/agents/register", post(register_agent))
        .route(
            "/api/mesh/agents/{agent_id}",
            get(get_agent).put(update_agent).delete(delete_agent),
        )
        .route("/api/mesh/messages", get(list_messages).post(send_message))
        .route("/api/mesh/agents/{agent_id}/messages", get(agent_messages))
        .route("/api/mesh/agents/{agent_id}/inbox", get(agent_inbox))
        .route("/api/mesh/messages/{message_id}", axum::routing::delete(delete_message))
        .route("/api/mesh/files", get(list_files).post(upload_file))
        .route(
            "/api/mesh/files/{file_id}",
            get(get_file).delete(delete_file),
        )
        .route(
            "/api/mesh/agents/{agent_id}/health",
            get(get_agent_health).post(report_health),
        )
        .route("/api/mesh/health/dashboard", get(health_dashboard))
        .route("/api/mesh/updates", get(list_updates).post(create_update))
        .route(
            "/api/mesh/updates/{update_id}/acknowledge",
            post(acknowledge_update),
        )
        .route("/api/mesh/incidents", post(report_incident))
        .route("/api/mesh/incidents/protocols", get(recovery_protocols))
        .route("/api/mesh/status", get(mesh_status))
}

// ========== AGENT LIFECYCLE ==========

async fn list_agents(State(state): State<Arc<AppState>>) -> Response {
    respond::listing("list_agents", state.call(MESH, "list_agents", &[], None).await)
}

async fn register_agent(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<RegisterAgentRequest>,
) -> Response {
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    let body = to_body(&request);
    respond::mutated(state.call(MESH, "register_agent", &[], Some(&body)).await)
}

async fn get_agent(State(state): State<Arc<AppState>>, Path(agent_id): Path<String>) -> Response {
    respond::fetched(
        state
            .call(MESH, "get_agent", &[("agent_id", &agent_id)], None)
            .await,
        "Agent not found",
    )
}

async fn update_agent(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(agent_id): Path<String>,
    Json(request): Json<UpdateAgentRequest>,
) -> Response {
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    let body = to_body(&request);
    respond::mutated(
        state
            .call(MESH, "update_agent", &[("agent_id", &agent_id)], Some(&body))
            .await,
    )
}

async fn delete_agent(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(agent_id): Path<String>,
) -> Response {
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    respond::mutated(
        state
            .call(MESH, "delete_agent", &[("agent_id", &agent_id)], None)
            .await,
    )
}

// ========== MESSAGING ==========

async fn list_messages(State(state): State<Arc<AppState>>) -> Response {
    respond::listing(
        "list_messages",
        state.call(MESH, "list_messages", &[], None).await,
    )
}

async fn send_message(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SendMessageRequest>,
) -> Response {
    let body = to_body(&request);
    respond::mutated(state.call(MESH, "send_message", &[], Some(&body)).await)
}

async fn agent_messages(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> Response {
    respond::listing(
        "agent_messages",
        state
            .call(MESH, "agent_messages", &[("agent_id", &agent_id)], None)
            .await,
    )
}

async fn agent_inbox(State(state): State<Arc<AppState>>, Path(agent_id): Path<String>) -> Response {
    respond::listing(
        "agent_inbox",
        state
            .call(MESH, "agent_inbox", &[("agent_id", &agent_id)], None)
            .await,
    )
}

async fn delete_message(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(message_id): Path<String>,
) -> Response {
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    respond::mutated(
        state
            .call(MESH, "delete_message", &[("message_id", &message_id)], None)
            .await,
    )
}

// ========== FILE TRANSFER ==========

async fn list_files(State(state): State<Arc<AppState>>) -> Response {
    respond::listing("list_files", state.call(MESH, "list_files", &[], None).await)
}

async fn upload_file(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UploadFileRequest>,
) -> Response {
    let body = to_body(&request);
    respond::mutated(state.call(MESH, "upload_file", &[], Some(&body)).await)
}

async fn get_file(State(state): State<Arc<AppState>>, Path(file_id): Path<String>) -> Response {
    respond::fetched(
        state
            .call(MESH, "get_file", &[("file_id", &file_id)], None)
            .await,
        "File not found",
    )
}

async fn delete_file(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(file_id): Path<String>,
) -> Response {
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    respond::mutated(
        state
            .call(MESH, "delete_file", &[("file_id", &file_id)], None)
            .await,
    )
}

// ========== HEALTH MONITORING ==========

async fn report_health(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
    Json(metrics): Json<HealthMetrics>,
) -> Response {
    let body = to_body(&metrics);
    respond::mutated(
        state
            .call(MESH, "report_health", &[("agent_id", &agent_id)], Some(&body))
            .await,
    )
}

async fn get_agent_health(
    State(state): State<Arc<AppState>>,
    Path(agent_id): Path<String>,
) -> Response {
    respond::fetched(
        state
            .call(MESH, "get_agent_health", &[("agent_id", &agent_id)], None)
            .await,
        "Health data not found",
    )
}

async fn health_dashboard(State(state): State<Arc<AppState>>) -> Response {
    respond::forwarded(state.call(MESH, "health_dashboard", &[], None).await)
}

// ========== SYSTEM UPDATES ==========

async fn list_updates(State(state): State<Arc<AppState>>) -> Response {
    respond::listing(
        "list_updates",
        state.call(MESH, "list_updates", &[], None).await,
    )
}

async fn create_update(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<CreateUpdateRequest>,
) -> Response {
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    let body = to_body(&request);
    respond::mutated(state.call(MESH, "create_update", &[], Some(&body)).await)
}

async fn acknowledge_update(
    State(state): State<Arc<AppState>>,
    Path(update_id): Path<String>,
    Json(request): Json<AcknowledgeUpdateRequest>,
) -> Response {
    let body = to_body(&request);
    respond::mutated(
        state
            .call(
                MESH,
                "acknowledge_update",
                &[("update_id", &update_id)],
                Some(&body),
            )
            .await,
    )
}

// ========== INCIDENT REPORTING ==========

async fn report_incident(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Json(request): Json<ReportIncidentRequest>,
) -> Response {
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    let body = to_body(&request);
    respond::mutated(state.call(MESH, "report_incident", &[], Some(&body)).await)
}

async fn recovery_protocols(State(state): State<Arc<AppState>>) -> Response {
    respond::forwarded(state.call(MESH, "recovery_protocols", &[], None).await)
}

// ========== STATUS ==========

/// Connection probe: lists agents and summarizes reachability.
async fn mesh_status(State(state): State<Arc<AppState>>) -> Response {
    let mesh_url = state
        .clients
        .get(MESH)
        .map(|c| c.base_url().to_string())
        .unwrap_or_default();

    match state.call(MESH, "list_agents", &[], None).await {
        Ok(serde_json::Value::Array(agents)) => Json(json!({
            "connected": true,
            "agents_count": agents.len(),
            "mesh_url": mesh_url,
        }))
        .into_response(),
        _ => Json(json!({
            "connected": false,
            "error": "Cannot connect to Agent Mesh",
        }))
        .into_response(),
    }
}
