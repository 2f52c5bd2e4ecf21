//! OpenClaw control-panel routes (`/api/openclaw/...`)

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};

use super::auth::{Caller, require_admin};
use super::{AppState, respond, to_body};
use crate::services::OPENCLAW;
use crate::services::openclaw::{
    AuthProfile, ChannelInfo, SendChannelMessageRequest, SkillInfo, default_channels,
    default_skills, tool_catalog,
};

pub(super) const USED_OPERATIONS: &[&str] = &[
    "get_config",
    "update_config",
    "list_channels",
    "get_channel",
    "update_channel",
    "send_channel_message",
    "list_skills",
    "enable_skill",
    "disable_skill",
    "list_agents",
    "get_agent",
    "list_cron_jobs",
    "create_cron_job",
    "delete_cron_job",
    "list_sessions",
    "get_session",
    "list_nodes",
    "tail_logs",
    "list_auth_profiles",
    "get_status",
];

pub(super) fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/openclaw/config", get(get_config).put(update_config))
        .route("/api/openclaw/channels", get(list_channels))
        .route("/api/openclaw/channels/types", get(channel_types))
        .route(
            "/api/openclaw/channels/{channel_id}",
            get(get_channel).put(update_channel),
        )
        .route(
            "/api/openclaw/channels/{channel_id}/send",
            post(send_channel_message),
        )
        .route(
            "/api/openclaw/channels/{channel_id}/history",
            get(channel_history),
        )
        .route("/api/openclaw/skills", get(list_skills))
        .route("/api/openclaw/tools", get(list_tools))
        .route("/api/openclaw/skills/{skill_id}/enable", post(enable_skill))
        .route(
            "/api/openclaw/skills/{skill_id}/disable",
            post(disable_skill),
        )
        .route("/api/openclaw/agents", get(list_agents))
        .route("/api/openclaw/agents/{agent_id}", get(get_agent))
        .route("/api/openclaw/cron", get(list_cron_jobs).post(create_cron_job))
        .route("/api/openclaw/cron/{job_id}", delete(delete_cron_job))
        .route("/api/openclaw/sessions", get(list_sessions))
        .route("/api/openclaw/sessions/{session_id}", get(get_session))
        .route("/api/openclaw/nodes", get(list_nodes))
        .route("/api/openclaw/logs", get(tail_logs))
        .route("/api/openclaw/auth/profiles", get(list_auth_profiles))
        .route("/api/openclaw/auth/status", get(auth_status))
        .route("/api/openclaw/auth/sync", post(sync_auth))
        .route("/api/openclaw/status", get(get_status))
}

// ========== CONFIG ==========

async fn get_config(State(state): State<Arc<AppState>>) -> Response {
    respond::forwarded(state.call(OPENCLAW, "get_config", &[], None).await)
}

async fn update_config(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Json(config): Json<Value>,
) -> Response {
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    respond::mutated(state.call(OPENCLAW, "update_config", &[], Some(&config)).await)
}

// ========== CHANNELS ==========

/// Channels normalized to [`ChannelInfo`], with a default pair shown
/// when the gateway reports none (or is unreachable).
async fn list_channels(State(state): State<Arc<AppState>>) -> Response {
    let channels: Vec<ChannelInfo> = match state.call(OPENCLAW, "list_channels", &[], None).await {
        Ok(Value::Array(items)) => items.iter().map(ChannelInfo::from_value).collect(),
        Ok(other) => {
            tracing::warn!(?other, "Channel listing returned non-array value");
            Vec::new()
        }
        Err(error) => {
            tracing::warn!(%error, "Channel listing failed, using defaults");
            Vec::new()
        }
    };
    let channels = if channels.is_empty() {
        default_channels()
    } else {
        channels
    };
    Json(json!({"object": "list", "data": channels})).into_response()
}

/// Channel types the control panel can configure. Static: the gateway
/// has no discovery endpoint for these.
async fn channel_types() -> Json<Value> {
    Json(json!({
        "types": [
            {"id": "telegram", "name": "Telegram", "icon": "telegram"},
            {"id": "whatsapp", "name": "WhatsApp", "icon": "whatsapp"},
            {"id": "discord", "name": "Discord", "icon": "discord"},
            {"id": "slack", "name": "Slack", "icon": "slack"},
            {"id": "signal", "name": "Signal", "icon": "signal"},
            {"id": "imessage", "name": "iMessage", "icon": "imessage"},
            {"id": "googlechat", "name": "Google Chat", "icon": "google"},
        ]
    }))
}

async fn get_channel(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
) -> Response {
    respond::fetched(
        state
            .call(OPENCLAW, "get_channel", &[("channel_id", &channel_id)], None)
            .await,
        "Channel not found",
    )
}

async fn update_channel(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(channel_id): Path<String>,
    Json(config): Json<Value>,
) -> Response {
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    respond::mutated(
        state
            .call(
                OPENCLAW,
                "update_channel",
                &[("channel_id", &channel_id)],
                Some(&config),
            )
            .await,
    )
}

async fn send_channel_message(
    State(state): State<Arc<AppState>>,
    Path(channel_id): Path<String>,
    Json(request): Json<SendChannelMessageRequest>,
) -> Response {
    let body = to_body(&request);
    respond::mutated(
        state
            .call(
                OPENCLAW,
                "send_channel_message",
                &[("channel_id", &channel_id)],
                Some(&body),
            )
            .await,
    )
}

/// Message history is not stored by the gateway yet; the shape is fixed
/// so the UI can render an empty timeline.
async fn channel_history(Path(channel_id): Path<String>) -> Response {
    Json(json!({"messages": [], "channel": channel_id})).into_response()
}

// ========== SKILLS ==========

/// Skills normalized to [`SkillInfo`], with the default catalog shown
/// when the gateway reports none.
async fn list_skills(State(state): State<Arc<AppState>>) -> Response {
    let skills: Vec<SkillInfo> = match state.call(OPENCLAW, "list_skills", &[], None).await {
        Ok(Value::Array(items)) => items.iter().map(SkillInfo::from_value).collect(),
        Ok(other) => {
            tracing::warn!(?other, "Skill listing returned non-array value");
            Vec::new()
        }
        Err(error) => {
            tracing::warn!(%error, "Skill listing failed, using defaults");
            Vec::new()
        }
    };
    let skills = if skills.is_empty() {
        default_skills()
    } else {
        skills
    };
    Json(json!({"object": "list", "data": skills})).into_response()
}

async fn list_tools() -> Response {
    Json(json!({"object": "list", "data": tool_catalog()})).into_response()
}

async fn enable_skill(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(skill_id): Path<String>,
) -> Response {
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    respond::mutated(
        state
            .call(OPENCLAW, "enable_skill", &[("skill_id", &skill_id)], None)
            .await,
    )
}

async fn disable_skill(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(skill_id): Path<String>,
) -> Response {
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    respond::mutated(
        state
            .call(OPENCLAW, "disable_skill", &[("skill_id", &skill_id)], None)
            .await,
    )
}

// ========== AGENTS ==========

async fn list_agents(State(state): State<Arc<AppState>>) -> Response {
    respond::listing(
        "list_agents",
        state.call(OPENCLAW, "list_agents", &[], None).await,
    )
}

async fn get_agent(State(state): State<Arc<AppState>>, Path(agent_id): Path<String>) -> Response {
    respond::fetched(
        state
            .call(OPENCLAW, "get_agent", &[("agent_id", &agent_id)], None)
            .await,
        "Agent not found",
    )
}

// ========== CRON JOBS ==========

async fn list_cron_jobs(State(state): State<Arc<AppState>>) -> Response {
    respond::listing(
        "list_cron_jobs",
        state.call(OPENCLAW, "list_cron_jobs", &[], None).await,
    )
}

async fn create_cron_job(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Json(job): Json<Value>,
) -> Response {
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    respond::mutated(state.call(OPENCLAW, "create_cron_job", &[], Some(&job)).await)
}

async fn delete_cron_job(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Path(job_id): Path<String>,
) -> Response {
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    respond::mutated(
        state
            .call(OPENCLAW, "delete_cron_job", &[("job_id", &job_id)], None)
            .await,
    )
}

// ========== SESSIONS ==========

async fn list_sessions(State(state): State<Arc<AppState>>) -> Response {
    respond::listing(
        "list_sessions",
        state.call(OPENCLAW, "list_sessions", &[], None).await,
    )
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Response {
    respond::fetched(
        state
            .call(OPENCLAW, "get_session", &[("session_id", &session_id)], None)
            .await,
        "Session not found",
    )
}

// ========== NODES ==========

async fn list_nodes(State(state): State<Arc<AppState>>) -> Response {
    respond::listing(
        "list_nodes",
        state.call(OPENCLAW, "list_nodes", &[], None).await,
    )
}

// ========== LOGS ==========

#[derive(Debug, Deserialize)]
struct LogsQuery {
    #[serde(default = "default_log_limit")]
    limit: u32,
}

fn default_log_limit() -> u32 {
    100
}

async fn tail_logs(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
    Query(query): Query<LogsQuery>,
) -> Response {
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    let limit = query.limit.to_string();
    respond::listing(
        "tail_logs",
        state
            .call(OPENCLAW, "tail_logs", &[("limit", &limit)], None)
            .await,
    )
}

// ========== AUTH PROFILES ==========

/// Profiles held by the gateway, normalized from its keyed map. Empty
/// when the gateway is unreachable.
async fn fetch_auth_profiles(state: &AppState) -> Vec<AuthProfile> {
    match state.call(OPENCLAW, "list_auth_profiles", &[], None).await {
        Ok(Value::Object(map)) => map
            .iter()
            .map(|(id, data)| AuthProfile::from_entry(id, data))
            .collect(),
        Ok(_) => Vec::new(),
        Err(error) => {
            tracing::warn!(%error, "Failed to fetch auth profiles");
            Vec::new()
        }
    }
}

async fn list_auth_profiles(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Response {
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    Json(fetch_auth_profiles(&state).await).into_response()
}

async fn auth_status(State(state): State<Arc<AppState>>) -> Response {
    let connected = state
        .call(OPENCLAW, "get_status", &[], None)
        .await
        .ok()
        .and_then(|status| status.get("connected").and_then(Value::as_bool))
        .unwrap_or(false);
    let gateway_url = state
        .clients
        .get(OPENCLAW)
        .map(|c| c.base_url().to_string())
        .unwrap_or_default();
    let profiles = fetch_auth_profiles(&state).await;

    Json(json!({
        "connected": connected,
        "gateway_url": gateway_url,
        "profiles_count": profiles.len(),
    }))
    .into_response()
}

async fn sync_auth(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<Caller>,
) -> Response {
    if let Err(response) = require_admin(&caller) {
        return response;
    }
    let synced: Vec<Value> = fetch_auth_profiles(&state)
        .await
        .into_iter()
        .map(|p| json!({"id": p.id, "provider": p.provider, "mode": p.mode}))
        .collect();

    Json(json!({"synced": synced.len(), "profiles": synced})).into_response()
}

// ========== STATUS ==========

async fn get_status(State(state): State<Arc<AppState>>) -> Response {
    match state.call(OPENCLAW, "get_status", &[], None).await {
        Ok(value) => Json(value).into_response(),
        Err(_) => Json(json!({"connected": false, "error": "Cannot connect"})).into_response(),
    }
}
