//! End-to-end bridge tests
//!
//! Each test builds the real router over stub remote services bound to
//! ephemeral ports, then drives it in-process with `oneshot`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Json, Router,
    body::Body,
    extract::Query,
    http::{Request, StatusCode},
    routing::{get, post},
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tower::ServiceExt;

use mesh_bridge::config::Config;
use mesh_bridge::server::{AppState, create_router};

/// Bind a stub remote on an ephemeral port and serve it in the
/// background for the rest of the test.
async fn spawn_stub(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// An address nothing listens on, for transport-failure tests.
async fn dead_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

fn bridge_config(mesh: SocketAddr, openclaw: SocketAddr) -> Config {
    let mut config = Config::seed();
    config.mesh.base_url = format!("http://{mesh}");
    config.openclaw.base_url = format!("http://{openclaw}");
    config
}

fn bridge_app(config: &Config) -> Router {
    create_router(AppState::new(config).unwrap())
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    role: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(role) = role {
        builder = builder
            .header("x-bridge-user", "tester")
            .header("x-bridge-role", role);
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&value).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).to_string(),
        ))
    };
    (status, value)
}

#[tokio::test]
async fn health_endpoint_is_public() {
    let config = bridge_config(dead_addr().await, dead_addr().await);
    let app = bridge_app(&config);

    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn missing_identity_is_rejected() {
    let config = bridge_config(dead_addr().await, dead_addr().await);
    let app = bridge_app(&config);

    let (status, body) = send(&app, "GET", "/api/mesh/agents", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Not authenticated");
}

#[tokio::test]
async fn non_admin_cannot_register_agents() {
    let config = bridge_config(dead_addr().await, dead_addr().await);
    let app = bridge_app(&config);

    let (status, body) = send(
        &app,
        "POST",
        "/api/mesh/agents/register",
        Some("user"),
        Some(json!({"name": "scout", "endpoint": "http://scout:9000", "capabilities": []})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Admin privileges required");
}

#[tokio::test]
async fn register_agent_passes_remote_echo_through() {
    let echo = json!({
        "id": "a1",
        "name": "scout",
        "endpoint": "http://scout:9000",
        "capabilities": ["search"]
    });
    let echo_clone = echo.clone();
    let stub = Router::new().route(
        "/api/agents/register",
        post(move || {
            let echo = echo_clone.clone();
            async move { Json(echo) }
        }),
    );
    let config = bridge_config(spawn_stub(stub).await, dead_addr().await);
    let app = bridge_app(&config);

    let (status, body) = send(
        &app,
        "POST",
        "/api/mesh/agents/register",
        Some("admin"),
        Some(json!({
            "name": "scout",
            "endpoint": "http://scout:9000",
            "capabilities": ["search"]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, echo);
}

#[tokio::test]
async fn get_missing_agent_returns_not_found() {
    let stub = Router::new().route("/api/agents/{agent_id}", get(|| async { Json(json!({})) }));
    let config = bridge_config(spawn_stub(stub).await, dead_addr().await);
    let app = bridge_app(&config);

    let (status, body) = send(&app, "GET", "/api/mesh/agents/missing", Some("user"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Agent not found");
}

#[tokio::test]
async fn get_present_agent_returns_it() {
    let stub = Router::new().route(
        "/api/agents/{agent_id}",
        get(|| async { Json(json!({"id": "a1", "name": "scout"})) }),
    );
    let config = bridge_config(spawn_stub(stub).await, dead_addr().await);
    let app = bridge_app(&config);

    let (status, body) = send(&app, "GET", "/api/mesh/agents/a1", Some("user"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "scout");
}

#[tokio::test]
async fn remote_error_becomes_bad_request_with_detail() {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = Arc::clone(&hits);
    let stub = Router::new().route(
        "/api/messages",
        post(move || {
            let hits = Arc::clone(&hits_clone);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (StatusCode::INTERNAL_SERVER_ERROR, "mesh overloaded")
            }
        }),
    );
    let config = bridge_config(spawn_stub(stub).await, dead_addr().await);
    let app = bridge_app(&config);

    let (status, body) = send(
        &app,
        "POST",
        "/api/mesh/messages",
        Some("user"),
        Some(json!({"from_agent_id": "a1", "to_agent_id": "a2", "message": "hi"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "mesh overloaded");
    // Exactly one outbound attempt: no silent retries
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn malformed_body_is_rejected_before_dispatch() {
    let hits = Arc::new(AtomicUsize::new(0));
    let hits_clone = Arc::clone(&hits);
    let stub = Router::new().route(
        "/api/messages",
        post(move || {
            let hits = Arc::clone(&hits_clone);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                Json(json!({}))
            }
        }),
    );
    let config = bridge_config(spawn_stub(stub).await, dead_addr().await);
    let app = bridge_app(&config);

    let (status, _) = send(
        &app,
        "POST",
        "/api/mesh/messages",
        Some("user"),
        Some(json!({"from_agent_id": "a1"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(hits.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn list_endpoints_accept_both_collection_shapes() {
    let mesh_stub =
        Router::new().route("/api/agents", get(|| async { Json(json!([{"id": "a1"}])) }));
    let claw_stub = Router::new().route(
        "/api/channels",
        get(|| async { Json(json!({"data": [{"id": "c1"}]})) }),
    );
    let config = bridge_config(spawn_stub(mesh_stub).await, spawn_stub(claw_stub).await);
    let app = bridge_app(&config);

    let (status, body) = send(&app, "GET", "/api/mesh/agents", Some("user"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"object": "list", "data": [{"id": "a1"}]}));

    let (status, body) = send(&app, "GET", "/api/openclaw/channels", Some("user"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["object"], "list");
    assert_eq!(body["data"][0]["id"], "c1");
    assert_eq!(body["data"][0]["status"], "unknown");
}

#[tokio::test]
async fn unreachable_remote_yields_empty_list() {
    let config = bridge_config(dead_addr().await, dead_addr().await);
    let app = bridge_app(&config);

    let (status, body) = send(&app, "GET", "/api/mesh/messages", Some("user"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"object": "list", "data": []}));
}

#[tokio::test]
async fn unreachable_remote_fails_mutations() {
    let config = bridge_config(dead_addr().await, dead_addr().await);
    let app = bridge_app(&config);

    let (status, body) = send(
        &app,
        "POST",
        "/api/mesh/messages",
        Some("user"),
        Some(json!({"from_agent_id": "a1", "to_agent_id": "a2", "message": "hi"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn mesh_status_reports_connectivity() {
    let stub = Router::new().route(
        "/api/agents",
        get(|| async { Json(json!([{"id": "a1"}, {"id": "a2"}])) }),
    );
    let config = bridge_config(spawn_stub(stub).await, dead_addr().await);
    let app = bridge_app(&config);

    let (status, body) = send(&app, "GET", "/api/mesh/status", Some("user"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], true);
    assert_eq!(body["agents_count"], 2);

    let config = bridge_config(dead_addr().await, dead_addr().await);
    let app = bridge_app(&config);
    let (_, body) = send(&app, "GET", "/api/mesh/status", Some("user"), None).await;
    assert_eq!(body["connected"], false);
}

#[tokio::test]
async fn credential_header_is_attached() {
    let seen = Arc::new(Mutex::new(None::<String>));
    let seen_clone = Arc::clone(&seen);
    let stub = Router::new().route(
        "/api/agents",
        get(move |headers: axum::http::HeaderMap| {
            let seen = Arc::clone(&seen_clone);
            async move {
                let key = headers
                    .get("x-api-key")
                    .and_then(|v| v.to_str().ok())
                    .map(String::from);
                *seen.lock().await = key;
                Json(json!([]))
            }
        }),
    );
    let config = bridge_config(spawn_stub(stub).await, dead_addr().await);
    let app = bridge_app(&config);

    send(&app, "GET", "/api/mesh/agents", Some("user"), None).await;
    assert_eq!(
        seen.lock().await.as_deref(),
        Some("openclaw-mesh-default-key")
    );
}

#[tokio::test]
async fn chat_completion_strips_model_prefix() {
    let captured = Arc::new(Mutex::new(None::<Value>));
    let captured_clone = Arc::clone(&captured);
    let stub = Router::new().route(
        "/v1/chat/completions",
        post(move |Json(body): Json<Value>| {
            let captured = Arc::clone(&captured_clone);
            async move {
                *captured.lock().await = Some(body);
                Json(json!({"id": "cmpl-1", "choices": []}))
            }
        }),
    );
    let config = bridge_config(dead_addr().await, spawn_stub(stub).await);
    let app = bridge_app(&config);

    let (status, body) = send(
        &app,
        "POST",
        "/v1/chat/completions",
        Some("user"),
        Some(json!({
            "model": "openclaw:gpt-5.2",
            "messages": [{"role": "user", "content": "hi"}],
            "temperature": 0.1
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "cmpl-1");

    let forwarded = captured.lock().await.clone().unwrap();
    assert_eq!(forwarded["model"], "gpt-5.2");
    assert_eq!(forwarded["messages"][0]["content"], "hi");
    assert_eq!(forwarded["temperature"], 0.1);
}

#[tokio::test]
async fn streaming_chat_forwards_bytes_unmodified() {
    let stub = Router::new().route(
        "/v1/chat/completions",
        post(|| async {
            (
                [("content-type", "text/event-stream")],
                "data: {\"delta\": \"hel\"}\n\ndata: [DONE]\n\n",
            )
        }),
    );
    let config = bridge_config(dead_addr().await, spawn_stub(stub).await);
    let app = bridge_app(&config);

    let (status, body) = send(
        &app,
        "POST",
        "/v1/chat/completions",
        Some("user"),
        Some(json!({
            "model": "openclaw:gpt-5.2",
            "messages": [],
            "stream": true
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let text = body.as_str().unwrap();
    assert!(text.contains("data: {\"delta\": \"hel\"}"));
    assert!(text.contains("[DONE]"));
}

#[tokio::test]
async fn models_fall_back_when_gateway_is_down() {
    let config = bridge_config(dead_addr().await, dead_addr().await);
    let app = bridge_app(&config);

    let (status, body) = send(&app, "GET", "/v1/models", Some("user"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["object"], "list");
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    assert_eq!(data[0]["id"], "openclaw:gpt-5.2");
}

#[tokio::test]
async fn log_tail_defaults_limit_and_requires_admin() {
    let seen_limit = Arc::new(Mutex::new(None::<String>));
    let seen_clone = Arc::clone(&seen_limit);
    let stub = Router::new().route(
        "/api/logs",
        get(
            move |Query(params): Query<std::collections::HashMap<String, String>>| {
                let seen = Arc::clone(&seen_clone);
                async move {
                    *seen.lock().await = params.get("limit").cloned();
                    Json(json!({"data": [{"line": "ready"}]}))
                }
            },
        ),
    );
    let config = bridge_config(dead_addr().await, spawn_stub(stub).await);
    let app = bridge_app(&config);

    let (status, _) = send(&app, "GET", "/api/openclaw/logs", Some("user"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", "/api/openclaw/logs", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["line"], "ready");
    assert_eq!(seen_limit.lock().await.as_deref(), Some("100"));

    send(
        &app,
        "GET",
        "/api/openclaw/logs?limit=5",
        Some("admin"),
        None,
    )
    .await;
    assert_eq!(seen_limit.lock().await.as_deref(), Some("5"));
}

#[tokio::test]
async fn channels_and_skills_fall_back_to_defaults_when_gateway_is_down() {
    let config = bridge_config(dead_addr().await, dead_addr().await);
    let app = bridge_app(&config);

    let (status, body) = send(&app, "GET", "/api/openclaw/channels", Some("user"), None).await;
    assert_eq!(status, StatusCode::OK);
    let channels = body["data"].as_array().unwrap();
    assert_eq!(channels.len(), 2);
    assert_eq!(channels[0]["id"], "telegram");
    assert_eq!(channels[0]["type"], "telegram");
    assert_eq!(channels[0]["capabilities"], json!(["text", "media", "buttons"]));
    assert_eq!(channels[1]["id"], "whatsapp");

    let (status, body) = send(&app, "GET", "/api/openclaw/skills", Some("user"), None).await;
    assert_eq!(status, StatusCode::OK);
    let skills = body["data"].as_array().unwrap();
    assert_eq!(skills.len(), 4);
    assert_eq!(skills[0]["id"], "web-search");
    assert_eq!(skills[0]["enabled"], true);
}

#[tokio::test]
async fn tool_catalog_is_served_without_gateway() {
    let config = bridge_config(dead_addr().await, dead_addr().await);
    let app = bridge_app(&config);

    let (status, body) = send(&app, "GET", "/api/openclaw/tools", Some("user"), None).await;
    assert_eq!(status, StatusCode::OK);
    let tools = body["data"].as_array().unwrap();
    assert_eq!(tools.len(), 6);
    assert_eq!(tools[0]["id"], "browser");
    assert_eq!(tools[1]["category"], "system");
}

#[tokio::test]
async fn channel_send_surfaces_embedded_error() {
    let stub = Router::new().route(
        "/api/channels/{channel_id}/send",
        post(|Json(body): Json<Value>| async move {
            if body["to"] == "nobody" {
                Json(json!({"error": "recipient unknown"}))
            } else {
                Json(json!({"sent": true}))
            }
        }),
    );
    let config = bridge_config(dead_addr().await, spawn_stub(stub).await);
    let app = bridge_app(&config);

    let (status, body) = send(
        &app,
        "POST",
        "/api/openclaw/channels/telegram/send",
        Some("user"),
        Some(json!({"message": "hi", "to": "nobody"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "recipient unknown");

    let (status, body) = send(
        &app,
        "POST",
        "/api/openclaw/channels/telegram/send",
        Some("user"),
        Some(json!({"message": "hi", "to": "ops"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sent"], true);
}

#[tokio::test]
async fn channel_history_is_an_empty_timeline() {
    let config = bridge_config(dead_addr().await, dead_addr().await);
    let app = bridge_app(&config);

    let (status, body) = send(
        &app,
        "GET",
        "/api/openclaw/channels/telegram/history",
        Some("user"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"messages": [], "channel": "telegram"}));
}

#[tokio::test]
async fn auth_routes_normalize_the_profile_map() {
    let stub = Router::new()
        .route("/api/status", get(|| async { Json(json!({"connected": true})) }))
        .route(
            "/api/auth/profiles",
            get(|| async {
                Json(json!({
                    "p1": {"provider": "anthropic", "mode": "oauth", "email": "ops@example.com"},
                    "p2": {"provider": "openai", "mode": "api_key"}
                }))
            }),
        );
    let config = bridge_config(dead_addr().await, spawn_stub(stub).await);
    let app = bridge_app(&config);

    let (status, _) = send(&app, "GET", "/api/openclaw/auth/profiles", Some("user"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app, "GET", "/api/openclaw/auth/profiles", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    let profiles = body.as_array().unwrap();
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[0]["id"], "p1");
    assert_eq!(profiles[0]["mode"], "oauth");
    assert!(profiles[1].get("email").is_none());

    let (status, body) = send(&app, "GET", "/api/openclaw/auth/status", Some("user"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["connected"], true);
    assert_eq!(body["profiles_count"], 2);

    let (status, body) = send(&app, "POST", "/api/openclaw/auth/sync", Some("admin"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["synced"], 2);
    assert_eq!(body["profiles"][1]["provider"], "openai");
}

#[tokio::test]
async fn skill_toggle_requires_admin_and_forwards() {
    let stub = Router::new().route(
        "/api/skills/{skill_id}/enable",
        post(|| async { Json(json!({"id": "s1", "enabled": true})) }),
    );
    let config = bridge_config(dead_addr().await, spawn_stub(stub).await);
    let app = bridge_app(&config);

    let (status, _) = send(
        &app,
        "POST",
        "/api/openclaw/skills/s1/enable",
        Some("user"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        "POST",
        "/api/openclaw/skills/s1/enable",
        Some("admin"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["enabled"], true);
}

#[tokio::test]
async fn incident_severity_is_validated_before_dispatch() {
    let config = bridge_config(dead_addr().await, dead_addr().await);
    let app = bridge_app(&config);

    let (status, _) = send(
        &app,
        "POST",
        "/api/mesh/incidents",
        Some("admin"),
        Some(json!({
            "severity": "apocalyptic",
            "description": "bad",
            "agent_id": "a1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn incident_report_reaches_remote_in_wire_shape() {
    let captured = Arc::new(Mutex::new(None::<Value>));
    let captured_clone = Arc::clone(&captured);
    let stub = Router::new().route(
        "/api/catastrophe",
        post(move |Json(body): Json<Value>| {
            let captured = Arc::clone(&captured_clone);
            async move {
                *captured.lock().await = Some(body);
                Json(json!({"acknowledged": true}))
            }
        }),
    );
    let config = bridge_config(spawn_stub(stub).await, dead_addr().await);
    let app = bridge_app(&config);

    let (status, _) = send(
        &app,
        "POST",
        "/api/mesh/incidents",
        Some("admin"),
        Some(json!({
            "severity": "critical",
            "description": "node down",
            "agent_id": "a1"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let forwarded = captured.lock().await.clone().unwrap();
    assert_eq!(forwarded["severity"], "critical");
    assert_eq!(forwarded["agentId"], "a1");
    assert!(forwarded.get("agent_id").is_none());
}
