//! HTTP server: state, router assembly, and the serve loop

pub mod auth;
mod chat;
mod mesh;
mod openclaw;
pub mod respond;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{catch_panic::CatchPanicLayer, cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use crate::config::Config;
use crate::gateway::{CallError, CallResult, ClientRegistry, OperationRegistry};
use crate::services::{MESH, OPENCLAW};
use crate::{Error, Result};

/// Shared application state: one client registry and one operation
/// registry, threaded explicitly into every handler.
pub struct AppState {
    /// Per-service gateway clients
    pub clients: ClientRegistry,
    /// Declarative operation tables
    pub ops: OperationRegistry,
}

impl AppState {
    /// Build state from configuration. Registers both service tables
    /// and verifies every operation the routes reference, so registry
    /// misuse aborts startup instead of surfacing per-request.
    pub fn new(config: &Config) -> Result<Arc<Self>> {
        let mut ops = OperationRegistry::new();
        ops.register_service(MESH, crate::services::mesh::operations())?;
        ops.register_service(OPENCLAW, crate::services::openclaw::operations())?;

        let clients = ClientRegistry::new([
            (MESH.to_string(), config.mesh.clone()),
            (OPENCLAW.to_string(), config.openclaw.clone()),
        ]);

        let state = Self { clients, ops };
        state.verify_route_operations()?;
        Ok(Arc::new(state))
    }

    /// Resolve and invoke one operation. Registry misses are mapped to
    /// caller errors; startup verification makes them unreachable.
    pub async fn call(
        &self,
        service: &str,
        operation: &str,
        params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> CallResult<Value> {
        let client = self
            .clients
            .get(service)
            .map_err(|e| CallError::caller(e.to_string()))?;
        let op = self
            .ops
            .resolve(service, operation)
            .map_err(|e| CallError::caller(e.to_string()))?;
        client.call(op, params, body).await
    }

    fn verify_route_operations(&self) -> Result<()> {
        for (service, used) in [
            (MESH, mesh::USED_OPERATIONS),
            (OPENCLAW, openclaw::USED_OPERATIONS),
            (OPENCLAW, chat::USED_OPERATIONS),
        ] {
            for name in used {
                self.ops.resolve(service, name)?;
            }
        }
        Ok(())
    }
}

/// Assemble the full router. `/health` is public; everything else goes
/// through the identity middleware.
pub fn create_router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .merge(mesh::router())
        .merge(openclaw::router())
        .merge(chat::router())
        .layer(middleware::from_fn(auth::identity_middleware));

    Router::new()
        .route("/health", get(health_handler))
        .merge(protected)
        .layer(CatchPanicLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Liveness endpoint. Reports the bridge itself, not the remotes; the
/// per-service status routes probe those.
async fn health_handler() -> axum::Json<Value> {
    axum::Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Run the bridge until shutdown.
pub async fn serve(config: Config) -> Result<()> {
    let addr = SocketAddr::new(
        config
            .server
            .host
            .parse()
            .map_err(|e| Error::Config(format!("Invalid host: {e}")))?,
        config.server.port,
    );

    let state = AppState::new(&config)?;
    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(host = %config.server.host, port = config.server.port, "mesh-bridge listening");
    info!(mesh = %config.mesh.base_url, openclaw = %config.openclaw.base_url, "Bridged services");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Internal(e.to_string()))?;

    Ok(())
}

/// Shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received");
}

/// Serialize a typed request body for dispatch.
fn to_body<T: serde::Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}
