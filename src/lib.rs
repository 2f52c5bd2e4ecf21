//! mesh-bridge Library
//!
//! REST bridge that re-exposes the Agent Mesh coordination service and
//! the OpenClaw control gateway to a web UI platform. Every route is a
//! 1:1 passthrough built on a small gateway-client framework:
//!
//! - **Gateway Client**: one `reqwest` client per remote service with a
//!   single generic `call`, normalizing every outcome into a value
//! - **Operation Registry**: declarative per-service operation tables
//!   instead of hand-written per-endpoint methods
//! - **Route Dispatcher**: axum routers that validate input, check
//!   caller capability, and translate call results into HTTP responses
//! - **Client Registry**: one lazily built client per service with a
//!   single-initialization guarantee

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod gateway;
pub mod server;
pub mod services;

pub use error::{Error, Result};

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Setup tracing/logging
pub fn setup_tracing(level: &str, format: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        Some("json") => {
            subscriber.with(fmt::layer().json()).init();
        }
        _ => {
            subscriber.with(fmt::layer()).init();
        }
    }

    Ok(())
}
