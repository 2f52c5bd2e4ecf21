//! Configuration management

use std::env;
use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Main configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Server configuration
    pub server: ServerConfig,
    /// Agent Mesh service configuration
    pub mesh: ServiceConfig,
    /// OpenClaw gateway service configuration
    pub openclaw: ServiceConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8091,
        }
    }
}

/// One remote service: base URL plus the credential header it expects.
///
/// Immutable once loaded; one instance per remote service for the
/// process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL, no trailing slash required
    pub base_url: String,
    /// Credential value sent on every request (may be empty)
    pub credential: String,
    /// Header name the credential is sent under
    pub credential_header: String,
}

impl ServiceConfig {
    fn agent_mesh_default() -> Self {
        Self {
            base_url: "http://localhost:4000".to_string(),
            credential: "openclaw-mesh-default-key".to_string(),
            credential_header: "X-API-Key".to_string(),
        }
    }

    fn openclaw_default() -> Self {
        Self {
            base_url: "http://localhost:18789".to_string(),
            credential: String::new(),
            credential_header: "Authorization".to_string(),
        }
    }

    /// Header value actually sent on the wire. The OpenClaw gateway takes
    /// a bearer token; the mesh takes the raw key. Empty when no
    /// credential is configured, which suppresses the header entirely.
    #[must_use]
    pub fn header_value(&self) -> String {
        if self.credential.is_empty() {
            String::new()
        } else if self.credential_header.eq_ignore_ascii_case("authorization") {
            format!("Bearer {}", self.credential)
        } else {
            self.credential.clone()
        }
    }
}

impl Config {
    /// Load configuration from an optional YAML file, the
    /// `MESH_BRIDGE_*` environment, and the legacy service variables.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        // .env is optional; ignore when absent
        dotenvy::dotenv().ok();

        let mut figment = Figment::from(figment::providers::Serialized::defaults(Self::seed()));

        if let Some(p) = path {
            if !p.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            figment = figment.merge(Yaml::file(p));
        }

        figment = figment.merge(Env::prefixed("MESH_BRIDGE_").split("__"));

        let mut config: Self = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;

        config.apply_service_env();
        config.validate()?;

        Ok(config)
    }

    /// Defaults with per-service base URLs and credentials filled in.
    #[must_use]
    pub fn seed() -> Self {
        Self {
            server: ServerConfig::default(),
            mesh: ServiceConfig::agent_mesh_default(),
            openclaw: ServiceConfig::openclaw_default(),
        }
    }

    /// Honor the environment variables the deployed services already use.
    fn apply_service_env(&mut self) {
        if let Ok(v) = env::var("AGENT_MESH_URL") {
            self.mesh.base_url = v;
        }
        if let Ok(v) = env::var("AGENT_MESH_KEY") {
            self.mesh.credential = v;
        }
        if let Ok(v) = env::var("OPENCLAW_GATEWAY_URL") {
            self.openclaw.base_url = v;
        }
        if let Ok(v) = env::var("OPENCLAW_GATEWAY_KEY") {
            self.openclaw.credential = v;
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, svc) in [("mesh", &self.mesh), ("openclaw", &self.openclaw)] {
            let parsed = url::Url::parse(&svc.base_url).map_err(|e| {
                Error::Config(format!("Invalid base URL for {name}: {e}"))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::Config(format!(
                    "Base URL for {name} must be http(s): {}",
                    svc.base_url
                )));
            }
            if svc.credential_header.is_empty() {
                return Err(Error::Config(format!(
                    "Missing credential header for {name}"
                )));
            }
        }
        Ok(())
    }
}
