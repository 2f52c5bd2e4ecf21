//! Remote service integrations
//!
//! Each integration is a service name, an operation table, and the typed
//! request bodies its routes accept. The tables are registered into the
//! [`crate::gateway::OperationRegistry`] once at startup.

pub mod mesh;
pub mod openclaw;

/// Service name of the Agent Mesh coordination service
pub const MESH: &str = "mesh";

/// Service name of the OpenClaw control gateway
pub const OPENCLAW: &str = "openclaw";
