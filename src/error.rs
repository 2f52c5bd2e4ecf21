//! Error types for mesh-bridge

use thiserror::Error;

/// Result type alias for mesh-bridge
pub type Result<T> = std::result::Result<T, Error>;

/// Startup and configuration errors.
///
/// These abort the process. Per-request remote failures are carried by
/// [`crate::gateway::CallError`] values instead and never surface here.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Operation registered twice for the same service
    #[error("Duplicate operation: {service}/{operation}")]
    DuplicateOperation {
        /// Service name
        service: String,
        /// Operation name
        operation: String,
    },

    /// Operation looked up but never registered
    #[error("Unknown operation: {service}/{operation}")]
    UnknownOperation {
        /// Service name
        service: String,
        /// Operation name
        operation: String,
    },

    /// Service name with no configured client
    #[error("Unknown service: {0}")]
    UnknownService(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}
