//! Typed gateway client
//!
//! One client per remote service, bound to a base URL and a credential
//! header. `call` issues exactly one HTTP request and folds every outcome
//! into a [`CallResult`]; transport failures and remote error statuses
//! are values, never panics or propagated exceptions. Retries are out of
//! scope by contract.

use std::fmt;

use reqwest::{Client, Method, header};
use serde_json::Value;
use tracing::debug;

use super::operation::{BodyExpectation, Operation, ResponseKind, render_path};
use crate::config::ServiceConfig;
use crate::{Error, Result};

/// Result of one remote call
pub type CallResult<T> = std::result::Result<T, CallError>;

/// Classification of a failed call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallErrorKind {
    /// Caller misuse: missing path parameter or body mismatch
    Caller,
    /// Remote unreachable: connection refused, DNS failure, timeout
    Transport,
    /// Remote responded with a non-success status
    Remote,
    /// Remote responded with a payload that does not match the
    /// declared response shape
    Shape,
}

/// Normalized failure of a remote call.
///
/// `status` is the raw remote status when one was received and `None`
/// for transport failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallError {
    /// Failure classification
    pub kind: CallErrorKind,
    /// Human-readable description (remote error text for `Remote`)
    pub message: String,
    /// Raw remote status code, if any
    pub status: Option<u16>,
}

impl CallError {
    pub(crate) fn caller(message: impl Into<String>) -> Self {
        Self {
            kind: CallErrorKind::Caller,
            message: message.into(),
            status: None,
        }
    }

    pub(crate) fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: CallErrorKind::Transport,
            message: message.into(),
            status: None,
        }
    }

    pub(crate) fn remote(message: impl Into<String>, status: u16) -> Self {
        Self {
            kind: CallErrorKind::Remote,
            message: message.into(),
            status: Some(status),
        }
    }

    pub(crate) fn shape(status: u16) -> Self {
        Self {
            kind: CallErrorKind::Shape,
            message: "invalid response shape".to_string(),
            status: Some(status),
        }
    }
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{} (status {status})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// HTTP client for one remote gateway service
#[derive(Debug)]
pub struct GatewayClient {
    service: String,
    base_url: String,
    credential_header: String,
    credential_value: String,
    http: Client,
}

impl GatewayClient {
    /// Create a client for a service.
    ///
    /// Fails fast on malformed configuration; this is the only place a
    /// gateway error escapes as a crate [`Error`].
    pub fn new(service: &str, config: &ServiceConfig) -> Result<Self> {
        let base = url::Url::parse(&config.base_url)
            .map_err(|e| Error::Config(format!("Invalid base URL for {service}: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "Base URL for {service} must be http(s): {}",
                config.base_url
            )));
        }

        // No request timeout: the surrounding server framework bounds
        // request lifetime, and the remote contract specifies none.
        let http = Client::builder()
            .tcp_nodelay(true)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            service: service.to_string(),
            base_url: base.as_str().trim_end_matches('/').to_string(),
            credential_header: config.credential_header.clone(),
            credential_value: config.header_value(),
            http,
        })
    }

    /// Service name this client is bound to
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Base URL of the remote service
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Perform one remote call described by `operation`.
    ///
    /// Path placeholders are filled from `params`; `body` must be
    /// present exactly when the operation declares one. List operations
    /// tolerate both the `{"data": [...]}` envelope and a bare array.
    pub async fn call(
        &self,
        operation: &Operation,
        params: &[(&str, &str)],
        body: Option<&Value>,
    ) -> CallResult<Value> {
        match (operation.body, body) {
            (BodyExpectation::Required, None) => {
                return Err(CallError::caller(format!(
                    "operation '{}' requires a request body",
                    operation.name
                )));
            }
            (BodyExpectation::None, Some(_)) => {
                return Err(CallError::caller(format!(
                    "operation '{}' does not accept a request body",
                    operation.name
                )));
            }
            _ => {}
        }

        let path = render_path(operation.path, params)?;
        let response = self
            .send(operation.method.clone(), &path, body)
            .await?;

        let status = response.status();
        if status != operation.success_status {
            let text = response.text().await.unwrap_or_default();
            debug!(
                service = %self.service,
                operation = %operation.name,
                status = status.as_u16(),
                "Remote reported error"
            );
            return Err(CallError::remote(text, status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| CallError::transport(format!("Failed to read response: {e}")))?;
        let value: Value =
            serde_json::from_slice(&bytes).map_err(|_| CallError::shape(status.as_u16()))?;

        match operation.response {
            ResponseKind::Object => Ok(value),
            ResponseKind::List => unwrap_list(value, status.as_u16()),
        }
    }

    /// Send a request and return the raw response without consuming the
    /// body. Used by the chat-completion passthrough, which forwards the
    /// remote byte stream unmodified.
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> CallResult<reqwest::Response> {
        let url = format!("{}{path}", self.base_url);

        let mut request = self
            .http
            .request(method, &url)
            .header(header::CONTENT_TYPE, "application/json");
        if !self.credential_value.is_empty() {
            request = request.header(&self.credential_header, &self.credential_value);
        }
        if let Some(payload) = body {
            request = request.json(payload);
        }

        request
            .send()
            .await
            .map_err(|e| CallError::transport(e.to_string()))
    }
}

/// Normalize a collection payload.
///
/// The deployed services disagree on whether collections come enveloped
/// (`{"data": [...]}`) or bare; both shapes are accepted on purpose.
fn unwrap_list(value: Value, status: u16) -> CallResult<Value> {
    match value {
        Value::Array(_) => Ok(value),
        Value::Object(mut map) => match map.remove("data") {
            Some(data @ Value::Array(_)) => Ok(data),
            _ => Err(CallError::shape(status)),
        },
        _ => Err(CallError::shape(status)),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn list_envelope_and_bare_array_normalize_identically() {
        let enveloped = unwrap_list(json!({"data": [1, 2]}), 200).unwrap();
        let bare = unwrap_list(json!([1, 2]), 200).unwrap();
        assert_eq!(enveloped, bare);
        assert_eq!(enveloped, json!([1, 2]));
    }

    #[test]
    fn list_rejects_other_shapes() {
        for payload in [json!({"data": "nope"}), json!({"rows": []}), json!(42)] {
            let err = unwrap_list(payload, 200).unwrap_err();
            assert_eq!(err.kind, CallErrorKind::Shape);
            assert_eq!(err.status, Some(200));
        }
    }

    #[test]
    fn construction_rejects_malformed_base_url() {
        let config = ServiceConfig {
            base_url: "localhost:4000".to_string(),
            credential: String::new(),
            credential_header: "X-API-Key".to_string(),
        };
        assert!(GatewayClient::new("mesh", &config).is_err());
    }

    #[test]
    fn call_error_display_includes_status() {
        let err = CallError::remote("mesh overloaded", 500);
        assert_eq!(err.to_string(), "mesh overloaded (status 500)");

        let err = CallError::transport("connection refused");
        assert_eq!(err.to_string(), "connection refused");
    }
}
