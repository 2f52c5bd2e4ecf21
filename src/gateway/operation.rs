//! Declarative remote operations
//!
//! One [`Operation`] entry replaces one hand-written client method: it
//! names the call, fixes the HTTP method and path template, and declares
//! what the request and response look like. Tables are registered once
//! per service at startup and never mutated afterwards.

use std::collections::HashMap;

use reqwest::{Method, StatusCode};

use crate::gateway::{CallError, CallResult};
use crate::{Error, Result};

/// Whether an operation carries a JSON request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyExpectation {
    /// No request body is accepted
    None,
    /// A JSON body is required
    Required,
}

/// Expected response payload shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// A single JSON value, returned as-is
    Object,
    /// A collection. The remote may reply with a bare array or with the
    /// `{"data": [...]}` envelope; both normalize to the array.
    List,
}

/// A named, statically declared remote call shape.
#[derive(Debug, Clone)]
pub struct Operation {
    /// Operation name, unique per service
    pub name: &'static str,
    /// HTTP method
    pub method: Method,
    /// Remote path template, `{placeholder}` segments allowed
    pub path: &'static str,
    /// Request body expectation
    pub body: BodyExpectation,
    /// Expected response shape
    pub response: ResponseKind,
    /// Remote status that counts as success
    pub success_status: StatusCode,
}

impl Operation {
    fn new(name: &'static str, method: Method, path: &'static str) -> Self {
        Self {
            name,
            method,
            path,
            body: BodyExpectation::None,
            response: ResponseKind::Object,
            success_status: StatusCode::OK,
        }
    }

    /// GET operation returning a single object
    pub fn get(name: &'static str, path: &'static str) -> Self {
        Self::new(name, Method::GET, path)
    }

    /// POST operation
    pub fn post(name: &'static str, path: &'static str) -> Self {
        Self::new(name, Method::POST, path)
    }

    /// PUT operation
    pub fn put(name: &'static str, path: &'static str) -> Self {
        Self::new(name, Method::PUT, path)
    }

    /// DELETE operation
    pub fn delete(name: &'static str, path: &'static str) -> Self {
        Self::new(name, Method::DELETE, path)
    }

    /// Mark the operation as requiring a JSON request body
    #[must_use]
    pub fn with_body(mut self) -> Self {
        self.body = BodyExpectation::Required;
        self
    }

    /// Mark the response as a collection (envelope-tolerant)
    #[must_use]
    pub fn list(mut self) -> Self {
        self.response = ResponseKind::List;
        self
    }

    /// Placeholder names appearing in the path template.
    pub(crate) fn placeholders(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        let mut rest = self.path;
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            names.push(&rest[start + 1..start + len]);
            rest = &rest[start + len + 1..];
        }
        names
    }

    /// Validate the path template: placeholders must be non-empty and
    /// braces balanced. Tables are checked at startup so a malformed
    /// template is a programming error, not a runtime condition.
    fn validate(&self) -> Result<()> {
        let opens = self.path.matches('{').count();
        let closes = self.path.matches('}').count();
        if opens != closes {
            return Err(Error::Config(format!(
                "Unbalanced placeholder braces in path template for '{}': {}",
                self.name, self.path
            )));
        }
        if self.placeholders().len() != opens {
            return Err(Error::Config(format!(
                "Malformed placeholder in path template for '{}': {}",
                self.name, self.path
            )));
        }
        if self.placeholders().iter().any(|p| p.is_empty()) {
            return Err(Error::Config(format!(
                "Empty placeholder in path template for '{}': {}",
                self.name, self.path
            )));
        }
        Ok(())
    }
}

/// Substitute `{placeholder}` segments with caller-supplied values.
///
/// Values are percent-encoded so an id containing `/` or `?` cannot
/// rewrite the remote path. Every placeholder must be covered; a
/// missing one is a caller error, reported distinctly from any remote
/// failure.
pub fn render_path(template: &str, params: &[(&str, &str)]) -> CallResult<String> {
    let mut rendered = template.to_string();
    for (key, value) in params {
        let encoded: String = url::form_urlencoded::byte_serialize(value.as_bytes()).collect();
        rendered = rendered.replace(&format!("{{{key}}}"), &encoded);
    }
    if let Some(start) = rendered.find('{') {
        let end = rendered[start..]
            .find('}')
            .map_or(rendered.len(), |i| start + i + 1);
        return Err(CallError::caller(format!(
            "unresolved path placeholder {}",
            &rendered[start..end]
        )));
    }
    Ok(rendered)
}

/// Static table of operations per service.
///
/// Populated once during startup; `register` rejects duplicates and
/// `resolve` rejects unknown names, both as startup-aborting errors.
#[derive(Debug, Default)]
pub struct OperationRegistry {
    operations: HashMap<(String, String), Operation>,
}

impl OperationRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single operation for a service.
    pub fn register(&mut self, service: &str, operation: Operation) -> Result<()> {
        operation.validate()?;
        let key = (service.to_string(), operation.name.to_string());
        if self.operations.contains_key(&key) {
            return Err(Error::DuplicateOperation {
                service: service.to_string(),
                operation: operation.name.to_string(),
            });
        }
        self.operations.insert(key, operation);
        Ok(())
    }

    /// Register a whole service table.
    pub fn register_service(
        &mut self,
        service: &str,
        operations: impl IntoIterator<Item = Operation>,
    ) -> Result<()> {
        for op in operations {
            self.register(service, op)?;
        }
        Ok(())
    }

    /// Look up an operation.
    pub fn resolve(&self, service: &str, operation: &str) -> Result<&Operation> {
        self.operations
            .get(&(service.to_string(), operation.to_string()))
            .ok_or_else(|| Error::UnknownOperation {
                service: service.to_string(),
                operation: operation.to_string(),
            })
    }

    /// Number of registered operations
    #[must_use]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_all_placeholders() {
        let path = render_path("/api/agents/{agent_id}/health", &[("agent_id", "a1")]).unwrap();
        assert_eq!(path, "/api/agents/a1/health");

        let path = render_path(
            "/api/updates/{update_id}/acknowledge",
            &[("update_id", "u7"), ("unused", "x")],
        )
        .unwrap();
        assert_eq!(path, "/api/updates/u7/acknowledge");
    }

    #[test]
    fn render_escapes_path_breaking_values() {
        let path = render_path("/api/agents/{agent_id}", &[("agent_id", "a/b?c")]).unwrap();
        assert_eq!(path, "/api/agents/a%2Fb%3Fc");

        // Plain ids pass through untouched
        let path = render_path("/api/agents/{agent_id}", &[("agent_id", "agent-1")]).unwrap();
        assert_eq!(path, "/api/agents/agent-1");
    }

    #[test]
    fn render_rejects_missing_placeholder() {
        let err = render_path("/api/agents/{agent_id}", &[]).unwrap_err();
        assert_eq!(err.kind, crate::gateway::CallErrorKind::Caller);
        assert!(err.message.contains("{agent_id}"), "{}", err.message);
        assert_eq!(err.status, None);
    }

    #[test]
    fn registry_rejects_duplicates() {
        let mut registry = OperationRegistry::new();
        registry
            .register("mesh", Operation::get("list_agents", "/api/agents").list())
            .unwrap();
        let err = registry
            .register("mesh", Operation::get("list_agents", "/api/agents").list())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateOperation { .. }));

        // Same name under a different service is fine
        registry
            .register("openclaw", Operation::get("list_agents", "/api/agents").list())
            .unwrap();
    }

    #[test]
    fn registry_rejects_unknown_lookup() {
        let registry = OperationRegistry::new();
        let err = registry.resolve("mesh", "nope").unwrap_err();
        assert!(matches!(err, Error::UnknownOperation { .. }));
    }

    #[test]
    fn malformed_template_fails_registration() {
        let mut registry = OperationRegistry::new();
        let err = registry
            .register("mesh", Operation::get("broken", "/api/{agent_id"))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = registry
            .register("mesh", Operation::get("empty", "/api/{}/x"))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn placeholders_are_extracted_in_order() {
        let op = Operation::get("x", "/api/{a}/y/{b}");
        assert_eq!(op.placeholders(), vec!["a", "b"]);
    }
}
