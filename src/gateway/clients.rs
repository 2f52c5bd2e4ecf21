//! Process-wide client registry
//!
//! One [`GatewayClient`] per remote service, constructed on first use
//! and reused for the process lifetime. The dashmap entry API holds the
//! shard write lock across construction, so concurrent first access
//! builds exactly one client per service name.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::info;

use super::client::GatewayClient;
use crate::config::ServiceConfig;
use crate::{Error, Result};

/// Lazily constructed, never-evicted client cache keyed by service name
pub struct ClientRegistry {
    configs: HashMap<String, ServiceConfig>,
    clients: DashMap<String, Arc<GatewayClient>>,
    constructions: AtomicUsize,
}

impl ClientRegistry {
    /// Create a registry over the configured services.
    #[must_use]
    pub fn new(configs: impl IntoIterator<Item = (String, ServiceConfig)>) -> Self {
        Self {
            configs: configs.into_iter().collect(),
            clients: DashMap::new(),
            constructions: AtomicUsize::new(0),
        }
    }

    /// Get the client for a service, constructing it on first use.
    pub fn get(&self, service: &str) -> Result<Arc<GatewayClient>> {
        if let Some(client) = self.clients.get(service) {
            return Ok(Arc::clone(client.value()));
        }

        let config = self
            .configs
            .get(service)
            .ok_or_else(|| Error::UnknownService(service.to_string()))?;

        match self.clients.entry(service.to_string()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let client = Arc::new(GatewayClient::new(service, config)?);
                self.constructions.fetch_add(1, Ordering::Relaxed);
                info!(service, base_url = %client.base_url(), "Constructed gateway client");
                entry.insert(Arc::clone(&client));
                Ok(client)
            }
        }
    }

    /// Number of clients constructed so far. Exposed for the
    /// single-initialization guarantee tests.
    #[must_use]
    pub fn construction_count(&self) -> usize {
        self.constructions.load(Ordering::Relaxed)
    }

    /// Names of services this registry can construct clients for
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_registry() -> ClientRegistry {
        let config = ServiceConfig {
            base_url: "http://localhost:4000".to_string(),
            credential: "key".to_string(),
            credential_header: "X-API-Key".to_string(),
        };
        ClientRegistry::new([("mesh".to_string(), config)])
    }

    #[test]
    fn same_instance_is_returned_on_repeat_access() {
        let registry = test_registry();
        let first = registry.get("mesh").unwrap();
        let second = registry.get("mesh").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.construction_count(), 1);
    }

    #[test]
    fn unknown_service_is_rejected() {
        let registry = test_registry();
        assert!(matches!(
            registry.get("nope").unwrap_err(),
            Error::UnknownService(_)
        ));
        assert_eq!(registry.construction_count(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn concurrent_first_access_constructs_once() {
        let registry = Arc::new(test_registry());

        let mut handles = Vec::new();
        for _ in 0..32 {
            let registry = Arc::clone(&registry);
            handles.push(tokio::spawn(async move { registry.get("mesh").unwrap() }));
        }

        let mut clients = Vec::new();
        for handle in handles {
            clients.push(handle.await.unwrap());
        }

        assert_eq!(registry.construction_count(), 1);
        for client in &clients[1..] {
            assert!(Arc::ptr_eq(&clients[0], client));
        }
    }
}
