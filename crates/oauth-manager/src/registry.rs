//! Per-service configuration registry
//!
//! Immutable endpoint/credential configs keyed by service name.
//! Registration happens once per service at startup; re-registration is
//! allowed and silently replaces the previous config.

use std::collections::HashMap;

use oauth_client::ServiceConfig;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{Error, Result};

/// Registry of per-service OAuth2 configurations.
///
/// In-memory only, no side effects beyond the map. Lookups clone the
/// config, so readers never hold the lock across an await point.
pub struct ServiceConfigRegistry {
    configs: RwLock<HashMap<String, ServiceConfig>>,
}

impl ServiceConfigRegistry {
    pub fn new() -> Self {
        Self {
            configs: RwLock::new(HashMap::new()),
        }
    }

    /// Store or overwrite the config for a service.
    pub async fn register(&self, service: impl Into<String>, config: ServiceConfig) {
        let service = service.into();
        debug!(service, "registered service config");
        self.configs.write().await.insert(service, config);
    }

    /// Get a clone of a service's config.
    pub async fn get(&self, service: &str) -> Result<ServiceConfig> {
        self.configs
            .read()
            .await
            .get(service)
            .cloned()
            .ok_or_else(|| Error::Configuration(format!("service {service} not registered")))
    }

    /// Names of all registered services, sorted for stable output.
    pub async fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.configs.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for ServiceConfigRegistry {
    fn default() -> Self {
        Self::new()
    }
}
