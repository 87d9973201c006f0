//! Registry of authenticatable integrations
//!
//! The dashboard-facing surface: enumerate which services can
//! authenticate, collect their authorization URLs, report per-service
//! status, and route callback completions and revocations to the right
//! integration. Membership is explicit — an integration is capable
//! because it was registered, not because introspection found a method.

use std::collections::HashMap;

use oauth_manager::{Error, Result};
use tracing::warn;

use crate::Authenticatable;

/// Explicit registry of integrations implementing [`Authenticatable`].
pub struct IntegrationRegistry {
    integrations: Vec<Box<dyn Authenticatable>>,
}

impl IntegrationRegistry {
    pub fn new() -> Self {
        Self {
            integrations: Vec::new(),
        }
    }

    /// Add an integration, replacing any previous one for the same service.
    pub fn register(&mut self, integration: Box<dyn Authenticatable>) {
        self.integrations
            .retain(|existing| existing.service_name() != integration.service_name());
        self.integrations.push(integration);
    }

    /// Service names of all registered integrations.
    pub fn services(&self) -> Vec<&str> {
        self.integrations.iter().map(|i| i.service_name()).collect()
    }

    fn get(&self, service: &str) -> Result<&dyn Authenticatable> {
        self.integrations
            .iter()
            .find(|i| i.service_name() == service)
            .map(|boxed| &**boxed)
            .ok_or_else(|| Error::Configuration(format!("no integration registered for {service}")))
    }

    /// Fresh authorization URLs for every registered integration.
    ///
    /// A service whose URL cannot be built (misconfigured endpoint) is
    /// logged and skipped rather than failing the whole listing.
    pub async fn authorization_urls(&self) -> HashMap<String, String> {
        let mut urls = HashMap::new();
        for integration in &self.integrations {
            match integration.authorization_url().await {
                Ok((url, _state)) => {
                    urls.insert(integration.service_name().to_owned(), url);
                }
                Err(e) => {
                    warn!(service = integration.service_name(), error = %e, "skipping authorization url");
                }
            }
        }
        urls
    }

    /// Authentication status for every registered integration.
    pub async fn authentication_status(&self) -> HashMap<String, bool> {
        let mut status = HashMap::new();
        for integration in &self.integrations {
            status.insert(
                integration.service_name().to_owned(),
                integration.is_authenticated().await,
            );
        }
        status
    }

    /// Complete a callback flow for one service.
    pub async fn complete_flow(&self, service: &str, code: &str, state: &str) -> Result<()> {
        self.get(service)?.complete_flow(code, state).await
    }

    /// Revoke one service's stored token.
    pub async fn revoke(&self, service: &str) -> Result<()> {
        self.get(service)?.revoke().await;
        Ok(())
    }
}

impl Default for IntegrationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Minimal in-memory capability for registry behavior tests.
    struct StubIntegration {
        name: &'static str,
        authenticated: AtomicBool,
        url_fails: bool,
    }

    impl StubIntegration {
        fn new(name: &'static str, authenticated: bool) -> Self {
            Self {
                name,
                authenticated: AtomicBool::new(authenticated),
                url_fails: false,
            }
        }
    }

    impl Authenticatable for StubIntegration {
        fn service_name(&self) -> &str {
            self.name
        }

        fn authorization_url(
            &self,
        ) -> Pin<Box<dyn Future<Output = Result<(String, String)>> + Send + '_>> {
            Box::pin(async move {
                if self.url_fails {
                    Err(Error::Configuration("broken endpoint".into()))
                } else {
                    Ok((format!("https://auth.example.com/{}", self.name), "st".into()))
                }
            })
        }

        fn is_authenticated(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
            Box::pin(async move { self.authenticated.load(Ordering::Relaxed) })
        }

        fn complete_flow<'a>(
            &'a self,
            _code: &'a str,
            _state: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
            Box::pin(async move {
                self.authenticated.store(true, Ordering::Relaxed);
                Ok(())
            })
        }

        fn revoke(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
            Box::pin(async move { self.authenticated.store(false, Ordering::Relaxed) })
        }
    }

    #[tokio::test]
    async fn status_covers_every_registered_service() {
        let mut registry = IntegrationRegistry::new();
        registry.register(Box::new(StubIntegration::new("salesforce", true)));
        registry.register(Box::new(StubIntegration::new("hubspot", false)));

        let status = registry.authentication_status().await;
        assert_eq!(status.len(), 2);
        assert_eq!(status["salesforce"], true);
        assert_eq!(status["hubspot"], false);
    }

    #[tokio::test]
    async fn authorization_urls_skip_broken_services() {
        let mut registry = IntegrationRegistry::new();
        registry.register(Box::new(StubIntegration::new("slack", false)));
        let mut broken = StubIntegration::new("zendesk", false);
        broken.url_fails = true;
        registry.register(Box::new(broken));

        let urls = registry.authorization_urls().await;
        assert_eq!(urls.len(), 1);
        assert!(urls.contains_key("slack"));
    }

    #[tokio::test]
    async fn complete_flow_routes_to_named_service() {
        let mut registry = IntegrationRegistry::new();
        registry.register(Box::new(StubIntegration::new("calendly", false)));

        registry.complete_flow("calendly", "code", "state").await.unwrap();
        assert_eq!(registry.authentication_status().await["calendly"], true);

        let err = registry
            .complete_flow("not-registered", "code", "state")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[tokio::test]
    async fn revoke_routes_and_rejects_unknown() {
        let mut registry = IntegrationRegistry::new();
        registry.register(Box::new(StubIntegration::new("shopify", true)));

        registry.revoke("shopify").await.unwrap();
        assert_eq!(registry.authentication_status().await["shopify"], false);

        assert!(registry.revoke("erp").await.is_err());
    }

    #[tokio::test]
    async fn reregistration_replaces_same_service() {
        let mut registry = IntegrationRegistry::new();
        registry.register(Box::new(StubIntegration::new("slack", false)));
        registry.register(Box::new(StubIntegration::new("slack", true)));

        assert_eq!(registry.services(), vec!["slack"]);
        assert_eq!(registry.authentication_status().await["slack"], true);
    }
}
