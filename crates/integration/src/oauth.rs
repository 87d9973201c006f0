//! Standard OAuth2-backed implementation of the capability contract

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use oauth_manager::{OAuth2Manager, Result};

use crate::Authenticatable;

/// An integration whose credentials come from the shared OAuth2 manager.
///
/// One instance per service; all instances share the same manager, so
/// tokens, verifier entries, and persistence stay process-wide.
pub struct OAuthIntegration {
    manager: Arc<OAuth2Manager>,
    service: String,
}

impl OAuthIntegration {
    pub fn new(manager: Arc<OAuth2Manager>, service: impl Into<String>) -> Self {
        Self {
            manager,
            service: service.into(),
        }
    }
}

impl Authenticatable for OAuthIntegration {
    fn service_name(&self) -> &str {
        &self.service
    }

    fn authorization_url(&self) -> Pin<Box<dyn Future<Output = Result<(String, String)>> + Send + '_>> {
        Box::pin(async move {
            self.manager
                .generate_authorization_url(&self.service, None)
                .await
        })
    }

    fn is_authenticated(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>> {
        Box::pin(async move { self.manager.is_authenticated(&self.service).await })
    }

    fn complete_flow<'a>(
        &'a self,
        code: &'a str,
        state: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.manager
                .exchange_code(&self.service, code, state)
                .await
                .map(|_| ())
        })
    }

    fn revoke(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>> {
        Box::pin(async move { self.manager.revoke(&self.service).await })
    }
}
