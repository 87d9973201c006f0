//! Capability contract between service integrations and the OAuth core
//!
//! Defines the `Authenticatable` trait that each service integration
//! either implements or explicitly does not — replacing any runtime
//! "does this object have an auth method" introspection with a contract
//! the compiler checks and an explicit registry enumerates. Integrations
//! that authenticate some other way (static API keys, basic auth) simply
//! never implement the trait and never appear in the registry.
//!
//! `OAuthIntegration` is the standard implementation, delegating to a
//! shared `OAuth2Manager`; `IntegrationRegistry` answers dashboard-level
//! questions (authorization URLs, per-service status) across every
//! registered capability.

pub mod oauth;
pub mod registry;

pub use oauth::OAuthIntegration;
pub use registry::IntegrationRegistry;

use std::future::Future;
use std::pin::Pin;

use oauth_manager::Result;

/// Contract for integrations that authenticate via the OAuth2 manager.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Box<dyn Authenticatable>` in the registry).
pub trait Authenticatable: Send + Sync {
    /// Service name, matching the manager's registry/store key.
    fn service_name(&self) -> &str;

    /// Start an authorization flow: `(authorization_url, state)`.
    fn authorization_url(&self) -> Pin<Box<dyn Future<Output = Result<(String, String)>> + Send + '_>>;

    /// Whether the service currently holds a usable token.
    fn is_authenticated(&self) -> Pin<Box<dyn Future<Output = bool> + Send + '_>>;

    /// Complete the flow with the callback's `(code, state)` pair.
    fn complete_flow<'a>(
        &'a self,
        code: &'a str,
        state: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    /// Drop the service's stored token (local only).
    fn revoke(&self) -> Pin<Box<dyn Future<Output = ()> + Send + '_>>;
}
