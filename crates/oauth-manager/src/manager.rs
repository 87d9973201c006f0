//! OAuth2 flow state machine
//!
//! Orchestrates the full per-service flow over the registry, token
//! store, and verifier cache: builds authorization URLs, exchanges
//! callback codes for tokens, refreshes expired tokens on demand, and
//! answers authentication-status queries. Per-service states and
//! transitions:
//!
//! - Unauthenticated → AuthorizationPending (`generate_authorization_url`)
//! - AuthorizationPending → Authenticated (`exchange_code`)
//! - Authenticated, expiry passed → refreshed in place (`get_valid_token`)
//! - any → Unauthenticated (`revoke`, or a failed refresh as seen by callers)
//!
//! Concurrent `get_valid_token` calls for one service collapse into a
//! single outbound refresh: a keyed async mutex admits one refresher,
//! and the waiters re-read the store once it finishes. Most services
//! invalidate a refresh token on first use, so a duplicate refresh would
//! lock the application out.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use oauth_client::ServiceConfig;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::registry::ServiceConfigRegistry;
use crate::store::{Token, TokenStore};
use crate::verifier::{DEFAULT_VERIFIER_TTL, VerifierCache};

/// How many seconds before its recorded expiry a token is treated as
/// expired, absorbing clock skew between us and the token endpoint.
pub const DEFAULT_EXPIRY_LEEWAY_SECS: i64 = 30;

/// Multi-service OAuth2 flow manager.
///
/// One instance per process. The HTTP client is caller-supplied so the
/// caller controls timeouts; a timed-out exchange or refresh surfaces as
/// the operation's error kind rather than hanging.
pub struct OAuth2Manager {
    registry: ServiceConfigRegistry,
    store: TokenStore,
    verifiers: VerifierCache,
    http: reqwest::Client,
    leeway: TimeDelta,
    refresh_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl OAuth2Manager {
    /// Create a manager with the default verifier TTL and expiry leeway.
    pub fn new(store: TokenStore, http: reqwest::Client) -> Self {
        Self::with_settings(
            store,
            http,
            DEFAULT_VERIFIER_TTL,
            TimeDelta::seconds(DEFAULT_EXPIRY_LEEWAY_SECS),
        )
    }

    /// Create a manager with explicit verifier TTL and expiry leeway.
    pub fn with_settings(
        store: TokenStore,
        http: reqwest::Client,
        verifier_ttl: Duration,
        expiry_leeway: TimeDelta,
    ) -> Self {
        Self {
            registry: ServiceConfigRegistry::new(),
            store,
            verifiers: VerifierCache::new(verifier_ttl),
            http,
            leeway: expiry_leeway,
            refresh_locks: Mutex::new(HashMap::new()),
        }
    }

    /// Register (or replace) a service's OAuth2 configuration.
    pub async fn register_service(&self, service: impl Into<String>, config: ServiceConfig) {
        self.registry.register(service, config).await;
    }

    /// Names of all registered services.
    pub async fn services(&self) -> Vec<String> {
        self.registry.services().await
    }

    /// The backing token store (status listings, tests).
    pub fn token_store(&self) -> &TokenStore {
        &self.store
    }

    /// Build the authorization URL that starts a service's flow.
    ///
    /// Generates the CSRF state (unless the caller supplies one) and a
    /// PKCE verifier/challenge pair, parks the verifier in the cache
    /// keyed by `(service, state)`, and returns the fully query-encoded
    /// URL together with the state the callback must echo.
    pub async fn generate_authorization_url(
        &self,
        service: &str,
        state: Option<String>,
    ) -> Result<(String, String)> {
        let config = self.registry.get(service).await?;

        let state = state.unwrap_or_else(oauth_client::generate_state);
        let verifier = oauth_client::generate_verifier();
        let challenge = oauth_client::compute_challenge(&verifier);

        let url = oauth_client::build_authorization_url(&config, &state, &challenge)
            .map_err(|e| Error::Configuration(e.to_string()))?;

        self.verifiers.put(service, &state, verifier).await;
        debug!(service, "issued authorization url");
        Ok((url, state))
    }

    /// Exchange an authorization code delivered by the callback.
    ///
    /// The verifier lookup doubles as the CSRF/replay guard: a state
    /// that was never issued, was already consumed, or expired in the
    /// cache fails with `StateMismatch` before anything goes on the
    /// wire. On success the token is stored and persisted.
    pub async fn exchange_code(&self, service: &str, code: &str, state: &str) -> Result<Token> {
        let config = self.registry.get(service).await?;

        let verifier = self.verifiers.take(service, state).await.ok_or_else(|| {
            Error::StateMismatch(format!("no pending authorization for {service} with this state"))
        })?;

        let response = oauth_client::exchange_code(&self.http, &config, code, &verifier)
            .await
            .map_err(|e| Error::TokenExchange(e.to_string()))?;

        let token = Token::from_response(response);
        self.store.insert(service, token.clone()).await;
        info!(service, "obtained oauth token");
        Ok(token)
    }

    /// Refresh a service's access token using its stored refresh token.
    ///
    /// Fails `Refresh` when there is no token or no refresh token on
    /// record. A failed refresh leaves the stale token in place — the
    /// caller decides whether to treat the service as unauthenticated.
    /// On success the access token and expiry are replaced in place; the
    /// refresh token is replaced only if the server issued a new one.
    pub async fn refresh(&self, service: &str) -> Result<Token> {
        let _guard = self.refresh_guard(service).await;
        self.refresh_locked(service).await
    }

    /// Get a valid token for a service, refreshing transparently.
    ///
    /// `None` means no token on record, or the token is expired and the
    /// refresh attempt failed (logged, not propagated). This is the
    /// single call site outbound integration calls use before attaching
    /// credentials.
    pub async fn get_valid_token(&self, service: &str) -> Option<Token> {
        let token = self.store.get(service).await?;
        if !token.is_expired(self.leeway) {
            return Some(token);
        }

        // Single-flight: one caller refreshes, the rest queue here and
        // re-read the store once it is done.
        let _guard = self.refresh_guard(service).await;
        if let Some(current) = self.store.get(service).await {
            if !current.is_expired(self.leeway) {
                return Some(current);
            }
        }

        match self.refresh_locked(service).await {
            Ok(token) => Some(token),
            Err(e) => {
                warn!(service, error = %e, "refresh of expired token failed");
                None
            }
        }
    }

    /// Whether `get_valid_token` would produce a token right now.
    pub async fn is_authenticated(&self, service: &str) -> bool {
        self.get_valid_token(service).await.is_some()
    }

    /// Remove a service's token locally and persist the removal.
    ///
    /// Idempotent. Does not call the service's remote revocation
    /// endpoint.
    pub async fn revoke(&self, service: &str) {
        if self.store.remove(service).await {
            info!(service, "revoked token");
        }
    }

    /// Acquire the per-service refresh lock, creating it on first use.
    async fn refresh_guard(&self, service: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.refresh_locks.lock().await;
            locks
                .entry(service.to_owned())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Refresh with the per-service lock already held.
    async fn refresh_locked(&self, service: &str) -> Result<Token> {
        let config = self.registry.get(service).await?;

        let current = self
            .store
            .get(service)
            .await
            .ok_or_else(|| Error::Refresh(format!("no token on record for {service}")))?;
        let refresh_token = current
            .refresh_token
            .clone()
            .ok_or_else(|| Error::Refresh(format!("no refresh token on record for {service}")))?;

        match oauth_client::refresh(&self.http, &config, &refresh_token).await {
            Ok(response) => {
                let mut token = current;
                token.access_token = response.access_token;
                token.expires_at = response
                    .expires_in
                    .map(|secs| chrono::Utc::now() + TimeDelta::seconds(secs as i64));
                if let Some(new_refresh) = response.refresh_token {
                    token.refresh_token = Some(new_refresh);
                }
                self.store.insert(service, token.clone()).await;
                metrics::counter!("oauth_token_refresh_total", "outcome" => "ok").increment(1);
                info!(service, "refreshed oauth token");
                Ok(token)
            }
            Err(e) => {
                metrics::counter!("oauth_token_refresh_total", "outcome" => "error").increment(1);
                Err(Error::Refresh(e.to_string()))
            }
        }
    }
}
