//! Stateful OAuth2 flow orchestration for the integration dashboard
//!
//! Holds per-service tokens and in-flight PKCE verifiers, and drives the
//! authorization-code-with-PKCE flow end to end against the wire-level
//! `oauth-client` crate. One [`OAuth2Manager`] serves the whole process;
//! all outbound integration calls obtain credentials through
//! [`OAuth2Manager::get_valid_token`], which refreshes expired tokens
//! transparently.
//!
//! Per-service flow:
//! 1. `register_service()` with a [`oauth_client::ServiceConfig`] at startup
//! 2. `generate_authorization_url()` → user authorizes in the browser
//! 3. Callback delivers `(code, state)` → `exchange_code()` stores the token
//! 4. `get_valid_token()` before every outbound call, refreshing on expiry
//! 5. `revoke()` drops the stored token (local only)
//!
//! Tokens persist across restarts through [`TokenStore`]; persistence is
//! best-effort and never fails the in-memory operation that triggered it.

pub mod error;
pub mod manager;
pub mod registry;
pub mod store;
pub mod verifier;

pub use error::{Error, Result};
pub use manager::{DEFAULT_EXPIRY_LEEWAY_SECS, OAuth2Manager};
pub use registry::ServiceConfigRegistry;
pub use store::{Token, TokenStore};
pub use verifier::{DEFAULT_VERIFIER_TTL, VerifierCache};
