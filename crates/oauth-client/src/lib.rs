//! Wire-level OAuth2 client for the integration dashboard
//!
//! Provides PKCE flow generation, authorization-URL construction, and
//! token exchange/refresh against arbitrary authorization servers. This
//! crate is stateless — it holds no tokens and no verifier entries; the
//! `oauth-manager` crate layers the stateful flow orchestration on top.
//!
//! Flow, as driven by the manager:
//! 1. `pkce::generate_state()` + `pkce::generate_verifier()` +
//!    `pkce::compute_challenge()`
//! 2. User authorizes via `pkce::build_authorization_url()`
//! 3. `token::exchange_code()` with the authorization code and verifier
//! 4. `token::refresh()` when the access token approaches expiry
//!
//! Endpoint URLs, credentials, and scopes come from a [`ServiceConfig`],
//! with ready-made constructors for the supported services (Salesforce,
//! Shopify, HubSpot, Slack, Calendly, Zendesk).

pub mod config;
pub mod error;
pub mod pkce;
pub mod token;

pub use config::ServiceConfig;
pub use error::{Error, Result};
pub use pkce::{build_authorization_url, compute_challenge, generate_state, generate_verifier};
pub use token::{TokenResponse, exchange_code, refresh};
