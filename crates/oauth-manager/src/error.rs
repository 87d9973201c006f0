//! Error taxonomy for flow orchestration
//!
//! One externally visible kind per failure class. Transport and protocol
//! causes are distinguished only in the message text — callers act on the
//! kind, not the cause. Persistence failures have no variant here: the
//! in-memory state stays authoritative and the store logs and counts them
//! instead of surfacing them.

/// Errors from OAuth2 flow orchestration.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Service never registered — caller bug, not retried.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Missing, consumed, or forged state. Never retried automatically;
    /// the user must restart the authorization flow.
    #[error("state mismatch: {0}")]
    StateMismatch(String),

    /// Network failure or authorization-server rejection during code
    /// exchange. Authorization codes are single-use, so not retried.
    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    /// No token, no refresh token, or authorization-server rejection
    /// during refresh. Callers treat the service as unauthenticated.
    #[error("token refresh failed: {0}")]
    Refresh(String),
}

/// Result alias for flow orchestration.
pub type Result<T> = std::result::Result<T, Error>;
