//! Error types for wire-level OAuth operations

/// Errors from wire-level OAuth operations.
///
/// `Http` is a transport failure (timeout, connection refused);
/// `Endpoint` and `InvalidResponse` are protocol failures (non-2xx
/// status, malformed body). Callers that don't care about the cause
/// collapse all three into their own operation-level error kind.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token endpoint rejected request: {0}")]
    Endpoint(String),

    #[error("invalid token response: {0}")]
    InvalidResponse(String),

    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

/// Result alias for wire-level operations.
pub type Result<T> = std::result::Result<T, Error>;
