//! Durable token storage
//!
//! Manages a JSON file mapping service names to OAuth tokens. Writes use
//! atomic temp-file + rename and are best-effort: a failed write is
//! logged and counted (`oauth_token_store_persist_failures_total`) but
//! never fails the in-memory operation that triggered it, and a missing
//! or unparseable file at startup means an empty token set rather than a
//! startup error. The in-memory map stays authoritative for the process
//! lifetime; the file is the source of truth across restarts.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeDelta, Utc};
use oauth_client::TokenResponse;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Env var overriding the token file location.
pub const TOKEN_STORE_ENV: &str = "OAUTH2_TOKEN_STORE";

/// Default token file, a dotfile in the working directory.
pub const DEFAULT_TOKEN_STORE: &str = ".oauth_tokens.json";

fn default_token_type() -> String {
    "Bearer".into()
}

/// One service's OAuth token.
///
/// `expires_at` is an absolute instant computed from the token
/// endpoint's `expires_in` delta at storage time; `None` means the
/// token never expires. Serialized to RFC 3339 on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub scope: Option<String>,
}

impl Token {
    /// Build a fresh token from a token-endpoint response, anchoring
    /// `expires_in` to the current instant.
    pub fn from_response(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token,
            expires_at: response
                .expires_in
                .map(|secs| Utc::now() + TimeDelta::seconds(secs as i64)),
            token_type: response.token_type,
            scope: response.scope,
        }
    }

    /// Whether the token's expiry has passed, treating it as expired
    /// `leeway` early to absorb clock skew. A token without an expiry
    /// never expires.
    pub fn is_expired(&self, leeway: TimeDelta) -> bool {
        match self.expires_at {
            Some(at) => Utc::now() + leeway >= at,
            None => false,
        }
    }
}

/// Thread-safe token file manager.
///
/// The Mutex serializes all access; every mutation persists the full
/// current snapshot so the file is always internally consistent. A crash
/// between mutation and persistence loses at most the latest update.
pub struct TokenStore {
    path: Option<PathBuf>,
    state: Mutex<HashMap<String, Token>>,
}

impl TokenStore {
    /// Resolve the token file path from `OAUTH2_TOKEN_STORE`, falling
    /// back to `.oauth_tokens.json` in the working directory.
    pub fn default_path() -> PathBuf {
        std::env::var(TOKEN_STORE_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOKEN_STORE))
    }

    /// Load tokens from the given file path.
    ///
    /// Never fails: a missing file means a cold start with zero tokens,
    /// and an unparseable file is logged and treated the same way (the
    /// next successful save overwrites it).
    pub async fn load(path: PathBuf) -> Self {
        let state = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => match serde_json::from_str::<HashMap<String, Token>>(&contents) {
                Ok(tokens) => {
                    info!(path = %path.display(), services = tokens.len(), "loaded persisted tokens");
                    tokens
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "token file unparseable, starting empty");
                    HashMap::new()
                }
            },
            Err(_) => {
                debug!(path = %path.display(), "no token file, starting empty");
                HashMap::new()
            }
        };

        Self {
            path: Some(path),
            state: Mutex::new(state),
        }
    }

    /// A store with no backing file. Tokens live for the process only.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(HashMap::new()),
        }
    }

    /// Get a clone of a service's token.
    pub async fn get(&self, service: &str) -> Option<Token> {
        let state = self.state.lock().await;
        state.get(service).cloned()
    }

    /// Store or replace a service's token and persist the snapshot.
    pub async fn insert(&self, service: &str, token: Token) {
        let mut state = self.state.lock().await;
        state.insert(service.to_owned(), token);
        debug!(service, "stored token");
        self.persist(&state).await;
    }

    /// Remove a service's token, persisting if anything was removed.
    /// Returns whether a token was present.
    pub async fn remove(&self, service: &str) -> bool {
        let mut state = self.state.lock().await;
        let removed = state.remove(service).is_some();
        if removed {
            debug!(service, "removed token");
            self.persist(&state).await;
        }
        removed
    }

    /// Names of services with a stored token, sorted for stable output.
    pub async fn services(&self) -> Vec<String> {
        let mut names: Vec<String> = self.state.lock().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of stored tokens.
    pub async fn len(&self) -> usize {
        self.state.lock().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Best-effort snapshot write. Failures are logged and counted,
    /// never propagated — the in-memory state remains authoritative.
    async fn persist(&self, state: &HashMap<String, Token>) {
        let Some(path) = &self.path else { return };
        if let Err(e) = write_atomic(path, state).await {
            warn!(path = %path.display(), error = %e, "failed to persist tokens");
            metrics::counter!("oauth_token_store_persist_failures_total").increment(1);
        }
    }
}

/// Write the token snapshot atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target, so a crash mid-write cannot corrupt the file. Permissions
/// are 0600 since the file contains live credentials.
async fn write_atomic(path: &Path, data: &HashMap<String, Token>) -> std::io::Result<()> {
    let json = serde_json::to_string_pretty(data).map_err(std::io::Error::other)?;

    let dir = path.parent().ok_or_else(|| {
        std::io::Error::other("token store path has no parent directory")
    })?;
    let tmp_path = dir.join(format!(".oauth_tokens.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes()).await?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms).await?;
    }

    tokio::fs::rename(&tmp_path, path).await?;

    debug!(path = %path.display(), "persisted tokens");
    Ok(())
}
