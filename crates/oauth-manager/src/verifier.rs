//! In-flight PKCE verifier cache
//!
//! Ephemeral mapping from `(service, state)` to the code verifier issued
//! with an authorization URL, alive only for the duration of the
//! authorization round trip. Each entry is consumed exactly once:
//! retrieval removes it, so a replayed state finds nothing. Entries
//! carry a TTL so abandoned authorization attempts cannot accumulate or
//! leave stale states valid indefinitely — expiry is checked lazily on
//! access and expired entries are pruned on each insert, so no
//! background sweep task is needed.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::debug;

/// How long an unconsumed verifier entry stays valid.
pub const DEFAULT_VERIFIER_TTL: Duration = Duration::from_secs(600);

struct VerifierEntry {
    verifier: String,
    issued_at: Instant,
}

impl VerifierEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.issued_at.elapsed() >= ttl
    }
}

/// Process-wide cache of in-flight PKCE verifiers, shared by all
/// authorization attempts across all services.
pub struct VerifierCache {
    ttl: Duration,
    entries: Mutex<HashMap<(String, String), VerifierEntry>>,
}

impl VerifierCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Store a verifier for `(service, state)`, overwriting any existing
    /// entry for the same key. Prunes expired entries as a side effect.
    pub async fn put(&self, service: &str, state: &str, verifier: String) {
        let mut entries = self.entries.lock().await;
        entries.retain(|_, entry| !entry.is_expired(self.ttl));
        entries.insert(
            (service.to_owned(), state.to_owned()),
            VerifierEntry {
                verifier,
                issued_at: Instant::now(),
            },
        );
        debug!(service, in_flight = entries.len(), "stored pkce verifier");
    }

    /// Atomically retrieve and delete the verifier for `(service, state)`.
    ///
    /// Returns `None` for an absent, already-consumed, or expired entry —
    /// all three look identical to the caller, which treats them as a
    /// state mismatch.
    pub async fn take(&self, service: &str, state: &str) -> Option<String> {
        let mut entries = self.entries.lock().await;
        let entry = entries.remove(&(service.to_owned(), state.to_owned()))?;
        if entry.is_expired(self.ttl) {
            debug!(service, "pkce verifier expired");
            return None;
        }
        Some(entry.verifier)
    }

    /// Number of in-flight entries (expired or not).
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether the cache holds no entries.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn take_consumes_exactly_once() {
        let cache = VerifierCache::new(DEFAULT_VERIFIER_TTL);
        cache.put("salesforce", "state-1", "ver-1".into()).await;

        assert_eq!(cache.take("salesforce", "state-1").await.as_deref(), Some("ver-1"));
        assert_eq!(cache.take("salesforce", "state-1").await, None, "second take must miss");
    }

    #[tokio::test]
    async fn unknown_state_misses() {
        let cache = VerifierCache::new(DEFAULT_VERIFIER_TTL);
        cache.put("salesforce", "state-1", "ver-1".into()).await;
        assert_eq!(cache.take("salesforce", "forged-state").await, None);
        // A miss must not disturb the real entry
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn keys_are_scoped_per_service() {
        let cache = VerifierCache::new(DEFAULT_VERIFIER_TTL);
        cache.put("salesforce", "state-1", "ver-sf".into()).await;
        cache.put("hubspot", "state-1", "ver-hs".into()).await;

        assert_eq!(cache.take("hubspot", "state-1").await.as_deref(), Some("ver-hs"));
        assert_eq!(cache.take("salesforce", "state-1").await.as_deref(), Some("ver-sf"));
    }

    #[tokio::test]
    async fn put_overwrites_same_key() {
        let cache = VerifierCache::new(DEFAULT_VERIFIER_TTL);
        cache.put("slack", "state-1", "ver-old".into()).await;
        cache.put("slack", "state-1", "ver-new".into()).await;

        assert_eq!(cache.take("slack", "state-1").await.as_deref(), Some("ver-new"));
        assert!(cache.is_empty().await);
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss() {
        let cache = VerifierCache::new(Duration::ZERO);
        cache.put("zendesk", "state-1", "ver-1".into()).await;
        assert_eq!(cache.take("zendesk", "state-1").await, None);
    }

    #[tokio::test]
    async fn put_prunes_expired_entries() {
        let cache = VerifierCache::new(Duration::ZERO);
        cache.put("zendesk", "state-1", "ver-1".into()).await;
        cache.put("zendesk", "state-2", "ver-2".into()).await;
        // The first entry expired instantly and was pruned by the second put
        assert_eq!(cache.len().await, 1);
    }
}
