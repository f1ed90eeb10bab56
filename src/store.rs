use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

/// Entry held per token: the pseudonym it stands for and when the pair was
/// (last) recorded.
#[derive(Clone)]
struct TokenEntry {
    pseudonym: String,
    created_at: Instant,
}

/// In-memory, TTL-bounded token→pseudonym map.
///
/// Cloning is cheap and every clone shares the same backing map, so the
/// request handlers, the mediator and the background sweeper all operate on
/// one store. Entries leave the map only through `remove` or `sweep`; reads
/// never touch the clock.
#[derive(Clone, Default)]
pub struct TokenStore {
    entries: Arc<DashMap<String, TokenEntry>>,
}

impl TokenStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    /// Record a token→pseudonym pair, refreshing its age. Returns the
    /// pseudonym the token previously mapped to, if any.
    pub fn put(&self, token: impl Into<String>, pseudonym: impl Into<String>) -> Option<String> {
        let token = token.into();
        let pseudonym = pseudonym.into();
        tracing::debug!(token = %token, pseudonym = %pseudonym, "storing mapping");
        self.entries
            .insert(
                token,
                TokenEntry {
                    pseudonym,
                    created_at: Instant::now(),
                },
            )
            .map(|old| old.pseudonym)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    /// Look up without consuming. Does not refresh the entry's age.
    pub fn get(&self, token: &str) -> Option<String> {
        self.entries.get(token).map(|entry| entry.pseudonym.clone())
    }

    /// Remove a mapping, returning its pseudonym. Removing an absent token
    /// is a no-op.
    pub fn remove(&self, token: &str) -> Option<String> {
        let removed = self.entries.remove(token).map(|(_, entry)| entry.pseudonym);
        if removed.is_some() {
            tracing::debug!(token = %token, "consumed mapping");
        }
        removed
    }

    /// Evict every mapping strictly older than `ttl`; younger entries and
    /// entries aged exactly `ttl` survive. Returns the number evicted. Safe
    /// to call while other handles insert and remove.
    pub fn sweep(&self, ttl: Duration) -> usize {
        let now = Instant::now();
        // Counted inside the scan: concurrent puts shift the map size, so
        // comparing before/after lengths would miscount.
        let mut evicted = 0;
        self.entries.retain(|_, entry| {
            let fresh = now.duration_since(entry.created_at) <= ttl;
            if !fresh {
                evicted += 1;
            }
            fresh
        });
        evicted
    }

    /// Current number of live mappings (for logs / diagnostics).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
