//! In-process response cache.
//!
//! Stands in for an edge cache: keyed by request path, entries expire after
//! a fixed TTL. Cloning is cheap (shared inner), so the HTTP layer can hand
//! a copy to a background task for a non-blocking write.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;

/// A cached API response body.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub body: String,
}

#[derive(Debug)]
struct Entry {
    response: CachedResponse,
    stored_at: Instant,
}

/// TTL response cache keyed by request path.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
    ttl: Duration,
}

impl ResponseCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Look up a fresh entry. Expired entries are evicted on read.
    pub async fn get(&self, key: &str) -> Option<CachedResponse> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                    return Some(entry.response.clone());
                }
                Some(_) => {} // stale, fall through to evict
                None => return None,
            }
        }

        let mut entries = self.entries.write().await;
        // Re-check under the write lock: a concurrent put may have
        // refreshed the entry.
        match entries.get(key) {
            Some(entry) if entry.stored_at.elapsed() < self.ttl => Some(entry.response.clone()),
            _ => {
                entries.remove(key);
                debug!(key, "Evicted stale cache entry");
                None
            }
        }
    }

    /// Store a response under the given key, replacing any previous entry.
    pub async fn put(&self, key: &str, response: CachedResponse) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.to_string(),
            Entry {
                response,
                stored_at: Instant::now(),
            },
        );
        debug!(key, "Cached response");
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
