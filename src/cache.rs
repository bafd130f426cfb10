//! Short-lived result cache
//!
//! Keys are blake3 digests of the normalized request URL paired with the
//! domain config that serves it. Entries expire on
//! a monotonic clock and are evicted lazily on read; `purge_expired` and the
//! optional sweeper task reclaim memory for keys nobody asks for again.
//!
//! # Example
//!
//! ```rust
//! use newsdesk_extract::cache::ResultCache;
//! use newsdesk_extract::ExtractionResult;
//! use std::time::Duration;
//!
//! let cache = ResultCache::new(Duration::from_secs(300));
//! let key = ResultCache::key_for("https://example.com/a?b=1#top", "example").unwrap();
//! cache.put(key.clone(), ExtractionResult::new("https://example.com/a", "example", "<p>x</p>".into()));
//! assert!(cache.get(&key).is_some());
//! ```

use crate::error::Result;
use crate::result::ExtractionResult;
use crate::urls;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Default time-to-live for cached results
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Hex characters of the key exposed in diagnostics
const HASH_PREFIX_LEN: usize = 8;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: ExtractionResult,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Remaining lifetime of one entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntryStats {
    /// Truncated key hash
    pub url_hash: String,
    /// Whole seconds until expiry
    pub expires_in_seconds: u64,
}

/// Snapshot of cache occupancy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Live entry count
    pub size: usize,
    /// Configured TTL
    pub ttl_seconds: u64,
    /// Per-entry lifetimes, sorted by hash
    pub entries: Vec<CacheEntryStats>,
}

/// Concurrency-safe TTL cache of extraction results
#[derive(Debug)]
pub struct ResultCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl ResultCache {
    /// Create a cache whose entries live for `ttl`
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Cache key of a request URL extracted with the `domain_name` config
    pub fn key_for(url: &str, domain_name: &str) -> Result<String> {
        let normalized = urls::normalize(url)?;
        let mut hasher = blake3::Hasher::new();
        hasher.update(normalized.as_bytes());
        hasher.update(b":");
        hasher.update(domain_name.as_bytes());
        Ok(hasher.finalize().to_hex().to_string())
    }

    /// Configured TTL
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Live value for `key`; a stale entry is removed on the way out
    pub fn get(&self, key: &str) -> Option<ExtractionResult> {
        let now = Instant::now();
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(entry) if entry.is_live(now) => {
                    debug!(key = %short(key), "Cache HIT");
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => {
                    debug!(key = %short(key), "Cache MISS");
                    return None;
                }
            }
        }

        // Re-check under the write lock; a concurrent put may have refreshed it
        let mut entries = self.entries.write();
        match entries.get(key) {
            Some(entry) if entry.is_live(Instant::now()) => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                debug!(key = %short(key), "Cache EXPIRED");
                None
            }
            None => None,
        }
    }

    /// Insert or replace with the default TTL
    pub fn put(&self, key: String, value: ExtractionResult) {
        self.put_with_ttl(key, value, self.ttl);
    }

    /// Insert or replace with an explicit TTL
    pub fn put_with_ttl(&self, key: String, value: ExtractionResult, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        debug!(key = %short(&key), ttl_secs = ttl.as_secs(), "Cached result");
        self.entries.write().insert(key, entry);
    }

    /// Occupancy snapshot; expired entries are evicted first
    pub fn stats(&self) -> CacheStats {
        let now = Instant::now();
        let mut entries = self.entries.write();
        entries.retain(|_, e| e.is_live(now));

        let mut listed: Vec<CacheEntryStats> = entries
            .iter()
            .map(|(key, entry)| CacheEntryStats {
                url_hash: short(key).to_string(),
                expires_in_seconds: entry.expires_at.saturating_duration_since(now).as_secs(),
            })
            .collect();
        listed.sort_by(|a, b| a.url_hash.cmp(&b.url_hash));

        CacheStats {
            size: entries.len(),
            ttl_seconds: self.ttl.as_secs(),
            entries: listed,
        }
    }

    /// Empty the cache, returning how many entries were dropped
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.write();
        let count = entries.len();
        entries.clear();
        info!("Cache cleared. Removed {} entries.", count);
        count
    }

    /// Drop every expired entry, returning how many went
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, e| e.is_live(now));
        before - entries.len()
    }

    /// Number of stored entries, including any not yet evicted
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether nothing is stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Periodically purge expired entries until the task is aborted
    pub fn spawn_sweeper(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let purged = cache.purge_expired();
                if purged > 0 {
                    debug!("Sweeper purged {} expired entries", purged);
                }
            }
        })
    }
}

fn short(key: &str) -> &str {
    key.get(..HASH_PREFIX_LEN).unwrap_or(key)
}
