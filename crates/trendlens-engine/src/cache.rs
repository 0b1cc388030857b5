//! Time-bounded memo store for tool results.
//!
//! Concurrent misses on one key are not coalesced: each caller computes and
//! the last write wins. The lock is never held while a computation runs.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use trendlens_core::Timeframe;

/// Canonical identity of a cached result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    operation: String,
    keywords: Vec<String>,
    timeframe: Option<String>,
    scope: Option<String>,
}

impl CacheKey {
    #[must_use]
    pub fn new(operation: &str) -> Self {
        Self {
            operation: operation.to_string(),
            keywords: Vec::new(),
            timeframe: None,
            scope: None,
        }
    }

    /// Keywords are trimmed, lowercased and whitespace-collapsed; order is kept.
    #[must_use]
    pub fn keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.keywords = keywords
            .into_iter()
            .map(|k| canonical_keyword(k.as_ref()))
            .collect();
        self
    }

    #[must_use]
    pub fn timeframe(mut self, timeframe: Timeframe) -> Self {
        self.timeframe = Some(timeframe.label());
        self
    }

    /// Source filter, discovery category, or any other discriminator.
    #[must_use]
    pub fn scope(mut self, scope: &str) -> Self {
        self.scope = Some(scope.trim().to_lowercase());
        self
    }
}

/// Lowercase, trim, and collapse internal whitespace.
#[must_use]
pub fn canonical_keyword(raw: &str) -> String {
    raw.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

struct CacheEntry<V> {
    value: V,
    created_at: Instant,
    ttl: Duration,
    last_accessed: Instant,
}

impl<V> CacheEntry<V> {
    fn is_live(&self, now: Instant) -> bool {
        now.duration_since(self.created_at) < self.ttl
    }
}

pub struct ResultCache<V> {
    entries: Mutex<HashMap<CacheKey, CacheEntry<V>>>,
    max_entries: usize,
}

impl<V: Clone> ResultCache<V> {
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_entries,
        }
    }

    /// Return a clone of the live value for `key`, if any.
    pub async fn get(&self, key: &CacheKey) -> Option<V> {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        match entries.get_mut(key) {
            Some(entry) if entry.is_live(now) => {
                entry.last_accessed = now;
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Store `value` under `key`, evicting to stay within capacity.
    pub async fn insert(&self, key: CacheKey, value: V, ttl: Duration) {
        if self.max_entries == 0 {
            return;
        }
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        if !entries.contains_key(&key) && entries.len() >= self.max_entries {
            entries.retain(|_, e| e.is_live(now));
            if entries.len() >= self.max_entries {
                let oldest = entries
                    .iter()
                    .min_by_key(|(_, e)| e.last_accessed)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    tracing::debug!(key = ?oldest, "evicting least recently used cache entry");
                    entries.remove(&oldest);
                }
            }
        }
        entries.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                ttl,
                last_accessed: now,
            },
        );
    }

    /// Return the live value for `key` or run `compute` once and store its result.
    pub async fn get_or_compute<F, Fut>(&self, key: CacheKey, ttl: Duration, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if let Some(hit) = self.get(&key).await {
            tracing::debug!(key = ?key, "cache hit");
            return hit;
        }
        let value = compute().await;
        self.insert(key, value.clone(), ttl).await;
        value
    }

    /// Like [`Self::get_or_compute`], but only `Ok` results are stored.
    ///
    /// # Errors
    ///
    /// Returns whatever error `compute` returns.
    pub async fn try_get_or_compute<F, Fut, E>(
        &self,
        key: CacheKey,
        ttl: Duration,
        compute: F,
    ) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(hit) = self.get(&key).await {
            tracing::debug!(key = ?key, "cache hit");
            return Ok(hit);
        }
        let value = compute().await?;
        self.insert(key, value.clone(), ttl).await;
        Ok(value)
    }

    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    /// Number of stored entries, expired ones included until they are evicted.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
