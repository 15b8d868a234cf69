//! Bounded article cache.
//!
//! This module provides an article cache with:
//! - LRU-style eviction by entry count
//! - Expiry of entries idle for longer than a configured duration
//! - Coalesced concurrent misses (one body read per entry)

use log::{trace, warn};
use quick_cache::sync::Cache;
use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::body::ArticleSource;
use crate::index::IndexEntry;

/// Default capacity for compressed (`.dict.dz`) bodies.
pub const DEFAULT_COMPRESSED_CAPACITY: usize = 1_000;

/// Default idle expiry for compressed bodies.
pub const DEFAULT_COMPRESSED_IDLE: Duration = Duration::from_secs(15 * 60);

/// Default capacity for plain (`.dict`) bodies.
pub const DEFAULT_PLAIN_CAPACITY: usize = 500;

/// Default idle expiry for plain bodies.
pub const DEFAULT_PLAIN_IDLE: Duration = Duration::from_secs(5 * 60);

/// Configuration for the article cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of articles in the cache.
    pub cache_capacity: usize,
    /// Articles not accessed for this long are reloaded on next access.
    ///
    /// Expiry is checked on lookup only. An idle article keeps its slot
    /// until it is looked up again or evicted by capacity.
    pub idle_timeout: Duration,
    /// Whether to enable caching.
    pub cache_enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::for_plain()
    }
}

impl CacheConfig {
    /// Defaults for a dictzip body: decompression is costly, keep more for longer.
    pub fn for_compressed() -> Self {
        Self {
            cache_capacity: DEFAULT_COMPRESSED_CAPACITY,
            idle_timeout: DEFAULT_COMPRESSED_IDLE,
            cache_enabled: true,
        }
    }

    /// Defaults for a plain `.dict` body.
    pub fn for_plain() -> Self {
        Self {
            cache_capacity: DEFAULT_PLAIN_CAPACITY,
            idle_timeout: DEFAULT_PLAIN_IDLE,
            cache_enabled: true,
        }
    }

    /// Create a new configuration with the specified cache capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache_capacity: capacity,
            ..Self::for_plain()
        }
    }

    /// Set the idle expiry. Expired articles are dropped lazily, on their
    /// next lookup.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Create a configuration with caching disabled.
    pub fn no_cache() -> Self {
        Self {
            cache_capacity: 0,
            idle_timeout: Duration::ZERO,
            cache_enabled: false,
        }
    }
}

/// Cached article text with its last access time.
struct CachedArticle {
    text: Arc<str>,
    /// Milliseconds since the cache epoch
    last_access: AtomicU64,
}

/// Article cache keyed by [`IndexEntry`] value.
pub struct ArticleCache {
    cache: Option<Cache<IndexEntry, Arc<CachedArticle>>>,
    config: CacheConfig,
    epoch: Instant,
    hits: AtomicU64,
    reads: AtomicU64,
}

impl ArticleCache {
    /// Create a cache with the given configuration.
    pub fn new(config: CacheConfig) -> Self {
        let cache = if config.cache_enabled && config.cache_capacity > 0 {
            Some(Cache::new(config.cache_capacity))
        } else {
            None
        };

        Self {
            cache,
            config,
            epoch: Instant::now(),
            hits: AtomicU64::new(0),
            reads: AtomicU64::new(0),
        }
    }

    /// Get the article for `entry`, reading it from `source` on a miss.
    ///
    /// Returns `None` when the article cannot be read or is not valid
    /// UTF-8. Failures are not cached.
    pub fn get(&self, entry: &IndexEntry, source: &dyn ArticleSource) -> Option<Arc<str>> {
        let cache = match self.cache {
            Some(ref cache) => cache,
            None => return self.load(entry, source).ok(),
        };

        let now = self.now_millis();
        if let Some(hit) = cache.get(entry) {
            let idle = now.saturating_sub(hit.last_access.load(Ordering::Relaxed));
            if Duration::from_millis(idle) <= self.config.idle_timeout {
                hit.last_access.store(now, Ordering::Relaxed);
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(hit.text.clone());
            }
            trace!("Article at {}+{} expired", entry.offset, entry.length);
            cache.remove(entry);
        }

        cache
            .get_or_insert_with(entry, || {
                self.load(entry, source).map(|text| {
                    Arc::new(CachedArticle {
                        text,
                        last_access: AtomicU64::new(now),
                    })
                })
            })
            .ok()
            .map(|article| article.text.clone())
    }

    fn load(&self, entry: &IndexEntry, source: &dyn ArticleSource) -> io::Result<Arc<str>> {
        trace!("Reading article at {}+{}", entry.offset, entry.length);
        self.reads.fetch_add(1, Ordering::Relaxed);

        let result = source.read_at(entry.offset, entry.length).and_then(|bytes| {
            String::from_utf8(bytes)
                .map(Arc::from)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
        });
        if let Err(ref e) = result {
            warn!(
                "Article at {}+{} is unavailable: {}",
                entry.offset, entry.length, e
            );
        }
        result
    }

    fn now_millis(&self) -> u64 {
        self.epoch.elapsed().as_millis() as u64
    }

    /// Clear the cache.
    pub fn clear(&self) {
        if let Some(ref cache) = self.cache {
            cache.clear();
        }
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let (capacity, len, enabled) = match self.cache {
            Some(ref cache) => (self.config.cache_capacity, cache.len(), true),
            None => (0, 0, false),
        };
        CacheStats {
            capacity,
            len,
            enabled,
            hits: self.hits.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    /// Maximum cache capacity.
    pub capacity: usize,
    /// Current number of entries in the cache.
    pub len: usize,
    /// Whether caching is enabled.
    pub enabled: bool,
    /// Lookups served from the cache.
    pub hits: u64,
    /// Reads issued to the body.
    pub reads: u64,
}
