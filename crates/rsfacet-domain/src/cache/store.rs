//! Cache store for unfiltered facet results.
//!
//! [`MokaFacetStore`] keeps results in a Moka async cache:
//! - Lock-free concurrent reads
//! - Automatic TTL-based eviction
//! - Memory-bounded storage
//!
//! Concurrent misses for the same key both write; the stored content is
//! actor-independent so the last write wins harmlessly.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use super::FacetCacheKey;
use crate::model::FacetData;

/// Key-value store for unfiltered facet results.
///
/// Eviction policy is owned by the implementation or an external cache
/// manager; the facet cache only reads and writes.
#[async_trait]
pub trait FacetCacheStore: Send + Sync {
    async fn get(&self, key: &FacetCacheKey) -> Option<Arc<FacetData>>;

    async fn set(&self, key: FacetCacheKey, data: Arc<FacetData>);

    async fn invalidate(&self, key: &FacetCacheKey);

    async fn invalidate_all(&self);
}

/// Configuration for the facet cache store.
#[derive(Debug, Clone)]
pub struct FacetCacheConfig {
    /// Whether caching is enabled. A disabled store always misses.
    pub enabled: bool,
    /// Maximum number of cached results.
    pub max_capacity: u64,
    /// Time-to-live of an entry.
    pub default_ttl: Duration,
}

impl Default for FacetCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_capacity: 10_000,
            default_ttl: Duration::from_secs(300),
        }
    }
}

impl FacetCacheConfig {
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = max_capacity;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }
}

/// In-process [`FacetCacheStore`] with TTL and capacity bounds.
///
/// Cloning shares the underlying cache.
#[derive(Clone)]
pub struct MokaFacetStore {
    cache: Cache<FacetCacheKey, Arc<FacetData>>,
    config: FacetCacheConfig,
}

impl std::fmt::Debug for MokaFacetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaFacetStore")
            .field("config", &self.config)
            .field("entry_count", &self.cache.entry_count())
            .finish()
    }
}

impl MokaFacetStore {
    pub fn new(config: FacetCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.default_ttl)
            .build();

        Self { cache, config }
    }

    pub fn config(&self) -> &FacetCacheConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Returns the approximate number of entries in the cache.
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs pending maintenance tasks such as expirations.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }

    /// Invalidates entries whose key matches a predicate.
    pub async fn invalidate_matching<F>(&self, predicate: F)
    where
        F: Fn(&FacetCacheKey) -> bool,
    {
        self.cache.run_pending_tasks().await;

        let keys_to_remove: Vec<FacetCacheKey> = self
            .cache
            .iter()
            .filter(|(k, _)| predicate(k.as_ref()))
            .map(|(k, _)| (*k).clone())
            .collect();

        for key in keys_to_remove {
            self.cache.invalidate(&key).await;
        }
    }
}

#[async_trait]
impl FacetCacheStore for MokaFacetStore {
    /// Records hit/miss to `rsfacet_cache_hits_total` and
    /// `rsfacet_cache_misses_total`.
    async fn get(&self, key: &FacetCacheKey) -> Option<Arc<FacetData>> {
        if !self.config.enabled {
            return None;
        }

        let result = self.cache.get(key).await;
        if result.is_some() {
            metrics::counter!("rsfacet_cache_hits_total").increment(1);
        } else {
            metrics::counter!("rsfacet_cache_misses_total").increment(1);
        }
        result
    }

    async fn set(&self, key: FacetCacheKey, data: Arc<FacetData>) {
        if self.config.enabled {
            self.cache.insert(key, data).await;
        }
    }

    async fn invalidate(&self, key: &FacetCacheKey) {
        self.cache.invalidate(key).await;
    }

    async fn invalidate_all(&self) {
        self.cache.invalidate_all();
        self.cache.run_pending_tasks().await;
    }
}
