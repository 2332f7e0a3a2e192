// ABOUTME: In-memory cache implementation with LRU eviction and TTL support
// ABOUTME: Entries are stored serialized and dropped on read once their TTL has elapsed
//
// Licensed under either of Apache License, Version 2.0 or MIT License at your option.
// Copyright ©2025 Async-IO.org

use super::{CacheConfig, CacheKey, CacheStore, CachedVitals};
use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;
use vitals_core::errors::AppResult;

/// In-memory cache entry with expiration
#[derive(Debug, Clone)]
struct CacheEntry {
    data: Vec<u8>,
    stored_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn new(data: Vec<u8>, ttl: Duration) -> Self {
        Self {
            data,
            stored_at: Instant::now(),
            ttl,
        }
    }

    // age >= ttl is a miss
    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() >= self.ttl
    }
}

/// In-memory cache with LRU eviction
///
/// `LruCache` gives O(1) eviction of the least-recently-used entry once
/// `max_entries` is reached; expired entries are removed when read.
#[derive(Clone)]
pub struct InMemoryCache {
    store: Arc<RwLock<LruCache<String, CacheEntry>>>,
}

impl InMemoryCache {
    /// Capacity used when config specifies zero entries
    const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
        Some(n) => n,
        None => unreachable!(),
    };

    /// Create a cache bounded by `config.max_entries`
    #[must_use]
    pub fn new(config: &CacheConfig) -> Self {
        let capacity =
            NonZeroUsize::new(config.max_entries).unwrap_or(Self::DEFAULT_CACHE_CAPACITY);
        Self {
            store: Arc::new(RwLock::new(LruCache::new(capacity))),
        }
    }

    /// Number of stored entries, including expired ones not yet read
    pub async fn len(&self) -> usize {
        self.store.read().await.len()
    }

    /// Whether the store holds no entries
    pub async fn is_empty(&self) -> bool {
        self.store.read().await.is_empty()
    }

    /// Remaining TTL of a live entry
    pub async fn ttl(&self, key: &CacheKey) -> Option<Duration> {
        let store = self.store.read().await;
        // peek does not update LRU order
        store
            .peek(&key.to_string())
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.ttl.saturating_sub(entry.stored_at.elapsed()))
    }
}

#[async_trait]
impl CacheStore for InMemoryCache {
    async fn get(&self, key: &CacheKey) -> AppResult<Option<CachedVitals>> {
        let key = key.to_string();
        let mut store = self.store.write().await;

        // LruCache::get is mutable (updates access order for LRU)
        let Some(entry) = store.get(&key) else {
            drop(store);
            debug!(cache_key = %key, "Cache miss");
            return Ok(None);
        };

        if entry.is_expired() {
            store.pop(&key);
            drop(store);
            debug!(cache_key = %key, "Cache entry expired");
            return Ok(None);
        }

        let value: CachedVitals = serde_json::from_slice(&entry.data)?;
        drop(store);
        debug!(cache_key = %key, "Cache hit");
        Ok(Some(value))
    }

    async fn put(&self, key: &CacheKey, value: &CachedVitals, ttl: Duration) -> AppResult<()> {
        let serialized = serde_json::to_vec(value)?;
        let entry = CacheEntry::new(serialized, ttl);

        // LruCache handles eviction automatically on push
        if let Some((evicted, _)) = self.store.write().await.push(key.to_string(), entry) {
            if evicted != key.to_string() {
                debug!(cache_key = %evicted, "Evicted least recently used cache entry");
            }
        }
        Ok(())
    }

    async fn invalidate(&self, key: &CacheKey) -> AppResult<()> {
        self.store.write().await.pop(&key.to_string());
        Ok(())
    }

    async fn invalidate_patient(&self, patient_id: Uuid) -> AppResult<u64> {
        let prefix = CacheKey::patient_prefix(patient_id);
        let mut store = self.store.write().await;

        // Collect keys to remove (can't modify while iterating)
        let keys_to_remove: Vec<String> = store
            .iter()
            .filter(|(k, _)| k.starts_with(&prefix))
            .map(|(k, _)| k.clone())
            .collect();

        for key in &keys_to_remove {
            store.pop(key);
        }
        drop(store);

        Ok(keys_to_remove.len() as u64)
    }

    async fn clear_all(&self) -> AppResult<()> {
        self.store.write().await.clear();
        Ok(())
    }
}
