//! In-process [`CacheBackend`] backed by [`quick_cache`].
//!
//! Entries carry their own expiry instant. An expired entry is dropped the
//! first time it is read; until then it only occupies capacity, and the
//! cache's own eviction reclaims it under pressure.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use folio_core::CacheKey;
use quick_cache::sync::Cache;
use tokio::time::Instant;

use crate::cache::CacheBackend;
use crate::context::RequestContext;

/// Default number of entries held before eviction kicks in.
pub const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Clone)]
struct Entry {
    value: Bytes,
    expires_at: Instant,
}

/// Bounded in-memory cache with per-entry TTL.
pub struct MemoryCache {
    entries: Cache<String, Entry>,
}

impl MemoryCache {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Cache::new(capacity.max(1)),
        }
    }

    /// Number of stored entries, including expired ones not yet read.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops the entry under `key` only if it is still expired at `now`; a
    /// concurrent writer may already have replaced it.
    fn evict_expired(&self, key: &CacheKey, now: Instant) {
        self.entries
            .remove_if(key.as_str(), |current| current.expires_at <= now);
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, ctx: &RequestContext, key: &CacheKey) -> anyhow::Result<Option<Vec<u8>>> {
        ctx.check()?;
        let Some(entry) = self.entries.get(key.as_str()) else {
            return Ok(None);
        };
        let now = Instant::now();
        if now >= entry.expires_at {
            self.evict_expired(key, now);
            return Ok(None);
        }
        Ok(Some(entry.value.to_vec()))
    }

    async fn set(
        &self,
        ctx: &RequestContext,
        key: &CacheKey,
        value: Vec<u8>,
        ttl: Duration,
    ) -> anyhow::Result<()> {
        ctx.check()?;
        let Some(expires_at) = Instant::now().checked_add(ttl) else {
            anyhow::bail!("cache ttl {ttl:?} is out of range");
        };
        let entry = Entry {
            value: Bytes::from(value),
            expires_at,
        };
        self.entries.insert(key.as_str().to_string(), entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use folio_core::QueryShape;

    use super::*;

    const TTL: Duration = Duration::from_secs(300);

    #[tokio::test]
    async fn get_returns_what_was_set() {
        let cache = MemoryCache::default();
        let ctx = RequestContext::new();
        let key = QueryShape::ByAuthor("Tolkien".into()).cache_key();

        assert!(cache.get(&ctx, &key).await.unwrap().is_none());
        cache.set(&ctx, &key, b"payload".to_vec(), TTL).await.unwrap();
        assert_eq!(cache.get(&ctx, &key).await.unwrap().as_deref(), Some(&b"payload"[..]));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn set_replaces_existing_entry() {
        let cache = MemoryCache::default();
        let ctx = RequestContext::new();
        let key = QueryShape::All.cache_key();

        cache.set(&ctx, &key, b"one".to_vec(), TTL).await.unwrap();
        cache.set(&ctx, &key, b"two".to_vec(), TTL).await.unwrap();
        assert_eq!(cache.get(&ctx, &key).await.unwrap().as_deref(), Some(&b"two"[..]));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn entry_expires_after_ttl() {
        let cache = MemoryCache::default();
        let ctx = RequestContext::new();
        let key = QueryShape::ByGenre("Noir".into()).cache_key();

        cache.set(&ctx, &key, b"[]".to_vec(), TTL).await.unwrap();

        tokio::time::advance(TTL - Duration::from_secs(1)).await;
        assert!(cache.get(&ctx, &key).await.unwrap().is_some());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(cache.get(&ctx, &key).await.unwrap().is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn unrepresentable_ttl_is_an_error() {
        let cache = MemoryCache::default();
        let ctx = RequestContext::new();
        let key = QueryShape::All.cache_key();

        let err = cache
            .set(&ctx, &key, b"[]".to_vec(), Duration::MAX)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn expired_read_keeps_fresh_replacement() {
        let cache = MemoryCache::default();
        let ctx = RequestContext::new();
        let key = QueryShape::ByAuthor("Tolkien".into()).cache_key();

        cache.set(&ctx, &key, b"old".to_vec(), TTL).await.unwrap();
        tokio::time::advance(TTL).await;
        cache.set(&ctx, &key, b"new".to_vec(), TTL).await.unwrap();

        // A reader that saw the old entry expire evicts as of its own clock.
        let seen_at = Instant::now();
        cache.evict_expired(&key, seen_at);
        assert_eq!(cache.get(&ctx, &key).await.unwrap().as_deref(), Some(&b"new"[..]));

        tokio::time::advance(TTL).await;
        cache.evict_expired(&key, Instant::now());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn distinct_shapes_do_not_collide() {
        let cache = MemoryCache::default();
        let ctx = RequestContext::new();
        let by_author = QueryShape::ByAuthor("x".into()).cache_key();
        let by_genre = QueryShape::ByGenre("x".into()).cache_key();

        cache.set(&ctx, &by_author, b"a".to_vec(), TTL).await.unwrap();
        assert!(cache.get(&ctx, &by_genre).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cancelled_context_is_an_error() {
        let cache = MemoryCache::default();
        let ctx = RequestContext::new();
        ctx.cancel();
        let key = QueryShape::All.cache_key();
        assert!(cache.get(&ctx, &key).await.is_err());
        assert!(cache.set(&ctx, &key, Vec::new(), TTL).await.is_err());
    }
}
