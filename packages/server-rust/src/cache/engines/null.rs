//! No-op [`CacheBackend`] implementation.
//!
//! [`NullCache`] drops every write and misses every read, so each
//! repository read goes to the store.

use std::time::Duration;

use async_trait::async_trait;
use folio_core::CacheKey;

use crate::cache::CacheBackend;
use crate::context::RequestContext;

/// Cache that never holds anything.
pub struct NullCache;

#[async_trait]
impl CacheBackend for NullCache {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn get(&self, _ctx: &RequestContext, _key: &CacheKey) -> anyhow::Result<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn set(
        &self,
        _ctx: &RequestContext,
        _key: &CacheKey,
        _value: Vec<u8>,
        _ttl: Duration,
    ) -> anyhow::Result<()> {
        Ok(())
    }
}
