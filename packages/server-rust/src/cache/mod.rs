//! Byte-oriented cache backends used by the read-through repository.
//!
//! A [`CacheBackend`] stores opaque encoded payloads under a
//! [`CacheKey`] with a per-entry TTL. It knows nothing about books or
//! codecs; the repository encodes before [`set`](CacheBackend::set) and
//! decodes after [`get`](CacheBackend::get).

pub mod engines;

use std::time::Duration;

use async_trait::async_trait;
use folio_core::CacheKey;

use crate::context::RequestContext;

pub use engines::{MemoryCache, NullCache};

/// Key-value cache with per-entry expiry.
///
/// Used as `Arc<dyn CacheBackend>`.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short identifier for logs.
    fn name(&self) -> &'static str;

    /// Returns the payload stored under `key`, or `None` if absent or expired.
    async fn get(&self, ctx: &RequestContext, key: &CacheKey) -> anyhow::Result<Option<Vec<u8>>>;

    /// Stores `value` under `key`, replacing any existing entry. The entry
    /// is no longer returned once `ttl` has elapsed.
    async fn set(
        &self,
        ctx: &RequestContext,
        key: &CacheKey,
        value: Vec<u8>,
        ttl: Duration,
    ) -> anyhow::Result<()>;
}
