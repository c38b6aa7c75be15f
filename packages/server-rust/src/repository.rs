//! Cache-aside book repository.
//!
//! Every read of [`CachedBookRepository`] follows the same path:
//!
//! ```text
//! lookup ─┬─ hit ──────────────────────────────────> return cached
//!         ├─ miss ─────────┐
//!         └─ decode error ─┴─> fetch ─┬─ ok ──> populate ──> return fresh
//!                                     └─ err ─────────────> return err
//! ```
//!
//! Cache failures of any kind degrade to the store path and are never
//! surfaced. Store failures are returned unchanged. Writes go straight to
//! the store and leave existing cache entries alone; readers may see a
//! result up to one TTL old.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use folio_core::{Book, CacheKey, Codec, NewBook, QueryShape, BOOKS_NAMESPACE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, debug_span, field, warn, Instrument, Span};

use crate::cache::CacheBackend;
use crate::context::RequestContext;
use crate::storage::BookStore;

/// How long a populated entry stays readable.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Tuning for [`CachedBookRepository`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    pub ttl: Duration,
    /// Encoding of cached payloads.
    pub codec: Codec,
    /// Prefix of every cache key.
    pub namespace: String,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_CACHE_TTL,
            codec: Codec::Json,
            namespace: BOOKS_NAMESPACE.to_string(),
        }
    }
}

impl RepositoryConfig {
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

/// Whether a freshly fetched result should be written back.
trait Cacheable {
    fn is_cacheable(&self) -> bool;
}

impl Cacheable for Vec<Book> {
    fn is_cacheable(&self) -> bool {
        true
    }
}

// Absence is not cached: a record created after a miss must be visible
// on the next read.
impl Cacheable for Option<Book> {
    fn is_cacheable(&self) -> bool {
        self.is_some()
    }
}

enum Lookup<T> {
    Hit(T),
    Miss,
    Corrupt,
}

/// Book repository that shields a [`BookStore`] behind a [`CacheBackend`].
///
/// Holds no mutable state of its own; share it as `Arc<CachedBookRepository>`.
pub struct CachedBookRepository {
    store: Arc<dyn BookStore>,
    cache: Arc<dyn CacheBackend>,
    config: RepositoryConfig,
}

impl CachedBookRepository {
    #[must_use]
    pub fn new(
        store: Arc<dyn BookStore>,
        cache: Arc<dyn CacheBackend>,
        config: RepositoryConfig,
    ) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    #[must_use]
    pub fn cache_name(&self) -> &'static str {
        self.cache.name()
    }

    /// Creates a record in the store. The cache is not touched.
    ///
    /// # Errors
    ///
    /// Returns the store's error unchanged.
    pub async fn create(&self, ctx: &RequestContext, book: NewBook) -> anyhow::Result<String> {
        ctx.run(self.store.create(ctx, book)).await?
    }

    /// Deletes a record from the store. The cache is not touched.
    ///
    /// # Errors
    ///
    /// Returns the store's error unchanged.
    pub async fn delete(&self, ctx: &RequestContext, id: &str) -> anyhow::Result<String> {
        ctx.run(self.store.delete(ctx, id)).await?
    }

    /// # Errors
    ///
    /// Returns the store's error unchanged.
    pub async fn get_by_id(&self, ctx: &RequestContext, id: &str) -> anyhow::Result<Option<Book>> {
        let shape = QueryShape::ById(id.to_string());
        self.read_through(ctx, &shape, || self.store.get_by_id(ctx, id))
            .await
    }

    /// # Errors
    ///
    /// Returns the store's error unchanged.
    pub async fn get_all(&self, ctx: &RequestContext) -> anyhow::Result<Vec<Book>> {
        self.read_through(ctx, &QueryShape::All, || self.store.get_all(ctx))
            .await
    }

    /// # Errors
    ///
    /// Returns the store's error unchanged.
    pub async fn get_by_author(
        &self,
        ctx: &RequestContext,
        author: &str,
    ) -> anyhow::Result<Vec<Book>> {
        let shape = QueryShape::ByAuthor(author.to_string());
        self.read_through(ctx, &shape, || self.store.get_by_author(ctx, author))
            .await
    }

    /// # Errors
    ///
    /// Returns the store's error unchanged.
    pub async fn get_by_publisher(
        &self,
        ctx: &RequestContext,
        publisher: &str,
    ) -> anyhow::Result<Vec<Book>> {
        let shape = QueryShape::ByPublisher(publisher.to_string());
        self.read_through(ctx, &shape, || self.store.get_by_publisher(ctx, publisher))
            .await
    }

    /// # Errors
    ///
    /// Returns the store's error unchanged.
    pub async fn get_by_language(
        &self,
        ctx: &RequestContext,
        language: &str,
    ) -> anyhow::Result<Vec<Book>> {
        let shape = QueryShape::ByLanguage(language.to_string());
        self.read_through(ctx, &shape, || self.store.get_by_language(ctx, language))
            .await
    }

    /// # Errors
    ///
    /// Returns the store's error unchanged.
    pub async fn get_by_genre(
        &self,
        ctx: &RequestContext,
        genre: &str,
    ) -> anyhow::Result<Vec<Book>> {
        let shape = QueryShape::ByGenre(genre.to_string());
        self.read_through(ctx, &shape, || self.store.get_by_genre(ctx, genre))
            .await
    }

    async fn read_through<T, F, Fut>(
        &self,
        ctx: &RequestContext,
        shape: &QueryShape,
        load: F,
    ) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned + Cacheable,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let key = CacheKey::of(&self.config.namespace, shape);
        let span = debug_span!(
            "read_through",
            key = %key,
            trace_id = %ctx.trace_id,
            outcome = field::Empty
        );

        async move {
            match self.lookup::<T>(ctx, &key).await {
                Lookup::Hit(value) => {
                    Span::current().record("outcome", "hit");
                    debug!("cache hit");
                    return Ok(value);
                }
                Lookup::Miss => {
                    Span::current().record("outcome", "miss");
                }
                Lookup::Corrupt => {
                    Span::current().record("outcome", "decode_error");
                }
            }

            let fresh = ctx.run(load()).await??;
            if fresh.is_cacheable() {
                self.populate(ctx, &key, &fresh).await;
            }
            Ok(fresh)
        }
        .instrument(span)
        .await
    }

    async fn lookup<T: DeserializeOwned>(&self, ctx: &RequestContext, key: &CacheKey) -> Lookup<T> {
        let raw = match ctx.run(self.cache.get(ctx, key)).await {
            Ok(Ok(Some(raw))) => raw,
            Ok(Ok(None)) => return Lookup::Miss,
            Ok(Err(err)) => {
                warn!(cache = self.cache.name(), error = %format!("{err:#}"), "cache read failed");
                return Lookup::Miss;
            }
            Err(interrupted) => {
                warn!(cache = self.cache.name(), error = %interrupted, "cache read interrupted");
                return Lookup::Miss;
            }
        };

        match self.config.codec.decode(&raw) {
            Ok(value) => Lookup::Hit(value),
            Err(err) => {
                warn!(
                    cache = self.cache.name(),
                    codec = %self.config.codec,
                    error = %format!("{err:#}"),
                    "discarding undecodable cache entry"
                );
                Lookup::Corrupt
            }
        }
    }

    /// Best-effort write-back. Failures are logged and dropped.
    async fn populate<T: Serialize>(&self, ctx: &RequestContext, key: &CacheKey, value: &T) {
        let bytes = match self.config.codec.encode(value) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "failed to encode cache entry");
                return;
            }
        };

        match ctx
            .run(self.cache.set(ctx, key, bytes, self.config.ttl))
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(cache = self.cache.name(), error = %format!("{err:#}"), "cache write failed");
            }
            Err(interrupted) => {
                warn!(cache = self.cache.name(), error = %interrupted, "cache write interrupted");
            }
        }
    }
}
