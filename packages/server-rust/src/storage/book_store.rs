//! Backing-store trait for book records.
//!
//! Defines [`BookStore`], the source of truth the cache-aside repository
//! reads through to. Every lookup returns the full result set for one
//! [`QueryShape`](folio_core::QueryShape); an empty result is a valid answer,
//! not an error.

use async_trait::async_trait;
use folio_core::{Book, NewBook};

use crate::context::RequestContext;

/// Source of truth for book records.
///
/// Implementations must honor `ctx` and must not cache. Used as
/// `Arc<dyn BookStore>`.
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Persists a new record and returns its assigned identifier.
    async fn create(&self, ctx: &RequestContext, book: NewBook) -> anyhow::Result<String>;

    /// Removes the record with `id` and returns the removed identifier.
    ///
    /// Fails with [`BookNotFound`] if no such record exists.
    async fn delete(&self, ctx: &RequestContext, id: &str) -> anyhow::Result<String>;

    /// Looks up one record. Returns `None` if it does not exist.
    async fn get_by_id(&self, ctx: &RequestContext, id: &str) -> anyhow::Result<Option<Book>>;

    async fn get_all(&self, ctx: &RequestContext) -> anyhow::Result<Vec<Book>>;

    async fn get_by_author(&self, ctx: &RequestContext, author: &str) -> anyhow::Result<Vec<Book>>;

    async fn get_by_publisher(
        &self,
        ctx: &RequestContext,
        publisher: &str,
    ) -> anyhow::Result<Vec<Book>>;

    async fn get_by_language(
        &self,
        ctx: &RequestContext,
        language: &str,
    ) -> anyhow::Result<Vec<Book>>;

    async fn get_by_genre(&self, ctx: &RequestContext, genre: &str) -> anyhow::Result<Vec<Book>>;
}

/// Returned by [`BookStore::delete`] when the identifier is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("book {id} not found")]
pub struct BookNotFound {
    pub id: String,
}
