//! In-memory [`BookStore`] backed by [`DashMap`].
//!
//! Lookups scan every record and filter with [`Book::matches`], so result
//! sets are always exact. Results are ordered by `(added_at, id)`.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use dashmap::DashMap;
use folio_core::{Book, NewBook, QueryShape};

use crate::context::RequestContext;
use crate::storage::book_store::{BookNotFound, BookStore};

/// Book records held in a concurrent map keyed by identifier.
pub struct MemoryBookStore {
    books: DashMap<String, Book>,
}

impl MemoryBookStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            books: DashMap::new(),
        }
    }

    /// Inserts a fully-formed record, replacing any record with the same id.
    pub fn insert(&self, book: Book) {
        self.books.insert(book.id.clone(), book);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.books.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.books.is_empty()
    }

    fn select(&self, ctx: &RequestContext, shape: &QueryShape) -> anyhow::Result<Vec<Book>> {
        ctx.check()?;
        let mut found: Vec<Book> = self
            .books
            .iter()
            .filter(|entry| entry.value().matches(shape))
            .map(|entry| entry.value().clone())
            .collect();
        found.sort_by(|a, b| a.added_at.cmp(&b.added_at).then_with(|| a.id.cmp(&b.id)));
        Ok(found)
    }
}

impl Default for MemoryBookStore {
    fn default() -> Self {
        Self::new()
    }
}

fn now_millis() -> anyhow::Result<i64> {
    let elapsed = SystemTime::now().duration_since(UNIX_EPOCH)?;
    Ok(i64::try_from(elapsed.as_millis())?)
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn create(&self, ctx: &RequestContext, book: NewBook) -> anyhow::Result<String> {
        ctx.check()?;
        let id = uuid::Uuid::new_v4().to_string();
        let record = book.into_book(id.clone(), now_millis()?);
        self.books.insert(id.clone(), record);
        Ok(id)
    }

    async fn delete(&self, ctx: &RequestContext, id: &str) -> anyhow::Result<String> {
        ctx.check()?;
        match self.books.remove(id) {
            Some((removed, _)) => Ok(removed),
            None => Err(BookNotFound { id: id.to_string() }.into()),
        }
    }

    async fn get_by_id(&self, ctx: &RequestContext, id: &str) -> anyhow::Result<Option<Book>> {
        ctx.check()?;
        Ok(self.books.get(id).map(|entry| entry.value().clone()))
    }

    async fn get_all(&self, ctx: &RequestContext) -> anyhow::Result<Vec<Book>> {
        self.select(ctx, &QueryShape::All)
    }

    async fn get_by_author(&self, ctx: &RequestContext, author: &str) -> anyhow::Result<Vec<Book>> {
        self.select(ctx, &QueryShape::ByAuthor(author.to_string()))
    }

    async fn get_by_publisher(
        &self,
        ctx: &RequestContext,
        publisher: &str,
    ) -> anyhow::Result<Vec<Book>> {
        self.select(ctx, &QueryShape::ByPublisher(publisher.to_string()))
    }

    async fn get_by_language(
        &self,
        ctx: &RequestContext,
        language: &str,
    ) -> anyhow::Result<Vec<Book>> {
        self.select(ctx, &QueryShape::ByLanguage(language.to_string()))
    }

    async fn get_by_genre(&self, ctx: &RequestContext, genre: &str) -> anyhow::Result<Vec<Book>> {
        self.select(ctx, &QueryShape::ByGenre(genre.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_book(title: &str, author: &str, genre: &str) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: author.to_string(),
            genre: genre.to_string(),
            publisher: "Allen & Unwin".to_string(),
            language: "en".to_string(),
            ..NewBook::default()
        }
    }

    fn book(id: &str, added_at: i64, author: &str) -> Book {
        new_book(id, author, "Fantasy").into_book(id.to_string(), added_at)
    }

    #[tokio::test]
    async fn create_assigns_id_and_timestamp() {
        let store = MemoryBookStore::new();
        let ctx = RequestContext::new();

        let id = store
            .create(&ctx, new_book("The Hobbit", "Tolkien", "Fantasy"))
            .await
            .unwrap();
        assert!(!id.is_empty());

        let stored = store.get_by_id(&ctx, &id).await.unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.title, "The Hobbit");
        assert!(stored.added_at > 0);
    }

    #[tokio::test]
    async fn filters_are_exact() {
        let store = MemoryBookStore::new();
        let ctx = RequestContext::new();
        store.insert(book("a", 1, "Tolkien"));
        store.insert(book("b", 2, "tolkien"));
        store.insert(book("c", 3, "Le Guin"));

        let found = store.get_by_author(&ctx, "Tolkien").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, "a");
        assert_eq!(store.get_by_publisher(&ctx, "Allen & Unwin").await.unwrap().len(), 3);
        assert_eq!(store.get_by_language(&ctx, "en").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn empty_result_is_not_an_error() {
        let store = MemoryBookStore::new();
        let ctx = RequestContext::new();
        store.insert(book("a", 1, "Tolkien"));

        assert!(store.get_by_genre(&ctx, "Noir").await.unwrap().is_empty());
        assert!(store.get_by_id(&ctx, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn results_ordered_by_added_at_then_id() {
        let store = MemoryBookStore::new();
        let ctx = RequestContext::new();
        store.insert(book("z", 5, "x"));
        store.insert(book("b", 1, "x"));
        store.insert(book("a", 1, "x"));

        let ids: Vec<String> = store
            .get_all(&ctx)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.id)
            .collect();
        assert_eq!(ids, vec!["a", "b", "z"]);
    }

    #[tokio::test]
    async fn delete_removes_and_reports_unknown_ids() {
        let store = MemoryBookStore::new();
        let ctx = RequestContext::new();
        store.insert(book("a", 1, "x"));

        assert_eq!(store.delete(&ctx, "a").await.unwrap(), "a");
        assert!(store.is_empty());

        let err = store.delete(&ctx, "a").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<BookNotFound>(),
            Some(&BookNotFound { id: "a".to_string() })
        );
    }

    #[tokio::test]
    async fn cancelled_context_fails_fast() {
        let store = MemoryBookStore::new();
        let ctx = RequestContext::new();
        ctx.cancel();
        assert!(store.get_all(&ctx).await.is_err());
        assert!(store.create(&ctx, NewBook::default()).await.is_err());
        assert!(store.is_empty());
    }
}
