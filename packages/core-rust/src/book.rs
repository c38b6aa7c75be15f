//! Book records served by the catalog.
//!
//! [`Book`] is the persisted entity; [`NewBook`] is the create payload before
//! the backing store has assigned an identifier and an `added_at` timestamp.

use serde::{Deserialize, Serialize};

use crate::query::QueryShape;

/// A catalog record.
///
/// Serialized as-is into cache entries, so every field must survive an
/// encode/decode round trip through any [`Codec`](crate::codec::Codec).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    /// Unique identifier assigned by the backing store.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Cover image location.
    pub image: String,
    pub pages: u64,
    pub author: String,
    pub genre: String,
    pub publisher: String,
    /// `true` for hardcover.
    pub binding: bool,
    pub series: String,
    pub language: String,
    /// Wall-clock time (millis since epoch) the record was created.
    pub added_at: i64,
}

impl Book {
    /// Returns `true` if this record belongs in the result set of `shape`.
    ///
    /// Values are compared exactly: no case folding, no trimming.
    #[must_use]
    pub fn matches(&self, shape: &QueryShape) -> bool {
        match shape {
            QueryShape::All => true,
            QueryShape::ById(id) => self.id == *id,
            QueryShape::ByAuthor(v) => self.author == *v,
            QueryShape::ByPublisher(v) => self.publisher == *v,
            QueryShape::ByLanguage(v) => self.language == *v,
            QueryShape::ByGenre(v) => self.genre == *v,
        }
    }
}

/// Fields supplied by a caller when creating a [`Book`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewBook {
    pub title: String,
    pub description: String,
    pub image: String,
    pub pages: u64,
    pub author: String,
    pub genre: String,
    pub publisher: String,
    pub binding: bool,
    pub series: String,
    pub language: String,
}

impl NewBook {
    /// Completes the record with store-assigned identity and creation time.
    #[must_use]
    pub fn into_book(self, id: String, added_at: i64) -> Book {
        Book {
            id,
            title: self.title,
            description: self.description,
            image: self.image,
            pages: self.pages,
            author: self.author,
            genre: self.genre,
            publisher: self.publisher,
            binding: self.binding,
            series: self.series,
            language: self.language,
            added_at,
        }
    }
}
