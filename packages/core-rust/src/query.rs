//! Query shapes and the cache key scheme.
//!
//! A [`QueryShape`] names the predicate dimension a read filters on and the
//! value it filters by. [`CacheKey::of`] turns a shape into the key its
//! result set is cached under:
//!
//! - `"<namespace>:all"` for [`QueryShape::All`]
//! - `"<namespace>:<dimension>:<value>"` for every other shape
//!
//! Values are embedded verbatim. `"Orwell"` and `"orwell"` are different
//! keys and therefore different cache entries.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Namespace prefix for cached book result sets.
pub const BOOKS_NAMESPACE: &str = "books";

/// Predicate dimension of a [`QueryShape`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    All,
    ById,
    ByAuthor,
    ByPublisher,
    ByLanguage,
    ByGenre,
}

impl Dimension {
    /// Stable name used inside cache keys.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::ById => "by_id",
            Self::ByAuthor => "by_author",
            Self::ByPublisher => "by_publisher",
            Self::ByLanguage => "by_language",
            Self::ByGenre => "by_genre",
        }
    }
}

/// Tagged description of what a read operation fetches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryShape {
    All,
    ById(String),
    ByAuthor(String),
    ByPublisher(String),
    ByLanguage(String),
    ByGenre(String),
}

impl QueryShape {
    #[must_use]
    pub fn dimension(&self) -> Dimension {
        match self {
            Self::All => Dimension::All,
            Self::ById(_) => Dimension::ById,
            Self::ByAuthor(_) => Dimension::ByAuthor,
            Self::ByPublisher(_) => Dimension::ByPublisher,
            Self::ByLanguage(_) => Dimension::ByLanguage,
            Self::ByGenre(_) => Dimension::ByGenre,
        }
    }

    /// The filter value, or `None` for [`QueryShape::All`].
    #[must_use]
    pub fn value(&self) -> Option<&str> {
        match self {
            Self::All => None,
            Self::ById(v)
            | Self::ByAuthor(v)
            | Self::ByPublisher(v)
            | Self::ByLanguage(v)
            | Self::ByGenre(v) => Some(v),
        }
    }

    /// Cache key of this shape in the [`BOOKS_NAMESPACE`].
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        CacheKey::of(BOOKS_NAMESPACE, self)
    }
}

impl fmt::Display for QueryShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.value() {
            Some(v) => write!(f, "{}={v}", self.dimension().as_str()),
            None => f.write_str(self.dimension().as_str()),
        }
    }
}

/// Deterministic cache key derived from a [`QueryShape`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Builds the key for `shape` under `namespace`.
    ///
    /// `namespace` must not contain `':'`; dimension names never do, so the
    /// value always starts right after the second separator and distinct
    /// shapes cannot collide.
    #[must_use]
    pub fn of(namespace: &str, shape: &QueryShape) -> Self {
        let dimension = shape.dimension().as_str();
        match shape.value() {
            Some(value) => Self(format!("{namespace}:{dimension}:{value}")),
            None => Self(format!("{namespace}:{dimension}")),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn all_shape_has_no_value_segment() {
        assert_eq!(QueryShape::All.cache_key().as_str(), "books:all");
    }

    #[test]
    fn predicate_shapes_embed_dimension_and_value() {
        let cases = [
            (QueryShape::ByAuthor("Orwell".into()), "books:by_author:Orwell"),
            (QueryShape::ByPublisher("Penguin".into()), "books:by_publisher:Penguin"),
            (QueryShape::ByLanguage("en".into()), "books:by_language:en"),
            (QueryShape::ByGenre("Noir".into()), "books:by_genre:Noir"),
            (QueryShape::ById("42".into()), "books:by_id:42"),
        ];
        for (shape, expected) in cases {
            assert_eq!(shape.cache_key().as_str(), expected);
        }
    }

    #[test]
    fn values_are_not_normalized() {
        let upper = QueryShape::ByAuthor("Orwell".into()).cache_key();
        let lower = QueryShape::ByAuthor("orwell".into()).cache_key();
        let padded = QueryShape::ByAuthor(" Orwell".into()).cache_key();
        assert_ne!(upper, lower);
        assert_ne!(upper, padded);
    }

    #[test]
    fn custom_namespace() {
        let key = CacheKey::of("archive", &QueryShape::ByGenre("Noir".into()));
        assert_eq!(key.to_string(), "archive:by_genre:Noir");
    }

    #[test]
    fn display_names_dimension_and_value() {
        assert_eq!(QueryShape::All.to_string(), "all");
        assert_eq!(QueryShape::ByAuthor("X".into()).to_string(), "by_author=X");
    }

    fn any_shape() -> impl Strategy<Value = QueryShape> {
        let value = ".{0,12}";
        prop_oneof![
            Just(QueryShape::All),
            value.prop_map(QueryShape::ById),
            value.prop_map(QueryShape::ByAuthor),
            value.prop_map(QueryShape::ByPublisher),
            value.prop_map(QueryShape::ByLanguage),
            value.prop_map(QueryShape::ByGenre),
        ]
    }

    proptest! {
        #[test]
        fn key_is_deterministic(shape in any_shape()) {
            prop_assert_eq!(shape.cache_key(), shape.clone().cache_key());
        }

        #[test]
        fn distinct_shapes_get_distinct_keys(a in any_shape(), b in any_shape()) {
            prop_assert_eq!(a == b, a.cache_key() == b.cache_key());
        }
    }
}
