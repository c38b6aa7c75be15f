//! Folio core: book records, query shapes, cache keys and transport status classification.
//!
//! Everything here is pure: no I/O, no async, no logging. The server crate
//! builds the cache-aside repository and the RPC error boundary on top.

pub mod book;
pub mod codec;
pub mod query;
pub mod status;

pub use book::{Book, NewBook};
pub use codec::Codec;
pub use query::{CacheKey, Dimension, QueryShape, BOOKS_NAMESPACE};
pub use status::{classify, classify_raw, Severity, StatusCode};
