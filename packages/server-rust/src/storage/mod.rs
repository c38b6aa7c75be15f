//! Book persistence.
//!
//! - [`BookStore`]: the source-of-truth trait
//! - [`datastores`]: concrete backends

pub mod book_store;
pub mod datastores;

pub use book_store::*;
pub use datastores::MemoryBookStore;
