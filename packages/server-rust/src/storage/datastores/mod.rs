//! [`BookStore`](super::BookStore) implementations.

mod memory;

pub use memory::MemoryBookStore;
