//! Folio server: cache-aside book catalog, RPC failure normalization and the
//! HTTP gateway in front of both.

pub mod cache;
pub mod config;
pub mod context;
pub mod network;
pub mod repository;
pub mod rpc;
pub mod storage;
pub mod telemetry;

pub use cache::{CacheBackend, MemoryCache, NullCache};
pub use config::{AppConfig, Args};
pub use context::{Interrupted, RequestContext};
pub use network::NetworkModule;
pub use repository::{CachedBookRepository, RepositoryConfig, DEFAULT_CACHE_TTL};
pub use rpc::{RpcCaller, RpcClient, RpcError, UserClient};
pub use storage::{BookStore, MemoryBookStore};
