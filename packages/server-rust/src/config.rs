//! Command-line and environment configuration.
//!
//! [`Args`] is the flat clap surface; [`AppConfig`] is what the rest of the
//! server consumes.

use std::time::Duration;

use clap::Parser;
use folio_core::Codec;

use crate::cache::engines::memory::DEFAULT_CAPACITY;
use crate::network::NetworkConfig;
use crate::repository::RepositoryConfig;
use crate::telemetry::{LogConfig, LogFormat};

/// Longest accepted cache TTL: one week.
pub const MAX_CACHE_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Longest accepted request or drain timeout: one hour.
pub const MAX_TIMEOUT_SECS: u64 = 60 * 60;

#[derive(Debug, Clone, Parser)]
#[command(name = "folio-server", version, about = "Book catalog gateway")]
pub struct Args {
    #[arg(long, env = "FOLIO_HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(short, long, env = "FOLIO_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Allowed CORS origins, comma separated. `*` allows any.
    #[arg(long, env = "FOLIO_CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    pub cors_origins: Vec<String>,

    #[arg(
        long,
        env = "FOLIO_REQUEST_TIMEOUT_MS",
        default_value_t = 30_000,
        value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECS * 1000)
    )]
    pub request_timeout_ms: u64,

    #[arg(
        long,
        env = "FOLIO_DRAIN_TIMEOUT_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(0..=MAX_TIMEOUT_SECS)
    )]
    pub drain_timeout_secs: u64,

    /// Lifetime of cached query results.
    #[arg(
        long,
        env = "FOLIO_CACHE_TTL_SECS",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(0..=MAX_CACHE_TTL_SECS)
    )]
    pub cache_ttl_secs: u64,

    #[arg(long, env = "FOLIO_CACHE_CAPACITY", default_value_t = DEFAULT_CAPACITY)]
    pub cache_capacity: usize,

    /// Encoding of cached values: `json` or `msgpack`.
    #[arg(long, env = "FOLIO_CACHE_CODEC", default_value = "json")]
    pub cache_codec: Codec,

    /// Read every query straight from the store.
    #[arg(long, env = "FOLIO_NO_CACHE")]
    pub no_cache: bool,

    #[arg(long, env = "FOLIO_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    #[arg(long, env = "FOLIO_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Catalog settings: the cache in front of the book store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub cache_enabled: bool,
    pub cache_capacity: usize,
    pub cache_ttl: Duration,
    pub cache_codec: Codec,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        let repository = RepositoryConfig::default();
        Self {
            cache_enabled: true,
            cache_capacity: DEFAULT_CAPACITY,
            cache_ttl: repository.ttl,
            cache_codec: repository.codec,
        }
    }
}

impl CatalogConfig {
    #[must_use]
    pub fn repository_config(&self) -> RepositoryConfig {
        RepositoryConfig::default()
            .with_ttl(self.cache_ttl)
            .with_codec(self.cache_codec)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    pub network: NetworkConfig,
    pub catalog: CatalogConfig,
    pub log: LogConfig,
}

impl From<Args> for AppConfig {
    fn from(args: Args) -> Self {
        Self {
            network: NetworkConfig {
                host: args.host,
                port: args.port,
                cors_origins: args.cors_origins,
                request_timeout: Duration::from_millis(args.request_timeout_ms),
                drain_timeout: Duration::from_secs(args.drain_timeout_secs),
            },
            catalog: CatalogConfig {
                cache_enabled: !args.no_cache,
                cache_capacity: args.cache_capacity,
                cache_ttl: Duration::from_secs(args.cache_ttl_secs),
                cache_codec: args.cache_codec,
            },
            log: LogConfig {
                level: args.log_level,
                format: args.log_format,
            },
        }
    }
}
