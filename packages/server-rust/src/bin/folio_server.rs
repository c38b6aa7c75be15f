use std::sync::Arc;

use clap::Parser;
use folio_server::cache::{CacheBackend, MemoryCache, NullCache};
use folio_server::telemetry::init_tracing;
use folio_server::{AppConfig, Args, CachedBookRepository, MemoryBookStore, NetworkModule};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from(Args::parse());
    init_tracing(&config.log)?;

    let cache: Arc<dyn CacheBackend> = if config.catalog.cache_enabled {
        Arc::new(MemoryCache::new(config.catalog.cache_capacity))
    } else {
        Arc::new(NullCache)
    };
    let books = Arc::new(CachedBookRepository::new(
        Arc::new(MemoryBookStore::new()),
        cache,
        config.catalog.repository_config(),
    ));

    let mut network = NetworkModule::new(config.network.clone(), books);
    let port = network.start().await?;
    info!(port, ttl_secs = config.catalog.cache_ttl.as_secs(), "folio-server starting");

    network.serve(shutdown_signal()).await?;
    info!("folio-server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received SIGINT"),
        () = terminate => info!("received SIGTERM"),
    }
}
