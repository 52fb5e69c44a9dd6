//! tiffserve - caching image delivery server with TIFF metadata
//! inspection.
//!
//! This binary parses configuration, opens the cache, and serves HTTP.

use clap::Parser;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tiffserve::cache::HttpCache;
use tiffserve::config::Config;
use tiffserve::server::{create_router, AppState, RouterConfig};

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(message) = config.validate() {
        error!("Configuration error: {}", message);
        return ExitCode::FAILURE;
    }

    info!("Configuration:");
    info!("  Origin: {}", config.origin.display());
    info!("  Cache dir: {}", config.cache_dir.display());
    info!(
        "  Cache: {}MB memory, {}s default TTL{}",
        config.cache_memory / (1024 * 1024),
        config.ttl,
        if config.ephemeral { ", ephemeral" } else { "" }
    );

    let cache = match HttpCache::new(config.cache_config()).await {
        Ok(cache) => cache,
        Err(err) => {
            error!("Failed to open cache at {}: {}", config.cache_dir.display(), err);
            return ExitCode::FAILURE;
        }
    };

    let state = AppState::new(cache, &config.origin);

    let mut router_config = RouterConfig::new().with_tracing(!config.no_tracing);
    if let Some(origins) = config.cors_origins.clone() {
        router_config = router_config.with_cors_origins(origins);
    }
    let router = create_router(state, router_config);

    let addr = config.bind_address();
    info!("");
    info!("Server listening on http://{}", addr);
    info!("  curl http://{}/health", addr);
    info!("  curl http://{}/images/<file>", addr);
    info!("  curl http://{}/meta/<file.tif>", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("Failed to bind to {}: {}", addr, err);
            return ExitCode::FAILURE;
        }
    };

    if let Err(err) = axum::serve(listener, router).await {
        error!("Server error: {}", err);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}

/// Initialize the tracing subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "tiffserve=debug,tower_http=debug"
    } else {
        "tiffserve=info,tower_http=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
