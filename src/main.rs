//! CamCensus — cam model counts per country.
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires up the enabled data sources, and serves the HTTP API with
//! graceful shutdown.

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use camcensus::aggregator::Aggregator;
use camcensus::cache::ResponseCache;
use camcensus::config::AppConfig;
use camcensus::server;
use camcensus::server::routes::AppState;
use camcensus::sources::stripchat::StripchatSource;
use camcensus::sources::DataSource;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load("config.toml")?;

    init_logging();

    info!(
        port = cfg.server.port,
        cache_ttl_secs = cfg.cache.ttl_secs,
        stripchat = cfg.sources.stripchat.enabled,
        "CamCensus starting up"
    );

    // -- Data sources -----------------------------------------------------

    let mut sources: Vec<Box<dyn DataSource>> = Vec::new();
    if cfg.sources.stripchat.enabled {
        sources.push(Box::new(StripchatSource::new()?));
    }

    // Fails loudly when no source is enabled — an always-empty aggregate
    // is a misconfiguration, not a service.
    let aggregator = Aggregator::new(sources)?;

    // -- HTTP server ------------------------------------------------------

    let state = Arc::new(AppState {
        aggregator,
        cache: ResponseCache::new(Duration::from_secs(cfg.cache.ttl_secs)),
        cache_ttl_secs: cfg.cache.ttl_secs,
        static_dir: cfg.server.static_dir.as_ref().map(Into::into),
    });

    server::serve(state, cfg.server.port).await?;

    info!("CamCensus shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("camcensus=info"));

    let json_logging = std::env::var("CAMCENSUS_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
