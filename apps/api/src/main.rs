mod applicant;
mod config;
mod db;
mod errors;
mod jobs;
mod models;
mod recommendation;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{CacheBackend, Config};
use crate::db::create_pool;
use crate::recommendation::store::{CacheStore, MemoryCacheStore, RedisCacheStore};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting jobmatch v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config).await?;

    // Initialize the recommendation cache store
    let store: Arc<dyn CacheStore> = match config.cache_backend {
        CacheBackend::Redis => {
            let client = redis::Client::open(config.redis_url.clone())?;
            Arc::new(RedisCacheStore::connect(client).await?)
        }
        CacheBackend::Memory => {
            info!("Using in-process recommendation cache");
            Arc::new(MemoryCacheStore::new(config.cache_max_entries))
        }
    };
    info!(
        "Cache TTL: jobs open {} days, fallback {}s",
        config.job_open_days,
        config.cache_min_ttl.as_secs()
    );

    // Build app state
    let state = AppState::new(db, config.clone(), store);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the web client's domain is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
