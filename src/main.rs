use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use warp_analytics::analytics::{
    HttpGeoResolver, SnapshotService, SyntheticGeoResolver, VisitRecorder,
};
use warp_analytics::api::create_api_router;
use warp_analytics::config::{Config, StoreBackend};
use warp_analytics::store::{KeyValueStore, MemoryStore, SqliteStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Initialize storage
    let store: Arc<dyn KeyValueStore> = match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory store (visits are not durable across restarts)");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Sqlite => {
            info!("Using SQLite store: {}", config.store.url);
            Arc::new(SqliteStore::new(&config.store.url, 5).await?)
        }
    };
    store.init().await?;

    // Assemble the recorder: network lookup first, synthetic fallback after
    let primary = Arc::new(HttpGeoResolver::new(
        &config.geo.endpoint,
        Duration::from_millis(config.geo.timeout_ms),
    )?);
    let fallback = Arc::new(SyntheticGeoResolver);
    let recorder = Arc::new(VisitRecorder::new(Arc::clone(&store), primary, fallback));
    info!(
        "Geolocation lookups via {} ({}ms timeout)",
        config.geo.endpoint, config.geo.timeout_ms
    );

    let snapshots = Arc::new(SnapshotService::new(Arc::clone(&store)));

    let router = create_api_router(recorder, snapshots);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("🚀 Analytics server listening on http://{}", addr);
    info!("   - POST http://{}/api/visits records a page view", addr);
    info!("   - GET  http://{}/api/snapshot serves the dashboard", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
