use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::analytics::{SnapshotService, VisitRecorder};

use super::handlers::{get_snapshot, health_check, record_visit, AppState};

pub fn create_api_router(recorder: Arc<VisitRecorder>, snapshots: Arc<SnapshotService>) -> Router {
    let state = Arc::new(AppState {
        recorder,
        snapshots,
    });

    // The dashboard polls from a browser, so cross-origin reads are allowed
    Router::new()
        .route("/health", get(health_check))
        .route("/api/visits", post(record_visit))
        .route("/api/snapshot", get(get_snapshot))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
