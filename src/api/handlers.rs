use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::analytics::{AnalyticsSnapshot, SnapshotService, VisitRecorder};

pub struct AppState {
    pub recorder: Arc<VisitRecorder>,
    pub snapshots: Arc<SnapshotService>,
}

#[derive(Debug, Deserialize)]
pub struct RecordVisitRequest {
    pub page: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Record a page view.
///
/// Fire-and-forget: the geolocation lookup and the append run on a spawned
/// task so the caller's navigation is never blocked on them, and a late
/// failure never surfaces here.
pub async fn record_visit(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RecordVisitRequest>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    if payload.page.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "page cannot be empty".to_string(),
            }),
        ));
    }

    let recorder = Arc::clone(&state.recorder);
    tokio::spawn(async move {
        recorder.record_visit(&payload.page).await;
    });

    Ok(StatusCode::ACCEPTED)
}

/// Current dashboard snapshot. Never an error: absent or corrupt storage
/// renders as the zero/placeholder snapshot.
pub async fn get_snapshot(State(state): State<Arc<AppState>>) -> Json<AnalyticsSnapshot> {
    Json(state.snapshots.snapshot().await)
}

pub async fn health_check() -> StatusCode {
    StatusCode::OK
}
