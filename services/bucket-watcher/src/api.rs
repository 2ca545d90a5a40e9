//! JSON status API over the watcher's latest cycle and journal

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::journal::{CsvJournal, JournalRecord, JournalStats};
use crate::runner::{CycleReport, WatchService};

/// Application state shared across handlers
pub struct AppState {
    pub service: Arc<WatchService>,
    pub journal: CsvJournal,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(get_status))
        .route("/refresh", post(refresh))
        .route("/journal", get(get_journal))
        .route("/journal/stats", get(get_journal_stats))
        .layer(CorsLayer::new().allow_origin(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}

/// GET /status - latest cycle, 404 before the first one completes
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CycleReport>, StatusCode> {
    state.service.latest().await.map(Json).ok_or(StatusCode::NOT_FOUND)
}

/// POST /refresh - evaluate now instead of waiting for the timer
pub async fn refresh(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CycleReport>, (StatusCode, String)> {
    info!("Manual refresh requested");
    state
        .service
        .refresh()
        .await
        .map(Json)
        .map_err(|e| (StatusCode::SERVICE_UNAVAILABLE, e.to_string()))
}

#[derive(Debug, serde::Deserialize)]
pub struct JournalQuery {
    limit: Option<usize>,
}

/// GET /journal?limit=N
pub async fn get_journal(
    State(state): State<Arc<AppState>>,
    Query(query): Query<JournalQuery>,
) -> Result<Json<Vec<JournalRecord>>, (StatusCode, String)> {
    state.journal.read(query.limit).map(Json).map_err(|e| {
        warn!("Journal read failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}

/// GET /journal/stats
pub async fn get_journal_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JournalStats>, (StatusCode, String)> {
    state.journal.stats().map(Json).map_err(|e| {
        warn!("Journal stats failed: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}
