use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Liveness of the backup service.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the record/blob database is unreachable.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// An export or import currently holds the backup engine.
    pub backup_busy: bool,
}

/// GET /health -- database reachability and whether a backup is running.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = dreamdress_db::health_check(&state.pool).await.is_ok();
    let backup_busy = state.backup.try_lock().is_err();

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        backup_busy,
    })
}

/// Mount health check routes (root level, NOT under `/api/v1`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
