pub mod backup;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /backup/export/{category}     export (POST)
/// /backup/import                import (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/backup", backup::router())
}
