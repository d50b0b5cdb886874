//! Route definitions for the `/backup` resource.

use axum::routing::post;
use axum::Router;

use crate::handlers::backup;
use crate::state::AppState;

/// Routes mounted at `/backup`.
///
/// ```text
/// POST /export/{category}    -> export_backup  (photos | config | all)
/// POST /import               -> import_backup  (multipart, or raw body with ?file_name=)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/export/{category}", post(backup::export_backup))
        .route("/import", post(backup::import_backup))
}
