use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dreamdress_backup::BackupError;
use dreamdress_core::error::CoreError;
use serde_json::json;

/// Application-level error type for HTTP handlers.
///
/// Wraps [`BackupError`] for engine failures and adds HTTP-specific
/// variants. Implements [`IntoResponse`] to produce consistent JSON error
/// responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// A failure from the backup engine.
    #[error(transparent)]
    Backup(#[from] BackupError),

    /// A bad request with a human-readable message.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        Self::Backup(BackupError::Core(err))
    }
}

/// Convenience type alias for handler return values.
pub type AppResult<T> = Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            // --- Domain errors ---
            AppError::Backup(BackupError::Core(core)) => classify_core_error(core),

            // --- Storage, archive, and serialization failures ---
            AppError::Backup(other) => {
                tracing::error!(error = %other, "Backup engine error");
                internal()
            }

            // --- HTTP-specific errors ---
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
        };

        let body = json!({
            "error": message,
            "code": code,
        });

        (status, axum::Json(body)).into_response()
    }
}

/// Map a domain error onto an HTTP status, error code, and message.
fn classify_core_error(err: &CoreError) -> (StatusCode, &'static str, String) {
    let message = err.to_string();
    match err {
        CoreError::EmptyExport(_) => (StatusCode::NOT_FOUND, "EMPTY_EXPORT", message),
        CoreError::EmptyArchive => (StatusCode::BAD_REQUEST, "EMPTY_ARCHIVE", message),
        CoreError::InvalidBackupFormat(_) => {
            (StatusCode::BAD_REQUEST, "INVALID_BACKUP_FORMAT", message)
        }
        CoreError::MalformedEncoding(_) => {
            (StatusCode::BAD_REQUEST, "MALFORMED_ENCODING", message)
        }
        CoreError::Validation(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "INTERNAL_ERROR",
        "An internal error occurred".to_string(),
    )
}
