use dreamdress_core::error::CoreError;

/// Error type for export and import operations.
///
/// Domain failures arrive as [`CoreError`]; everything else is an
/// unclassified failure from storage, the zip codec, or JSON handling and
/// is propagated unchanged.
#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type BackupResult<T> = Result<T, BackupError>;
