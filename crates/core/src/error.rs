use crate::backup::ExportCategory;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Nothing to export for category '{0}'")]
    EmptyExport(ExportCategory),

    #[error("Archive contains no importable entries")]
    EmptyArchive,

    #[error("Invalid backup file format: {0}")]
    InvalidBackupFormat(String),

    #[error("Malformed encoding: {0}")]
    MalformedEncoding(String),

    #[error("Validation failed: {0}")]
    Validation(String),
}
