//! Blob store rows.

use dreamdress_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `blobs` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct StoredBlob {
    pub key: String,
    /// Portable text encoding of the payload.
    pub payload: String,
    pub updated_at: Timestamp,
}
