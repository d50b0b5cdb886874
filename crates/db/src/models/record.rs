use dreamdress_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Record {
    pub slot: String,
    pub value: String,
    pub updated_at: Timestamp,
}
