//! Repository for the `records` table (small-record store).

use sqlx::SqlitePool;

use crate::models::record::Record;

/// Column list for `records` queries.
const COLUMNS: &str = "slot, value, updated_at";

/// Provides data access for named record slots.
pub struct RecordRepo;

impl RecordRepo {
    /// Get a slot. Returns `None` if it has never been written.
    pub async fn find(pool: &SqlitePool, slot: &str) -> Result<Option<Record>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM records WHERE slot = ?1");
        sqlx::query_as::<_, Record>(&query)
            .bind(slot)
            .fetch_optional(pool)
            .await
    }

    /// Insert or replace a slot's value.
    pub async fn upsert(pool: &SqlitePool, slot: &str, value: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO records (slot, value, updated_at) VALUES (?1, ?2, ?3) \
             ON CONFLICT (slot) DO UPDATE SET \
                 value = excluded.value, \
                 updated_at = excluded.updated_at",
        )
        .bind(slot)
        .bind(value)
        .bind(chrono::Utc::now())
        .execute(pool)
        .await?;
        Ok(())
    }
}
