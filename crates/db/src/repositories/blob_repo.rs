//! Repository for the `blobs` table.

use sqlx::SqlitePool;

use crate::models::blob::StoredBlob;

/// Column list for `blobs` queries.
const COLUMNS: &str = "key, payload, updated_at";

/// Provides data access for encoded image blobs.
pub struct BlobRepo;

impl BlobRepo {
    /// List every blob, ordered by key.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<StoredBlob>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM blobs ORDER BY key");
        sqlx::query_as::<_, StoredBlob>(&query).fetch_all(pool).await
    }

    /// Insert or replace a batch of blobs in one transaction.
    ///
    /// `on_written` is called after each row with the number written so far.
    pub async fn upsert_many<'a, I, F>(
        pool: &SqlitePool,
        blobs: I,
        mut on_written: F,
    ) -> Result<usize, sqlx::Error>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
        F: FnMut(usize),
    {
        let now = chrono::Utc::now();
        let mut tx = pool.begin().await?;
        let mut written = 0;
        for (key, payload) in blobs {
            sqlx::query(
                "INSERT INTO blobs (key, payload, updated_at) VALUES (?1, ?2, ?3) \
                 ON CONFLICT (key) DO UPDATE SET \
                     payload = excluded.payload, \
                     updated_at = excluded.updated_at",
            )
            .bind(key)
            .bind(payload)
            .bind(now)
            .execute(&mut *tx)
            .await?;
            written += 1;
            on_written(written);
        }
        tx.commit().await?;
        Ok(written)
    }
}
