//! Repository for the `virtual_media` table.

use dreamdress_core::backup::VirtualMediaItem;
use sqlx::SqlitePool;

use crate::models::virtual_media::VirtualMediaRow;

/// Column list for `virtual_media` queries.
const COLUMNS: &str = "position, id, kind, data_url, duration";

/// Provides data access for the virtual-camera media list.
pub struct VirtualMediaRepo;

impl VirtualMediaRepo {
    /// List the media in user order.
    pub async fn list(pool: &SqlitePool) -> Result<Vec<VirtualMediaRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM virtual_media ORDER BY position");
        sqlx::query_as::<_, VirtualMediaRow>(&query)
            .fetch_all(pool)
            .await
    }

    /// Replace the whole list in one transaction.
    pub async fn replace_all(
        pool: &SqlitePool,
        items: &[VirtualMediaItem],
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM virtual_media")
            .execute(&mut *tx)
            .await?;
        for (position, item) in items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO virtual_media (position, id, kind, data_url, duration) \
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .bind(position as i64)
            .bind(&item.id)
            .bind(item.kind.as_str())
            .bind(&item.data_url)
            .bind(item.duration)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await
    }
}
