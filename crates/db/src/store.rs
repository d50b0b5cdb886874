//! Typed store facades used by the backup engine.
//!
//! [`RecordStore`] is the small-record store: named text slots for the
//! configuration and the history ledger. [`BlobStore`] is the blob store
//! adapter: encoded image payloads plus the virtual-camera media list.
//! Both are constructed once from a pool and passed explicitly.

use dreamdress_core::backup::{BlobMap, ConfigSlot, ConfigSnapshot, VirtualMediaItem, HISTORY_SLOT};
use dreamdress_core::progress::ItemProgress;

use crate::repositories::{BlobRepo, RecordRepo, VirtualMediaRepo};
use crate::DbPool;

// ---------------------------------------------------------------------------
// Small-record store
// ---------------------------------------------------------------------------

/// Named text slots with typed accessors.
#[derive(Debug, Clone)]
pub struct RecordStore {
    pool: DbPool,
}

impl RecordStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Raw read of a slot.
    pub async fn get(&self, slot: &str) -> Result<Option<String>, sqlx::Error> {
        Ok(RecordRepo::find(&self.pool, slot).await?.map(|r| r.value))
    }

    /// Raw write of a slot.
    pub async fn set(&self, slot: &str, value: &str) -> Result<(), sqlx::Error> {
        RecordRepo::upsert(&self.pool, slot, value).await
    }

    /// The raw history ledger text.
    pub async fn history(&self) -> Result<Option<String>, sqlx::Error> {
        self.get(HISTORY_SLOT).await
    }

    /// Replace the history ledger.
    pub async fn set_history(&self, ledger: &str) -> Result<(), sqlx::Error> {
        self.set(HISTORY_SLOT, ledger).await
    }

    pub async fn config_slot(&self, slot: ConfigSlot) -> Result<Option<String>, sqlx::Error> {
        self.get(slot.store_key()).await
    }

    pub async fn set_config_slot(&self, slot: ConfigSlot, value: &str) -> Result<(), sqlx::Error> {
        self.set(slot.store_key(), value).await
    }

    /// Read every configuration slot.
    pub async fn config_snapshot(&self) -> Result<ConfigSnapshot, sqlx::Error> {
        let mut snapshot = ConfigSnapshot::default();
        for slot in ConfigSlot::ALL {
            snapshot.set(slot, self.config_slot(slot).await?);
        }
        Ok(snapshot)
    }

    /// Write the present slots of `snapshot`, leaving the others untouched.
    ///
    /// Returns the number of slots written.
    pub async fn apply_config(&self, snapshot: &ConfigSnapshot) -> Result<usize, sqlx::Error> {
        let mut written = 0;
        for (slot, value) in snapshot.present() {
            self.set_config_slot(slot, value).await?;
            written += 1;
        }
        Ok(written)
    }
}

// ---------------------------------------------------------------------------
// Blob store adapter
// ---------------------------------------------------------------------------

/// Bulk access to encoded image blobs and virtual-camera media.
#[derive(Debug, Clone)]
pub struct BlobStore {
    pool: DbPool,
}

impl BlobStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Read every image blob, keyed by storage key.
    pub async fn read_all(&self, progress: &dyn ItemProgress) -> Result<BlobMap, sqlx::Error> {
        let rows = BlobRepo::list(&self.pool).await?;
        let total = rows.len();
        let mut blobs = BlobMap::new();
        for (index, row) in rows.into_iter().enumerate() {
            blobs.insert(row.key, row.payload);
            progress.item(index + 1, total, &format!("Reading photo {}/{total}", index + 1));
        }
        tracing::debug!(count = total, "Blobs read");
        Ok(blobs)
    }

    /// Insert or replace every blob in `blobs`. Keys not in the map are kept.
    pub async fn write_all(
        &self,
        blobs: &BlobMap,
        progress: &dyn ItemProgress,
    ) -> Result<usize, sqlx::Error> {
        let total = blobs.len();
        let pairs: Vec<(&str, &str)> = blobs.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
        let written = BlobRepo::upsert_many(
            &self.pool,
            pairs,
            |n| progress.item(n, total, &format!("Saving photo {n}/{total}")),
        )
        .await?;
        tracing::debug!(count = written, "Blobs written");
        Ok(written)
    }

    /// The virtual-camera media list, in user order.
    ///
    /// Rows with an unknown kind are skipped.
    pub async fn virtual_media(&self) -> Result<Vec<VirtualMediaItem>, sqlx::Error> {
        let rows = VirtualMediaRepo::list(&self.pool).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let position = row.position;
                let item = row.into_item();
                if item.is_none() {
                    tracing::warn!(position, "Skipping virtual media row with unknown kind");
                }
                item
            })
            .collect())
    }

    /// Replace the virtual-camera media list wholesale.
    pub async fn replace_virtual_media(&self, items: &[VirtualMediaItem]) -> Result<(), sqlx::Error> {
        VirtualMediaRepo::replace_all(&self.pool, items).await?;
        tracing::debug!(count = items.len(), "Virtual media replaced");
        Ok(())
    }
}
