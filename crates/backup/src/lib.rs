//! Backup and restore engine.
//!
//! [`Exporter`] turns the record and blob stores into a downloadable unit;
//! [`Importer`] restores such a unit. [`BackupService`] bundles both over
//! one database pool.

pub mod archive;
pub mod error;
pub mod exporter;
pub mod importer;

use dreamdress_core::backup::ExportCategory;
use dreamdress_core::codec::DownloadUnit;
use dreamdress_core::progress::ProgressSink;
use dreamdress_db::{BlobStore, DbPool, RecordStore};

pub use error::{BackupError, BackupResult};
pub use exporter::Exporter;
pub use importer::{ImportFormat, ImportSummary, Importer};

/// Exporter and importer sharing the same stores.
#[derive(Debug, Clone)]
pub struct BackupService {
    exporter: Exporter,
    importer: Importer,
}

impl BackupService {
    pub fn new(pool: DbPool) -> Self {
        let records = RecordStore::new(pool.clone());
        let blobs = BlobStore::new(pool);
        Self {
            exporter: Exporter::new(records.clone(), blobs.clone()),
            importer: Importer::new(records, blobs),
        }
    }

    pub async fn export(
        &self,
        category: ExportCategory,
        progress: &dyn ProgressSink,
    ) -> BackupResult<DownloadUnit> {
        self.exporter.export(category, progress).await
    }

    pub async fn import(
        &self,
        file_name: &str,
        bytes: &[u8],
        progress: &dyn ProgressSink,
    ) -> BackupResult<ImportSummary> {
        self.importer.import(file_name, bytes, progress).await
    }
}
