//! Archive reader: restores a previously exported unit into the stores.
//!
//! Files named `*.zip` go through the archive path, anything else is read
//! as a single-file JSON backup. Each path validates and decodes the whole
//! input before the first store write, so category-level failures never
//! leave partial state behind.

use dreamdress_core::backup::{
    BlobMap, ConfigSnapshot, MediaIndexEntry, VirtualMediaItem, CONFIG_ENTRY, HISTORY_ENTRY,
    MEDIA_INDEX_ENTRY, PHOTOS_DIR,
};
use dreamdress_core::codec;
use dreamdress_core::error::CoreError;
use dreamdress_core::migration::{config_from_manifest, BackupPayload, RestorePlan};
use dreamdress_core::naming;
use dreamdress_core::progress::{ProgressSink, ProgressTracker};
use dreamdress_db::{BlobStore, RecordStore};
use serde::Serialize;
use serde_json::Value;

use crate::archive::ArchiveContents;
use crate::error::BackupResult;

const MSG_DONE: &str = "Import complete";

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

/// Which input path an import took.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportFormat {
    Zip,
    Json,
}

impl ImportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Json => "json",
        }
    }
}

impl std::fmt::Display for ImportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an import actually wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub format: ImportFormat,
    pub imported_config: bool,
    pub photos: usize,
    pub media_items: usize,
    /// Human-readable summary line.
    pub message: String,
}

/// `Imported: config, 3 photos, 2 media items`, or `Imported: nothing`.
fn archive_message(imported_config: bool, photos: usize, media_items: usize) -> String {
    let mut parts = Vec::new();
    if imported_config {
        parts.push("config".to_string());
    }
    if photos > 0 {
        parts.push(format!("{photos} photos"));
    }
    if media_items > 0 {
        parts.push(format!("{media_items} media items"));
    }
    if parts.is_empty() {
        "Imported: nothing".to_string()
    } else {
        format!("Imported: {}", parts.join(", "))
    }
}

const SINGLE_FILE_MESSAGE: &str = "Imported configuration data";

// ---------------------------------------------------------------------------
// Archive decoding
// ---------------------------------------------------------------------------

/// Decoded contents of an uploaded archive, ready to be written.
#[derive(Debug, Default)]
struct ArchiveImport {
    config: Option<ConfigSnapshot>,
    virtual_media: Vec<VirtualMediaItem>,
    history: Option<String>,
    photos: BlobMap,
}

impl ArchiveImport {
    fn decode(archive: &ArchiveContents) -> BackupResult<Self> {
        let has_photos = archive
            .entries_under(PHOTOS_DIR)
            .any(|(path, _)| naming::key_from_photo_entry(path).is_some());
        let importable = has_photos
            || archive.contains(CONFIG_ENTRY)
            || archive.contains(HISTORY_ENTRY)
            || archive.contains(MEDIA_INDEX_ENTRY);
        if !importable {
            return Err(CoreError::EmptyArchive.into());
        }

        Ok(Self {
            config: archive.json(CONFIG_ENTRY).map(|v| config_from_manifest(&v)),
            virtual_media: decode_media(archive),
            history: archive.text(HISTORY_ENTRY).map(str::to_string),
            photos: archive
                .entries_under(PHOTOS_DIR)
                .filter_map(|(path, bytes)| {
                    let key = naming::key_from_photo_entry(path)?;
                    Some((key, codec::encode_entry(path, bytes.to_vec())))
                })
                .collect(),
        })
    }
}

/// Resolve every `virtual-media/index.json` row against its entry.
///
/// Malformed rows and rows whose entry is missing are dropped.
fn decode_media(archive: &ArchiveContents) -> Vec<VirtualMediaItem> {
    let Some(index) = archive.json(MEDIA_INDEX_ENTRY) else {
        return Vec::new();
    };
    let Value::Array(rows) = index else {
        tracing::warn!("Media index is not an array, ignoring");
        return Vec::new();
    };

    rows.into_iter()
        .filter_map(|row| {
            let row: MediaIndexEntry = match serde_json::from_value(row) {
                Ok(row) => row,
                Err(e) => {
                    tracing::debug!(error = %e, "Skipping malformed media index row");
                    return None;
                }
            };
            let path = naming::media_entry_name(&row.filename);
            let Some(bytes) = archive.get(&path) else {
                tracing::debug!(media_id = %row.id, entry = %path, "Media entry missing from archive");
                return None;
            };
            Some(VirtualMediaItem {
                id: row.id,
                kind: row.kind,
                data_url: codec::encode_entry(&path, bytes.to_vec()),
                duration: row.duration,
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Importer
// ---------------------------------------------------------------------------

/// Restores backups into the record and blob stores.
#[derive(Debug, Clone)]
pub struct Importer {
    records: RecordStore,
    blobs: BlobStore,
}

impl Importer {
    pub fn new(records: RecordStore, blobs: BlobStore) -> Self {
        Self { records, blobs }
    }

    /// Import an uploaded file. The format is chosen by `file_name`.
    pub async fn import(
        &self,
        file_name: &str,
        bytes: &[u8],
        progress: &dyn ProgressSink,
    ) -> BackupResult<ImportSummary> {
        let tracker = ProgressTracker::new(progress);
        tracker.report(0.0, "Reading file");

        let summary = if naming::is_archive_file_name(file_name) {
            self.import_archive(bytes, &tracker).await?
        } else {
            self.import_single_file(bytes, &tracker).await?
        };
        tracker.finish(MSG_DONE);

        tracing::info!(
            file_name,
            format = %summary.format,
            imported_config = summary.imported_config,
            photos = summary.photos,
            media_items = summary.media_items,
            "Backup imported",
        );
        Ok(summary)
    }

    async fn import_archive(
        &self,
        bytes: &[u8],
        tracker: &ProgressTracker<'_>,
    ) -> BackupResult<ImportSummary> {
        tracker.report(10.0, "Extracting archive");
        let decoded = ArchiveImport::decode(&ArchiveContents::open(bytes)?)?;

        let imported_config = match &decoded.config {
            Some(config) => {
                tracker.report(20.0, "Importing configuration");
                self.records.apply_config(config).await?;
                true
            }
            None => false,
        };

        let media_items = decoded.virtual_media.len();
        if media_items > 0 {
            tracker.report(30.0, "Importing virtual camera media");
            self.blobs.replace_virtual_media(&decoded.virtual_media).await?;
        }

        if let Some(history) = &decoded.history {
            tracker.report(50.0, "Importing history");
            self.records.set_history(history).await?;
        }

        let mut photos = 0;
        if !decoded.photos.is_empty() {
            let write = tracker.stage(50.0, 95.0);
            write.begin("Importing photos");
            photos = self.blobs.write_all(&decoded.photos, &write).await?;
        }

        Ok(ImportSummary {
            format: ImportFormat::Zip,
            imported_config,
            photos,
            media_items,
            message: archive_message(imported_config, photos, media_items),
        })
    }

    async fn import_single_file(
        &self,
        bytes: &[u8],
        tracker: &ProgressTracker<'_>,
    ) -> BackupResult<ImportSummary> {
        tracker.report(10.0, "Parsing backup file");
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| CoreError::InvalidBackupFormat(format!("not valid JSON: {e}")))?;
        let payload = BackupPayload::from_value(value)?;
        if payload.is_legacy() {
            tracing::debug!("Restoring legacy single-file backup");
        }
        let plan: RestorePlan = payload.normalize();

        tracker.report(30.0, "Importing configuration");
        if let Some(history) = &plan.history {
            self.records.set_history(history).await?;
        }
        let slots = self.records.apply_config(&plan.config).await?;

        let media_items = plan.virtual_media.len();
        if media_items > 0 {
            self.blobs.replace_virtual_media(&plan.virtual_media).await?;
        }

        let mut photos = 0;
        if !plan.images.is_empty() {
            let write = tracker.stage(50.0, 95.0);
            write.begin("Importing photos");
            photos = self.blobs.write_all(&plan.images, &write).await?;
        }

        Ok(ImportSummary {
            format: ImportFormat::Json,
            imported_config: slots > 0 || plan.history.is_some(),
            photos,
            media_items,
            message: SINGLE_FILE_MESSAGE.to_string(),
        })
    }
}
