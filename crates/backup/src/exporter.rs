//! Archive writer: turns store contents into a downloadable unit.
//!
//! | Category | Output                                                    |
//! |----------|-----------------------------------------------------------|
//! | photos   | one PNG for a single record, else `photos/` + history zip |
//! | config   | manifest JSON, or zip with `virtual-media/` when present  |
//! | all      | zip with config, media, raw history, raw blobs, metadata  |
//!
//! Exports never mutate a store.

use chrono::{NaiveDate, Utc};
use dreamdress_core::backup::{
    parse_history, ArchiveMetadata, BlobMap, ConfigManifest, ExportCategory, HistoryMeta,
    HistoryRecord, MediaIndexEntry, VirtualMediaItem, CONFIG_ENTRY, HISTORY_ENTRY,
    MANIFEST_VERSION, MEDIA_INDEX_ENTRY, METADATA_ENTRY,
};
use dreamdress_core::codec::{
    self, DownloadUnit, CONTENT_TYPE_JSON, CONTENT_TYPE_PNG, CONTENT_TYPE_ZIP, OCTET_STREAM,
};
use dreamdress_core::error::CoreError;
use dreamdress_core::naming;
use dreamdress_core::progress::{ItemProgress, ProgressSink, ProgressTracker};
use dreamdress_db::{BlobStore, RecordStore};

use crate::archive::ArchiveBuilder;
use crate::error::BackupResult;

const MSG_DONE: &str = "Export complete";
const MSG_COMPRESSING: &str = "Compressing archive";

/// Produces backups from the record and blob stores.
#[derive(Debug, Clone)]
pub struct Exporter {
    records: RecordStore,
    blobs: BlobStore,
}

impl Exporter {
    pub fn new(records: RecordStore, blobs: BlobStore) -> Self {
        Self { records, blobs }
    }

    /// Export `category` as a single downloadable unit.
    ///
    /// Progress goes to `progress` as `(percent, 100, message)`, starting
    /// at 0 and ending with exactly one 100 on success.
    pub async fn export(
        &self,
        category: ExportCategory,
        progress: &dyn ProgressSink,
    ) -> BackupResult<DownloadUnit> {
        let tracker = ProgressTracker::new(progress);
        let unit = match category {
            ExportCategory::Photos => self.export_photos(&tracker).await?,
            ExportCategory::Config => self.export_config(&tracker).await?,
            ExportCategory::All => self.export_all(&tracker).await?,
        };
        tracker.finish(MSG_DONE);

        tracing::info!(
            category = %category,
            file_name = %unit.file_name,
            bytes = unit.bytes.len(),
            "Backup exported",
        );
        Ok(unit)
    }

    // -----------------------------------------------------------------------
    // Photos
    // -----------------------------------------------------------------------

    async fn export_photos(&self, tracker: &ProgressTracker<'_>) -> BackupResult<DownloadUnit> {
        tracker.report(0.0, "Preparing photo export");
        let records = self.load_history().await?;

        let read = tracker.stage(10.0, 80.0);
        read.begin("Reading photos");
        let blobs = self.blobs.read_all(&read).await?;

        if let [record] = records.as_slice() {
            tracker.report(90.0, "Preparing photo download");
            return single_photo(record, &blobs);
        }

        tracker.report(85.0, "Packing photos");
        let mut archive = ArchiveBuilder::new();
        let mut written = 0;
        for (index, record) in records.iter().enumerate() {
            let ordinal = index + 1;
            if naming::is_ambiguous_record_id(&record.id) {
                tracing::warn!(
                    record_id = %record.id,
                    "Record id collides with original-capture naming",
                );
            }

            let Some(result) = result_payload(record, &blobs) else {
                tracing::warn!(record_id = %record.id, "Record has no result image, skipping");
                continue;
            };
            let object = codec::decode(result)?;
            archive.add_bytes(
                naming::photo_entry_name(ordinal, &record.dream, false),
                object.bytes,
            );
            written += 1;

            if let Some(original) = original_payload(record, &blobs) {
                let object = codec::decode(original)?;
                archive.add_bytes(
                    naming::photo_entry_name(ordinal, &record.dream, true),
                    object.bytes,
                );
                written += 1;
            }
        }

        let meta: Vec<HistoryMeta> = records.iter().map(HistoryMeta::from).collect();
        archive.add_json(HISTORY_ENTRY, &meta)?;

        tracker.report(95.0, MSG_COMPRESSING);
        let bytes = archive.finish()?;
        tracing::debug!(records = records.len(), photos = written, "Photo archive built");

        Ok(zip_unit(naming::dated_file_name("photos", today(), "zip"), bytes))
    }

    /// Parsed history ledger. Fails with `EmptyExport` before any blob is
    /// read when the ledger is missing or empty.
    async fn load_history(&self) -> BackupResult<Vec<HistoryRecord>> {
        let ledger = self
            .records
            .history()
            .await?
            .filter(|text| !text.trim().is_empty())
            .ok_or(CoreError::EmptyExport(ExportCategory::Photos))?;

        let parsed = parse_history(&ledger)?;
        if parsed.skipped > 0 {
            tracing::warn!(skipped = parsed.skipped, "Skipping unreadable history records");
        }
        let records = parsed.records;
        if records.is_empty() {
            return Err(CoreError::EmptyExport(ExportCategory::Photos).into());
        }
        Ok(records)
    }

    // -----------------------------------------------------------------------
    // Config
    // -----------------------------------------------------------------------

    async fn export_config(&self, tracker: &ProgressTracker<'_>) -> BackupResult<DownloadUnit> {
        tracker.report(0.0, "Preparing configuration export");
        let snapshot = self.records.config_snapshot().await?;
        let media = self.blobs.virtual_media().await?;
        let manifest = ConfigManifest::new(ExportCategory::Config, snapshot, Utc::now());

        if media.is_empty() {
            tracker.report(50.0, "Writing configuration file");
            return Ok(DownloadUnit {
                file_name: naming::dated_file_name("config", today(), "json"),
                content_type: CONTENT_TYPE_JSON.to_string(),
                bytes: serde_json::to_vec_pretty(&manifest)?,
            });
        }

        let pack = tracker.stage(30.0, 90.0);
        pack.begin("Packing configuration and media");
        let mut archive = ArchiveBuilder::new();
        archive.add_json(CONFIG_ENTRY, &manifest)?;
        add_virtual_media(&mut archive, &media, &pack)?;

        tracker.report(95.0, MSG_COMPRESSING);
        let bytes = archive.finish()?;
        Ok(zip_unit(naming::dated_file_name("config", today(), "zip"), bytes))
    }

    // -----------------------------------------------------------------------
    // All
    // -----------------------------------------------------------------------

    async fn export_all(&self, tracker: &ProgressTracker<'_>) -> BackupResult<DownloadUnit> {
        tracker.report(0.0, "Preparing full backup");
        let export_time = Utc::now();
        let mut archive = ArchiveBuilder::new();

        tracker.report(5.0, "Reading configuration");
        let snapshot = self.records.config_snapshot().await?;
        archive.add_json(
            CONFIG_ENTRY,
            &ConfigManifest::new(ExportCategory::All, snapshot, export_time),
        )?;

        let media = self.blobs.virtual_media().await?;
        if !media.is_empty() {
            let pack = tracker.stage(10.0, 20.0);
            pack.begin("Packing virtual camera media");
            add_virtual_media(&mut archive, &media, &pack)?;
        }

        tracker.report(20.0, "Reading history");
        if let Some(ledger) = self.records.history().await? {
            archive.add_bytes(HISTORY_ENTRY, ledger.into_bytes());
        }

        let read = tracker.stage(25.0, 85.0);
        read.begin("Reading photos");
        let blobs = self.blobs.read_all(&read).await?;

        let pack = tracker.stage(85.0, 95.0);
        let total = blobs.len();
        for (index, (key, payload)) in blobs.iter().enumerate() {
            let object = codec::decode(payload)?;
            let extension = codec::extension_for_content_type(&object.content_type);
            archive.add_bytes(naming::stored_photo_entry_name(key, extension), object.bytes);
            pack.item(index + 1, total, &format!("Packing photo {}/{total}", index + 1));
        }

        archive.add_json(
            METADATA_ENTRY,
            &ArchiveMetadata {
                version: MANIFEST_VERSION,
                export_time,
                category: ExportCategory::All,
                photo_count: total,
                virtual_media_count: media.len(),
            },
        )?;

        tracker.report(95.0, MSG_COMPRESSING);
        let entries = archive.len();
        let bytes = archive.finish()?;
        tracing::debug!(entries, photos = total, media = media.len(), "Full backup built");

        Ok(zip_unit(naming::dated_file_name("backup", today(), "zip"), bytes))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn zip_unit(file_name: String, bytes: Vec<u8>) -> DownloadUnit {
    DownloadUnit {
        file_name,
        content_type: CONTENT_TYPE_ZIP.to_string(),
        bytes,
    }
}

fn non_empty(payload: Option<&String>) -> Option<&str> {
    payload.map(String::as_str).filter(|p| !p.is_empty())
}

/// Stored result image, falling back to the payload inlined in the ledger.
fn result_payload<'a>(record: &'a HistoryRecord, blobs: &'a BlobMap) -> Option<&'a str> {
    non_empty(blobs.get(&naming::result_blob_key(&record.id)))
        .or_else(|| non_empty(record.result_photo.as_ref()))
}

/// Stored original capture, falling back to the inlined payload.
fn original_payload<'a>(record: &'a HistoryRecord, blobs: &'a BlobMap) -> Option<&'a str> {
    non_empty(blobs.get(&naming::original_blob_key(&record.id)))
        .or_else(|| non_empty(record.original_photo.as_ref()))
}

fn single_photo(record: &HistoryRecord, blobs: &BlobMap) -> BackupResult<DownloadUnit> {
    let payload = result_payload(record, blobs).ok_or_else(|| {
        tracing::warn!(record_id = %record.id, "Only record has no result image");
        CoreError::EmptyExport(ExportCategory::Photos)
    })?;
    let mut object = codec::decode(payload)?;
    if object.content_type == OCTET_STREAM {
        object.content_type = CONTENT_TYPE_PNG.to_string();
    }
    let file_name =
        naming::single_photo_file_name(&record.dream, Utc::now().timestamp_millis());
    Ok(codec::to_download(object, file_name))
}

/// Write one entry per media item plus `virtual-media/index.json`.
fn add_virtual_media(
    archive: &mut ArchiveBuilder,
    media: &[VirtualMediaItem],
    progress: &dyn ItemProgress,
) -> BackupResult<()> {
    let total = media.len();
    let mut index = Vec::with_capacity(total);
    for (position, item) in media.iter().enumerate() {
        let ordinal = position + 1;
        let file_name = naming::media_file_name(ordinal, &item.id, item.kind);
        let object = codec::decode(&item.data_url)?;
        archive.add_bytes(naming::media_entry_name(&file_name), object.bytes);
        index.push(MediaIndexEntry {
            id: item.id.clone(),
            kind: item.kind,
            filename: file_name,
            duration: item.duration,
        });
        progress.item(ordinal, total, &format!("Packing media {ordinal}/{total}"));
    }
    archive.add_json(MEDIA_INDEX_ENTRY, &index)
}
