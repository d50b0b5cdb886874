//! Integration tests for the archive writer.

mod common;

use assert_matches::assert_matches;
use dreamdress_backup::archive::ArchiveContents;
use dreamdress_backup::BackupError;
use dreamdress_core::backup::{
    BlobMap, ConfigSlot, ExportCategory, MediaKind, VirtualMediaItem, CONFIG_ENTRY,
    HISTORY_ENTRY, MEDIA_INDEX_ENTRY, METADATA_ENTRY,
};
use dreamdress_core::codec::{CONTENT_TYPE_JSON, CONTENT_TYPE_PNG, CONTENT_TYPE_ZIP};
use dreamdress_core::error::CoreError;
use dreamdress_core::progress::NullProgress;
use serde_json::json;

use common::{png, setup, Recorder};

fn blobs(entries: &[(&str, String)]) -> BlobMap {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn photo_paths(contents: &ArchiveContents) -> Vec<String> {
    contents
        .entries_under("photos/")
        .map(|(path, _)| path.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Photos
// ---------------------------------------------------------------------------

#[tokio::test]
async fn photos_on_empty_ledger_fails_without_reading_blobs() {
    let (service, _, _) = setup().await;
    let progress = Recorder::default();

    let result = service.export(ExportCategory::Photos, &progress).await;

    assert_matches!(
        result,
        Err(BackupError::Core(CoreError::EmptyExport(ExportCategory::Photos)))
    );
    // Blob reading starts at 10%.
    assert!(progress.percents().iter().all(|p| *p < 10));
}

#[tokio::test]
async fn photos_on_empty_list_fails() {
    let (service, records, _) = setup().await;
    records.set_history("[]").await.unwrap();

    assert_matches!(
        service.export(ExportCategory::Photos, &NullProgress).await,
        Err(BackupError::Core(CoreError::EmptyExport(_)))
    );
}

#[tokio::test]
async fn single_record_exports_one_image_not_an_archive() {
    let (service, records, store) = setup().await;
    records
        .set_history(r#"[{"id":"1","name":"a","dream":"fly","timestamp":1}]"#)
        .await
        .unwrap();
    store
        .write_all(&blobs(&[("1", png(&[7, 7, 7]))]), &NullProgress)
        .await
        .unwrap();

    let progress = Recorder::default();
    let unit = service.export(ExportCategory::Photos, &progress).await.unwrap();

    assert!(!unit.is_archive());
    assert_eq!(unit.content_type, CONTENT_TYPE_PNG);
    assert_eq!(unit.bytes, vec![7, 7, 7]);
    assert!(unit.file_name.starts_with("dream-dress-fly-"));
    assert!(unit.file_name.ends_with(".png"));
    progress.assert_well_formed();
}

#[tokio::test]
async fn single_record_falls_back_to_inline_payload() {
    let (service, records, _) = setup().await;
    let ledger = json!([{"id": "9", "dream": "", "resultPhoto": png(&[1])}]);
    records.set_history(&ledger.to_string()).await.unwrap();

    let unit = service
        .export(ExportCategory::Photos, &NullProgress)
        .await
        .unwrap();

    assert_eq!(unit.bytes, vec![1]);
    assert!(unit.file_name.starts_with("dream-dress-photo-"));
}

#[tokio::test]
async fn photos_scenario_names_entries_by_ordinal_and_dream() {
    let (service, records, store) = setup().await;
    records
        .set_history(
            r#"[{"id":"1","name":"n1","dream":"fly","timestamp":1},
                {"id":"2","name":"n2","dream":"swim","timestamp":2,"isOnCanvas":true}]"#,
        )
        .await
        .unwrap();
    store
        .write_all(
            &blobs(&[
                ("1", png(&[1])),
                ("2", png(&[2])),
                ("2-original", png(&[3])),
            ]),
            &NullProgress,
        )
        .await
        .unwrap();

    let progress = Recorder::default();
    let unit = service.export(ExportCategory::Photos, &progress).await.unwrap();
    assert_eq!(unit.content_type, CONTENT_TYPE_ZIP);
    assert!(unit.file_name.starts_with("dream-dress-photos-"));
    assert!(unit.file_name.ends_with(".zip"));
    progress.assert_well_formed();

    let contents = ArchiveContents::open(&unit.bytes).unwrap();
    assert_eq!(
        photo_paths(&contents),
        vec!["photos/1-fly.png", "photos/2-swim-original.png", "photos/2-swim.png"]
    );
    assert_eq!(contents.get("photos/2-swim-original.png"), Some(&[3u8][..]));

    let history = contents.json(HISTORY_ENTRY).unwrap();
    let history = history.as_array().unwrap();
    assert_eq!(history.len(), 2);
    for record in history {
        assert!(record.get("resultPhoto").is_none());
        assert!(record.get("originalPhoto").is_none());
    }
    assert_eq!(history[1]["dream"], "swim");
    assert_eq!(history[1]["isOnCanvas"], true);
}

#[tokio::test]
async fn photo_entry_count_counts_originals_twice() {
    let (service, records, store) = setup().await;
    let ledger = json!([
        {"id": "a", "dream": "x"},
        {"id": "b", "dream": "y"},
        {"id": "c", "dream": "z", "originalPhoto": png(&[9])},
    ]);
    records.set_history(&ledger.to_string()).await.unwrap();
    store
        .write_all(
            &blobs(&[
                ("a", png(&[1])),
                ("a-original", png(&[2])),
                ("b", png(&[3])),
                ("c", png(&[4])),
            ]),
            &NullProgress,
        )
        .await
        .unwrap();

    let unit = service
        .export(ExportCategory::Photos, &NullProgress)
        .await
        .unwrap();
    let contents = ArchiveContents::open(&unit.bytes).unwrap();

    // a and c have originals, b does not.
    assert_eq!(photo_paths(&contents).len(), 2 * 2 + 1);
}

#[tokio::test]
async fn dream_text_is_sanitized_in_entry_names() {
    let (service, records, store) = setup().await;
    let ledger = json!([
        {"id": "1", "dream": r#"a/b\c?d%e*f:g|h"i<j>k"#},
        {"id": "2", "dream": "plain"},
    ]);
    records.set_history(&ledger.to_string()).await.unwrap();
    store
        .write_all(&blobs(&[("1", png(&[1])), ("2", png(&[2]))]), &NullProgress)
        .await
        .unwrap();

    let unit = service
        .export(ExportCategory::Photos, &NullProgress)
        .await
        .unwrap();
    let contents = ArchiveContents::open(&unit.bytes).unwrap();

    let paths = photo_paths(&contents);
    assert!(paths.contains(&"photos/1-a-b-c-d-e-f-g-h-i-j-k.png".to_string()));
    for path in &paths {
        let name = path.strip_prefix("photos/").unwrap();
        assert!(!name.chars().any(|c| r#"/\?%*:|"<>"#.contains(c)));
    }
}

#[tokio::test]
async fn null_dream_and_name_fall_back_to_photo() {
    let (service, records, store) = setup().await;
    records
        .set_history(
            r#"[{"id":"1","name":null,"dream":null,"timestamp":1},
                {"id":"2","dream":"swim","timestamp":2},
                {"dream":"no id"}]"#,
        )
        .await
        .unwrap();
    store
        .write_all(&blobs(&[("1", png(&[1])), ("2", png(&[2]))]), &NullProgress)
        .await
        .unwrap();

    let unit = service
        .export(ExportCategory::Photos, &NullProgress)
        .await
        .unwrap();
    let contents = ArchiveContents::open(&unit.bytes).unwrap();

    assert_eq!(
        photo_paths(&contents),
        vec!["photos/1-photo.png", "photos/2-swim.png"]
    );
    let history = contents.json(HISTORY_ENTRY).unwrap();
    assert_eq!(history.as_array().unwrap().len(), 2);
    assert_eq!(history[0]["name"], "");
}

#[tokio::test]
async fn record_without_result_payload_is_skipped() {
    let (service, records, store) = setup().await;
    records
        .set_history(r#"[{"id":"1","dream":"kept"},{"id":"2","dream":"lost"}]"#)
        .await
        .unwrap();
    store
        .write_all(&blobs(&[("1", png(&[1]))]), &NullProgress)
        .await
        .unwrap();

    let unit = service
        .export(ExportCategory::Photos, &NullProgress)
        .await
        .unwrap();
    let contents = ArchiveContents::open(&unit.bytes).unwrap();

    assert_eq!(photo_paths(&contents), vec!["photos/1-kept.png"]);
    assert_eq!(contents.json(HISTORY_ENTRY).unwrap().as_array().unwrap().len(), 2);
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[tokio::test]
async fn config_without_media_is_a_single_json_file() {
    let (service, records, _) = setup().await;
    records
        .set_config_slot(ConfigSlot::Settings, r#"{"volume":3}"#)
        .await
        .unwrap();

    let progress = Recorder::default();
    let unit = service.export(ExportCategory::Config, &progress).await.unwrap();

    assert_eq!(unit.content_type, CONTENT_TYPE_JSON);
    assert!(unit.file_name.starts_with("dream-dress-config-"));
    assert!(unit.file_name.ends_with(".json"));
    assert_eq!(progress.percents(), vec![0, 50, 100]);

    let manifest: serde_json::Value = serde_json::from_slice(&unit.bytes).unwrap();
    assert_eq!(manifest["version"], 3);
    assert_eq!(manifest["type"], "config");
    assert_eq!(manifest["data"]["settings"], r#"{"volume":3}"#);
    assert!(manifest["data"]["templates"].is_null());
}

#[tokio::test]
async fn config_with_media_is_an_archive_with_index() {
    let (service, _, store) = setup().await;
    store
        .replace_virtual_media(&[
            VirtualMediaItem {
                id: "clip".into(),
                kind: MediaKind::Video,
                data_url: "data:video/mp4;base64,AAEC".into(),
                duration: Some(4.0),
            },
            VirtualMediaItem {
                id: "still".into(),
                kind: MediaKind::Image,
                data_url: png(&[5]),
                duration: None,
            },
        ])
        .await
        .unwrap();

    let progress = Recorder::default();
    let unit = service.export(ExportCategory::Config, &progress).await.unwrap();
    assert!(unit.is_archive());
    assert!(unit.file_name.ends_with(".zip"));
    progress.assert_well_formed();

    let contents = ArchiveContents::open(&unit.bytes).unwrap();
    assert!(contents.contains(CONFIG_ENTRY));
    assert_eq!(contents.get("virtual-media/1-clip.mp4"), Some(&[0u8, 1, 2][..]));
    assert_eq!(contents.get("virtual-media/2-still.png"), Some(&[5u8][..]));

    let index = contents.json(MEDIA_INDEX_ENTRY).unwrap();
    assert_eq!(
        index,
        json!([
            {"id": "clip", "type": "video", "filename": "1-clip.mp4", "duration": 4.0},
            {"id": "still", "type": "image", "filename": "2-still.png"},
        ])
    );
}

// ---------------------------------------------------------------------------
// All
// ---------------------------------------------------------------------------

#[tokio::test]
async fn all_writes_every_category_and_metadata() {
    let (service, records, store) = setup().await;
    let ledger = r#"[{"id":"1","dream":"fly"}]"#;
    records.set_history(ledger).await.unwrap();
    records
        .set_config_slot(ConfigSlot::CameraPosition, "left")
        .await
        .unwrap();
    store
        .write_all(
            &blobs(&[
                ("1", png(&[1])),
                ("1-original", "data:image/jpeg;base64,Ag==".to_string()),
            ]),
            &NullProgress,
        )
        .await
        .unwrap();

    let progress = Recorder::default();
    let unit = service.export(ExportCategory::All, &progress).await.unwrap();
    assert!(unit.file_name.starts_with("dream-dress-backup-"));
    progress.assert_well_formed();

    let contents = ArchiveContents::open(&unit.bytes).unwrap();
    assert_eq!(contents.text(HISTORY_ENTRY), Some(ledger));
    assert_eq!(contents.get("photos/1.png"), Some(&[1u8][..]));
    assert_eq!(contents.get("photos/1-original.jpg"), Some(&[2u8][..]));
    assert!(!contents.contains(MEDIA_INDEX_ENTRY));

    let config = contents.json(CONFIG_ENTRY).unwrap();
    assert_eq!(config["type"], "all");
    assert_eq!(config["data"]["cameraPosition"], "left");

    let metadata = contents.json(METADATA_ENTRY).unwrap();
    assert_eq!(metadata["version"], 3);
    assert_eq!(metadata["type"], "all");
    assert_eq!(metadata["photoCount"], 2);
    assert_eq!(metadata["virtualMediaCount"], 0);
}

#[tokio::test]
async fn all_on_empty_stores_still_exports() {
    let (service, _, _) = setup().await;

    let unit = service
        .export(ExportCategory::All, &NullProgress)
        .await
        .unwrap();
    let contents = ArchiveContents::open(&unit.bytes).unwrap();

    assert!(contents.contains(CONFIG_ENTRY));
    assert!(contents.contains(METADATA_ENTRY));
    assert!(!contents.contains(HISTORY_ENTRY));
}
