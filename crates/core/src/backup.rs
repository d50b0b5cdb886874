//! Data model shared by the archive writer and reader.
//!
//! Defines the export categories, the fixed configuration slots, history
//! ledger records, virtual-media items, and the manifests written into
//! archives. Wire names are camelCase to stay readable by archives created
//! before this engine existed.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Manifest version written by this engine. Files without a version are
/// legacy backups.
pub const MANIFEST_VERSION: u32 = 3;

/// Config manifest entry.
pub const CONFIG_ENTRY: &str = "config.json";
/// Raw history ledger entry.
pub const HISTORY_ENTRY: &str = "history.json";
/// Summary entry of a full backup.
pub const METADATA_ENTRY: &str = "metadata.json";
/// Directory holding image blobs.
pub const PHOTOS_DIR: &str = "photos/";
/// Directory holding virtual-camera media.
pub const MEDIA_DIR: &str = "virtual-media/";
/// Index of the virtual-media directory.
pub const MEDIA_INDEX_ENTRY: &str = "virtual-media/index.json";

/// Store slot holding the history ledger.
pub const HISTORY_SLOT: &str = "dream-dress-history";

// ---------------------------------------------------------------------------
// Export category
// ---------------------------------------------------------------------------

/// What an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportCategory {
    Photos,
    Config,
    All,
}

impl ExportCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Photos => "photos",
            Self::Config => "config",
            Self::All => "all",
        }
    }

    /// All valid category values.
    pub const ALL: &'static [&'static str] = &["photos", "config", "all"];
}

impl std::str::FromStr for ExportCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photos" => Ok(Self::Photos),
            "config" => Ok(Self::Config),
            "all" => Ok(Self::All),
            other => Err(CoreError::Validation(format!(
                "Unknown export category '{other}'. Must be one of: {:?}",
                Self::ALL
            ))),
        }
    }
}

impl std::fmt::Display for ExportCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Configuration slots
// ---------------------------------------------------------------------------

/// A named configuration slot in the small-record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigSlot {
    CameraPosition,
    Templates,
    AutoTemplates,
    SoundSettings,
    Settings,
    VirtualCameraEnabled,
}

impl ConfigSlot {
    /// Every slot, in manifest order.
    pub const ALL: [ConfigSlot; 6] = [
        Self::CameraPosition,
        Self::Templates,
        Self::AutoTemplates,
        Self::SoundSettings,
        Self::Settings,
        Self::VirtualCameraEnabled,
    ];

    /// Name of the slot in the small-record store.
    pub fn store_key(&self) -> &'static str {
        match self {
            Self::CameraPosition => "dream-dress-camera-position",
            Self::Templates => "dream-dress-custom-templates",
            Self::AutoTemplates => "dream-dress-auto-templates",
            Self::SoundSettings => "dream-dress-sound-settings",
            Self::Settings => "dream-dress-settings",
            Self::VirtualCameraEnabled => "dream-dress-virtual-camera-enabled",
        }
    }

    /// Field name used inside manifests.
    pub fn wire_field(&self) -> &'static str {
        match self {
            Self::CameraPosition => "cameraPosition",
            Self::Templates => "templates",
            Self::AutoTemplates => "autoTemplates",
            Self::SoundSettings => "soundSettings",
            Self::Settings => "settings",
            Self::VirtualCameraEnabled => "virtualCameraEnabled",
        }
    }
}

/// Convert a manifest field into slot text.
///
/// `null` and empty strings count as absent. Non-string values are kept as
/// their compact JSON text.
pub fn slot_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Snapshot of every configuration slot.
///
/// `None` means the slot was empty at export time, or absent from the
/// imported file. Absent slots are never written on restore.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "Map<String, Value>")]
pub struct ConfigSnapshot {
    pub camera_position: Option<String>,
    pub templates: Option<String>,
    pub auto_templates: Option<String>,
    pub sound_settings: Option<String>,
    pub settings: Option<String>,
    pub virtual_camera_enabled: Option<String>,
}

impl ConfigSnapshot {
    pub fn get(&self, slot: ConfigSlot) -> Option<&str> {
        match slot {
            ConfigSlot::CameraPosition => self.camera_position.as_deref(),
            ConfigSlot::Templates => self.templates.as_deref(),
            ConfigSlot::AutoTemplates => self.auto_templates.as_deref(),
            ConfigSlot::SoundSettings => self.sound_settings.as_deref(),
            ConfigSlot::Settings => self.settings.as_deref(),
            ConfigSlot::VirtualCameraEnabled => self.virtual_camera_enabled.as_deref(),
        }
    }

    pub fn set(&mut self, slot: ConfigSlot, value: Option<String>) {
        let field = match slot {
            ConfigSlot::CameraPosition => &mut self.camera_position,
            ConfigSlot::Templates => &mut self.templates,
            ConfigSlot::AutoTemplates => &mut self.auto_templates,
            ConfigSlot::SoundSettings => &mut self.sound_settings,
            ConfigSlot::Settings => &mut self.settings,
            ConfigSlot::VirtualCameraEnabled => &mut self.virtual_camera_enabled,
        };
        *field = value;
    }

    /// Slots holding a non-empty value, in manifest order.
    pub fn present(&self) -> impl Iterator<Item = (ConfigSlot, &str)> {
        ConfigSlot::ALL
            .into_iter()
            .filter_map(move |slot| self.get(slot).filter(|v| !v.is_empty()).map(|v| (slot, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.present().next().is_none()
    }

    /// Read the given slots from a flat map of wire fields.
    pub fn from_fields(fields: &Map<String, Value>, slots: &[ConfigSlot]) -> Self {
        let mut snapshot = Self::default();
        for slot in slots {
            snapshot.set(*slot, fields.get(slot.wire_field()).and_then(slot_text));
        }
        snapshot
    }
}

impl From<Map<String, Value>> for ConfigSnapshot {
    fn from(fields: Map<String, Value>) -> Self {
        Self::from_fields(&fields, &ConfigSlot::ALL)
    }
}

// ---------------------------------------------------------------------------
// History ledger
// ---------------------------------------------------------------------------

/// On-canvas placement of a record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// One completed generation in the history ledger.
///
/// Older ledgers embed the image payloads inline; newer ones keep them in
/// the blob store under [`crate::naming::result_blob_key`] and
/// [`crate::naming::original_blob_key`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub dream: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_photo: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_on_canvas: Option<bool>,
}

/// Payload-free view of a record, written to photos-only archives.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryMeta {
    pub id: String,
    pub name: String,
    pub dream: String,
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_on_canvas: Option<bool>,
}

impl From<&HistoryRecord> for HistoryMeta {
    fn from(record: &HistoryRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            dream: record.dream.clone(),
            timestamp: record.timestamp,
            position: record.position,
            is_on_canvas: record.is_on_canvas,
        }
    }
}

/// Records read from a ledger, plus how many entries could not be read.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedHistory {
    pub records: Vec<HistoryRecord>,
    pub skipped: usize,
}

/// Parse the raw ledger text stored in [`HISTORY_SLOT`].
///
/// The text must be a JSON array. Entries that are not valid records (no
/// usable `id`, wrong field types) are counted in `skipped` and dropped.
pub fn parse_history(text: &str) -> Result<ParsedHistory, serde_json::Error> {
    let entries: Vec<Value> = serde_json::from_str(text)?;
    let mut parsed = ParsedHistory::default();
    for entry in entries {
        match serde_json::from_value::<HistoryRecord>(entry) {
            Ok(record) => parsed.records.push(record),
            Err(_) => parsed.skipped += 1,
        }
    }
    Ok(parsed)
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Virtual media
// ---------------------------------------------------------------------------

/// Kind of a virtual-camera media item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// Parse a stored kind name. Returns `None` for unknown values.
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "image" => Some(Self::Image),
            "video" => Some(Self::Video),
            _ => None,
        }
    }

    /// Extension of the archive entry holding an item of this kind.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Image => "png",
            Self::Video => "mp4",
        }
    }
}

/// A still image or short clip fed to the virtual camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMediaItem {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub data_url: String,
    /// Playback duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

/// One row of `virtual-media/index.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaIndexEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

// ---------------------------------------------------------------------------
// Manifests
// ---------------------------------------------------------------------------

/// Contents of `config.json`, or of a single-file config export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigManifest {
    pub version: u32,
    pub export_time: Timestamp,
    #[serde(rename = "type")]
    pub category: ExportCategory,
    pub data: ConfigSnapshot,
    /// Inline media, carried by some single-file exports. Never written.
    #[serde(default, skip_serializing)]
    pub virtual_media: Option<Vec<VirtualMediaItem>>,
}

impl ConfigManifest {
    pub fn new(category: ExportCategory, data: ConfigSnapshot, export_time: Timestamp) -> Self {
        Self {
            version: MANIFEST_VERSION,
            export_time,
            category,
            data,
            virtual_media: None,
        }
    }
}

/// Contents of `metadata.json` in a full backup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveMetadata {
    pub version: u32,
    pub export_time: Timestamp,
    #[serde(rename = "type")]
    pub category: ExportCategory,
    pub photo_count: usize,
    pub virtual_media_count: usize,
}

/// Blob payloads keyed by storage key.
pub type BlobMap = BTreeMap<String, String>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
