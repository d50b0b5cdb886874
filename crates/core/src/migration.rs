//! Schema normalization for single-file backups and config manifests.
//!
//! Two single-file shapes exist in the wild:
//!
//! - **Current**: a versioned config manifest (`version`, `type`, `data`,
//!   optionally inline `virtualMedia`) as written by config-only exports.
//! - **Legacy**: an unversioned record with an optional `data` object
//!   (`history`, `cameraPosition`, `templates`, `soundSettings`,
//!   `settings`) and an optional top-level `images` map.
//!
//! Both are parsed into [`BackupPayload`] and flattened into a
//! [`RestorePlan`] before anything touches a store. Field presence is the
//! only migration signal: a field is applied iff it is present and not
//! null or empty.

use serde_json::{Map, Value};

use crate::backup::{slot_text, BlobMap, ConfigSlot, ConfigSnapshot, VirtualMediaItem};
use crate::error::CoreError;

/// Config slots understood by the legacy single-file format.
pub const LEGACY_CONFIG_SLOTS: &[ConfigSlot] = &[
    ConfigSlot::CameraPosition,
    ConfigSlot::Templates,
    ConfigSlot::SoundSettings,
    ConfigSlot::Settings,
];

const FIELD_DATA: &str = "data";
const FIELD_TYPE: &str = "type";
const FIELD_VERSION: &str = "version";
const FIELD_HISTORY: &str = "history";
const FIELD_IMAGES: &str = "images";
const FIELD_VIRTUAL_MEDIA: &str = "virtualMedia";

// ---------------------------------------------------------------------------
// Payload variants
// ---------------------------------------------------------------------------

/// A versioned single-file config manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentBackup {
    pub version: u64,
    pub config: ConfigSnapshot,
    pub virtual_media: Vec<VirtualMediaItem>,
    pub images: BlobMap,
}

/// An unversioned single-file backup.
#[derive(Debug, Clone, PartialEq)]
pub struct LegacyBackup {
    pub history: Option<String>,
    pub config: ConfigSnapshot,
    pub images: BlobMap,
}

/// Any single-file backup shape this engine can restore.
#[derive(Debug, Clone, PartialEq)]
pub enum BackupPayload {
    Current(CurrentBackup),
    Legacy(LegacyBackup),
}

/// Everything a single-file import will write, already filtered to
/// present fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestorePlan {
    pub history: Option<String>,
    pub config: ConfigSnapshot,
    pub images: BlobMap,
    pub virtual_media: Vec<VirtualMediaItem>,
}

impl RestorePlan {
    pub fn is_empty(&self) -> bool {
        self.history.is_none()
            && self.config.is_empty()
            && self.images.is_empty()
            && self.virtual_media.is_empty()
    }
}

impl BackupPayload {
    /// Classify a parsed single-file backup.
    ///
    /// Fails with [`CoreError::InvalidBackupFormat`] when the value is not an
    /// object or carries neither `data` nor `type`.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        let Value::Object(root) = value else {
            return Err(CoreError::InvalidBackupFormat(
                "backup file must be a JSON object".into(),
            ));
        };

        let data = root.get(FIELD_DATA).filter(|v| !v.is_null());
        let kind = root.get(FIELD_TYPE).filter(|v| !v.is_null());
        if data.is_none() && kind.is_none() {
            return Err(CoreError::InvalidBackupFormat(
                "backup file has neither a 'data' nor a 'type' field".into(),
            ));
        }

        let empty = Map::new();
        let data = data.and_then(Value::as_object).unwrap_or(&empty);
        let images = blob_map(root.get(FIELD_IMAGES));

        match root.get(FIELD_VERSION).and_then(Value::as_u64) {
            Some(version) => Ok(Self::Current(CurrentBackup {
                version,
                config: ConfigSnapshot::from_fields(data, &ConfigSlot::ALL),
                virtual_media: virtual_media(root.get(FIELD_VIRTUAL_MEDIA)),
                images,
            })),
            None => Ok(Self::Legacy(LegacyBackup {
                history: data.get(FIELD_HISTORY).and_then(slot_text),
                config: ConfigSnapshot::from_fields(data, LEGACY_CONFIG_SLOTS),
                images,
            })),
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy(_))
    }

    /// Flatten onto the canonical category set.
    pub fn normalize(self) -> RestorePlan {
        match self {
            Self::Current(current) => RestorePlan {
                history: None,
                config: current.config,
                images: current.images,
                virtual_media: current.virtual_media,
            },
            Self::Legacy(legacy) => RestorePlan {
                history: legacy.history,
                config: legacy.config,
                images: legacy.images,
                virtual_media: Vec::new(),
            },
        }
    }
}

/// Read the config slots out of a `config.json` archive entry.
///
/// Config-only exports nest the slots under `data`; full backups written by
/// older releases stored them as a flat object. Both are accepted.
pub fn config_from_manifest(value: &Value) -> ConfigSnapshot {
    let Some(root) = value.as_object() else {
        return ConfigSnapshot::default();
    };
    match root.get(FIELD_DATA).and_then(Value::as_object) {
        Some(data) => ConfigSnapshot::from_fields(data, &ConfigSlot::ALL),
        None => ConfigSnapshot::from_fields(root, &ConfigSlot::ALL),
    }
}

fn blob_map(value: Option<&Value>) -> BlobMap {
    value
        .and_then(Value::as_object)
        .map(|images| {
            images
                .iter()
                .filter_map(|(key, payload)| match payload {
                    Value::String(s) if !s.is_empty() => Some((key.clone(), s.clone())),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

fn virtual_media(value: Option<&Value>) -> Vec<VirtualMediaItem> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| serde_json::from_value::<VirtualMediaItem>(item.clone()).ok())
                .filter(|item| !item.data_url.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
