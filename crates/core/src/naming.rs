//! Naming conventions for blob keys, archive entries, and download files.
//!
//! The pairing between a history record and its blobs is implicit: the
//! result image is stored under the record id and the original capture
//! under `{id}-original`. Every place that needs that convention goes
//! through [`result_blob_key`], [`original_blob_key`], or [`BlobRole::of`].

use std::sync::LazyLock;

use regex::Regex;

use crate::backup::{MediaKind, MEDIA_DIR, PHOTOS_DIR};

/// Suffix marking the original (pre-generation) capture of a record.
pub const ORIGINAL_SUFFIX: &str = "-original";

/// Prefix shared by every file this engine emits.
pub const FILE_PREFIX: &str = "dream-dress";

/// Fallback label for records without dream text.
pub const DEFAULT_PHOTO_LABEL: &str = "photo";

/// Characters that are illegal in file names on at least one platform,
/// plus ASCII control characters (not allowed in HTTP header values).
static ILLEGAL_FILE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\?%*:|"<>\x00-\x1f\x7f]"#).expect("valid regex"));

// ---------------------------------------------------------------------------
// Blob keys
// ---------------------------------------------------------------------------

/// Blob key of a record's generated result image.
pub fn result_blob_key(record_id: &str) -> String {
    record_id.to_string()
}

/// Blob key of a record's original capture.
pub fn original_blob_key(record_id: &str) -> String {
    format!("{record_id}{ORIGINAL_SUFFIX}")
}

/// What a stored blob key refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobRole<'a> {
    /// Result image of the record with this id.
    Result(&'a str),
    /// Original capture of the record with this id.
    Original(&'a str),
}

impl<'a> BlobRole<'a> {
    /// Classify a blob key.
    ///
    /// A record id that itself ends in `-original` is indistinguishable from
    /// the original capture of the shorter id.
    pub fn of(key: &'a str) -> Self {
        match key.strip_suffix(ORIGINAL_SUFFIX) {
            Some(id) if !id.is_empty() => Self::Original(id),
            _ => Self::Result(key),
        }
    }

    pub fn record_id(&self) -> &'a str {
        match self {
            Self::Result(id) | Self::Original(id) => id,
        }
    }
}

/// Whether a record id collides with the original-capture naming scheme.
pub fn is_ambiguous_record_id(record_id: &str) -> bool {
    matches!(BlobRole::of(record_id), BlobRole::Original(_))
}

// ---------------------------------------------------------------------------
// File names
// ---------------------------------------------------------------------------

/// Replace characters that are illegal in file names, and control
/// characters such as newlines, with `-`.
pub fn sanitize_file_name(name: &str) -> String {
    ILLEGAL_FILE_CHARS.replace_all(name, "-").into_owned()
}

/// Dream text to use in a file name, falling back to [`DEFAULT_PHOTO_LABEL`].
fn photo_label(dream: &str) -> &str {
    if dream.trim().is_empty() {
        DEFAULT_PHOTO_LABEL
    } else {
        dream
    }
}

/// Entry path of a record's image inside a photos-only archive.
///
/// Convention: `photos/{ordinal}-{dream}[-original].png`, with `ordinal`
/// 1-based.
pub fn photo_entry_name(ordinal: usize, dream: &str, original: bool) -> String {
    let suffix = if original { ORIGINAL_SUFFIX } else { "" };
    let stem = sanitize_file_name(&format!("{ordinal}-{}{suffix}", photo_label(dream)));
    format!("{PHOTOS_DIR}{stem}.png")
}

/// Entry path of a raw stored blob inside a full backup.
pub fn stored_photo_entry_name(key: &str, extension: &str) -> String {
    format!("{PHOTOS_DIR}{key}.{extension}")
}

/// Recover the blob key from a `photos/` entry path.
///
/// Strips the directory prefix and the final extension. Returns `None` for
/// directory entries and paths outside `photos/`.
pub fn key_from_photo_entry(entry: &str) -> Option<String> {
    let name = entry.strip_prefix(PHOTOS_DIR)?;
    if name.is_empty() || name.ends_with('/') {
        return None;
    }
    let key = match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => name,
    };
    Some(key.to_string())
}

/// File name of a virtual-media item inside the `virtual-media/` directory.
pub fn media_file_name(ordinal: usize, media_id: &str, kind: MediaKind) -> String {
    sanitize_file_name(&format!("{ordinal}-{media_id}.{}", kind.extension()))
}

/// Entry path of a virtual-media file.
pub fn media_entry_name(file_name: &str) -> String {
    format!("{MEDIA_DIR}{file_name}")
}

/// Download name for a single exported photo.
pub fn single_photo_file_name(dream: &str, epoch_millis: i64) -> String {
    sanitize_file_name(&format!(
        "{FILE_PREFIX}-{}-{epoch_millis}.png",
        photo_label(dream)
    ))
}

/// Download name for a dated export, e.g. `dream-dress-photos-2026-01-31.zip`.
pub fn dated_file_name(kind: &str, date: chrono::NaiveDate, extension: &str) -> String {
    format!("{FILE_PREFIX}-{kind}-{}.{extension}", date.format("%Y-%m-%d"))
}

/// Whether an uploaded file should be treated as a zip archive.
pub fn is_archive_file_name(file_name: &str) -> bool {
    file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case("zip"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
