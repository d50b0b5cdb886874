//! Portable text encoding for binary payloads.
//!
//! Blobs travel through the stores as data URLs
//! (`data:image/png;base64,iVBOR...`). Older ledgers sometimes hold bare
//! base64 without the `data:` prefix, so decoding accepts both forms.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Content type assumed when nothing better is known.
pub const OCTET_STREAM: &str = "application/octet-stream";

pub const CONTENT_TYPE_PNG: &str = "image/png";
pub const CONTENT_TYPE_MP4: &str = "video/mp4";
pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_ZIP: &str = "application/zip";

/// Extension <-> content type table. The first extension listed for a
/// content type is the one used when writing.
const CONTENT_TYPES: &[(&str, &str)] = &[
    ("png", CONTENT_TYPE_PNG),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("webp", "image/webp"),
    ("gif", "image/gif"),
    ("mp4", CONTENT_TYPE_MP4),
    ("webm", "video/webm"),
    ("mov", "video/quicktime"),
    ("json", CONTENT_TYPE_JSON),
    ("zip", CONTENT_TYPE_ZIP),
];

const DATA_URL_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// An in-memory binary object with its content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryObject {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl BinaryObject {
    pub fn new(content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            content_type: content_type.into(),
            bytes,
        }
    }
}

/// A finished export, ready to be handed to the user as a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadUnit {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl DownloadUnit {
    /// Whether this unit is a multi-file zip archive.
    pub fn is_archive(&self) -> bool {
        self.content_type == CONTENT_TYPE_ZIP
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Encode a binary object as a base64 data URL.
pub fn encode(object: &BinaryObject) -> String {
    let content_type = if object.content_type.is_empty() {
        OCTET_STREAM
    } else {
        object.content_type.as_str()
    };
    format!(
        "{DATA_URL_PREFIX}{content_type}{BASE64_MARKER},{}",
        STANDARD.encode(&object.bytes)
    )
}

/// Encode raw bytes, inferring the content type from an archive entry path.
pub fn encode_entry(path: &str, bytes: Vec<u8>) -> String {
    encode(&BinaryObject::new(content_type_for_path(path), bytes))
}

/// Decode a data URL or bare base64 string back into a binary object.
///
/// Data URLs must carry the `;base64` marker; percent-encoded data URLs are
/// rejected as malformed.
pub fn decode(text: &str) -> Result<BinaryObject, CoreError> {
    let text = text.trim();

    let Some(rest) = text.strip_prefix(DATA_URL_PREFIX) else {
        let bytes = STANDARD
            .decode(text)
            .map_err(|e| CoreError::MalformedEncoding(format!("invalid base64 payload: {e}")))?;
        return Ok(BinaryObject::new(OCTET_STREAM, bytes));
    };

    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CoreError::MalformedEncoding("data URL has no payload separator".into()))?;

    let Some(media_type) = header.strip_suffix(BASE64_MARKER) else {
        return Err(CoreError::MalformedEncoding(
            "only base64 data URLs are supported".into(),
        ));
    };

    // Drop parameters such as `;charset=utf-8`.
    let content_type = media_type.split(';').next().unwrap_or_default().trim();
    let content_type = if content_type.is_empty() {
        OCTET_STREAM
    } else {
        content_type
    };

    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| CoreError::MalformedEncoding(format!("invalid base64 payload: {e}")))?;

    Ok(BinaryObject::new(content_type, bytes))
}

/// Materialize a binary object as a downloadable unit.
pub fn to_download(object: BinaryObject, file_name: impl Into<String>) -> DownloadUnit {
    DownloadUnit {
        file_name: file_name.into(),
        content_type: object.content_type,
        bytes: object.bytes,
    }
}

// ---------------------------------------------------------------------------
// Content type inference
// ---------------------------------------------------------------------------

/// Infer a content type from the extension of `path`.
pub fn content_type_for_path(path: &str) -> &'static str {
    let Some((_, ext)) = path.rsplit_once('.') else {
        return OCTET_STREAM;
    };
    let ext = ext.to_ascii_lowercase();
    CONTENT_TYPES
        .iter()
        .find(|(e, _)| *e == ext)
        .map(|(_, ct)| *ct)
        .unwrap_or(OCTET_STREAM)
}

/// File extension to use when writing a payload of `content_type`.
///
/// Unknown types fall back to `png`, the format every capture is stored in.
pub fn extension_for_content_type(content_type: &str) -> &'static str {
    CONTENT_TYPES
        .iter()
        .find(|(_, ct)| ct.eq_ignore_ascii_case(content_type))
        .map(|(e, _)| *e)
        .unwrap_or("png")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn encode_produces_data_url() {
        let object = BinaryObject::new("image/png", b"hello".to_vec());
        assert_eq!(encode(&object), "data:image/png;base64,aGVsbG8=");
    }

    #[test]
    fn encode_empty_content_type_uses_octet_stream() {
        let object = BinaryObject::new("", vec![1, 2, 3]);
        assert!(encode(&object).starts_with("data:application/octet-stream;base64,"));
    }

    #[test]
    fn decode_data_url_reads_content_type() {
        let decoded = decode("data:image/jpeg;base64,aGVsbG8=").unwrap();
        assert_eq!(decoded.content_type, "image/jpeg");
        assert_eq!(decoded.bytes, b"hello");
    }

    #[test]
    fn decode_data_url_drops_parameters() {
        let decoded = decode("data:text/plain;charset=utf-8;base64,aGk=").unwrap();
        assert_eq!(decoded.content_type, "text/plain");
        assert_eq!(decoded.bytes, b"hi");
    }

    #[test]
    fn decode_bare_base64_defaults_to_octet_stream() {
        let decoded = decode("  aGVsbG8=\n").unwrap();
        assert_eq!(decoded.content_type, OCTET_STREAM);
        assert_eq!(decoded.bytes, b"hello");
    }

    #[test]
    fn decode_rejects_garbage() {
        assert_matches!(decode("not base64 at all!"), Err(CoreError::MalformedEncoding(_)));
    }

    #[test]
    fn decode_rejects_data_url_without_separator() {
        assert_matches!(decode("data:image/png;base64"), Err(CoreError::MalformedEncoding(_)));
    }

    #[test]
    fn decode_rejects_percent_encoded_data_url() {
        assert_matches!(decode("data:text/plain,hello"), Err(CoreError::MalformedEncoding(_)));
    }

    #[test]
    fn decode_inverts_encode() {
        let object = BinaryObject::new("video/mp4", (0u8..=255).collect());
        assert_eq!(decode(&encode(&object)).unwrap(), object);
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for_path("photos/1-fly.png"), "image/png");
        assert_eq!(content_type_for_path("virtual-media/2-a.MP4"), "video/mp4");
        assert_eq!(content_type_for_path("photos/x.jpeg"), "image/jpeg");
        assert_eq!(content_type_for_path("photos/noext"), OCTET_STREAM);
        assert_eq!(content_type_for_path("photos/odd.xyz"), OCTET_STREAM);
    }

    #[test]
    fn extension_from_content_type() {
        assert_eq!(extension_for_content_type("image/png"), "png");
        assert_eq!(extension_for_content_type("image/jpeg"), "jpg");
        assert_eq!(extension_for_content_type("VIDEO/MP4"), "mp4");
        assert_eq!(extension_for_content_type(OCTET_STREAM), "png");
    }

    #[test]
    fn to_download_carries_content_type() {
        let unit = to_download(BinaryObject::new("image/png", vec![9]), "a.png");
        assert_eq!(unit.file_name, "a.png");
        assert_eq!(unit.content_type, "image/png");
        assert!(!unit.is_archive());
    }
}
