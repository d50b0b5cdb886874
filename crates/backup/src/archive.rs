//! In-memory zip archives.
//!
//! Both sides work on plain byte buffers: [`ArchiveBuilder`] collects
//! entries and compresses them in one pass, [`ArchiveContents`] unpacks
//! every file entry up front so callers never hold a zip reader across a
//! store write.

use std::collections::BTreeMap;
use std::io::{Cursor, Read, Write};

use dreamdress_core::error::CoreError;
use serde::Serialize;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::BackupResult;

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Ordered list of entries waiting to be compressed.
#[derive(Debug, Default)]
pub struct ArchiveBuilder {
    entries: Vec<(String, Vec<u8>)>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file entry. A later entry with the same path replaces the
    /// earlier one.
    pub fn add_bytes(&mut self, path: impl Into<String>, bytes: Vec<u8>) {
        let path = path.into();
        if let Some(existing) = self.entries.iter_mut().find(|entry| entry.0 == path) {
            tracing::warn!(path = %path, "Duplicate archive entry replaced");
            existing.1 = bytes;
            return;
        }
        self.entries.push((path, bytes));
    }

    /// Add a pretty-printed JSON entry.
    pub fn add_json<T: Serialize + ?Sized>(
        &mut self,
        path: impl Into<String>,
        value: &T,
    ) -> BackupResult<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.add_bytes(path, bytes);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Compress every entry with deflate and return the zip bytes.
    pub fn finish(self) -> BackupResult<Vec<u8>> {
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (path, bytes) in &self.entries {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(bytes)?;
        }
        Ok(zip.finish()?.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Every readable file entry of an uploaded archive, keyed by path.
#[derive(Debug, Default)]
pub struct ArchiveContents {
    entries: BTreeMap<String, Vec<u8>>,
}

impl ArchiveContents {
    /// Unpack `bytes`. Fails with [`CoreError::InvalidBackupFormat`] when
    /// the buffer is not a zip archive; unreadable entries are skipped.
    pub fn open(bytes: &[u8]) -> BackupResult<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
            CoreError::InvalidBackupFormat(format!("not a readable zip archive: {e}"))
        })?;

        let mut entries = BTreeMap::new();
        for index in 0..archive.len() {
            let mut file = match archive.by_index(index) {
                Ok(file) => file,
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping unreadable archive entry");
                    continue;
                }
            };
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut buffer = Vec::new();
            if let Err(e) = file.read_to_end(&mut buffer) {
                tracing::warn!(entry = %name, error = %e, "Skipping unreadable archive entry");
                continue;
            }
            entries.insert(name, buffer);
        }

        Ok(Self { entries })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.entries.get(path).map(Vec::as_slice)
    }

    /// Entry contents as UTF-8 text. Non-UTF-8 entries read as absent.
    pub fn text(&self, path: &str) -> Option<&str> {
        let bytes = self.get(path)?;
        match std::str::from_utf8(bytes) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::warn!(entry = path, error = %e, "Archive entry is not UTF-8");
                None
            }
        }
    }

    /// Parse an entry as JSON. Missing or malformed entries read as absent.
    pub fn json(&self, path: &str) -> Option<serde_json::Value> {
        let bytes = self.get(path)?;
        match serde_json::from_slice(bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(entry = path, error = %e, "Archive entry is not valid JSON");
                None
            }
        }
    }

    /// File entries whose path starts with `prefix`, in path order.
    pub fn entries_under<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a [u8])> + 'a {
        self.entries
            .range(prefix.to_string()..)
            .take_while(move |(path, _)| path.starts_with(prefix))
            .filter(|(path, _)| !path.ends_with('/'))
            .map(|(path, bytes)| (path.as_str(), bytes.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
