//! Virtual-camera media rows.

use dreamdress_core::backup::{MediaKind, VirtualMediaItem};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `virtual_media` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct VirtualMediaRow {
    pub position: i64,
    pub id: String,
    pub kind: String,
    pub data_url: String,
    pub duration: Option<f64>,
}

impl VirtualMediaRow {
    /// Convert to the domain item. Returns `None` for an unknown kind.
    pub fn into_item(self) -> Option<VirtualMediaItem> {
        let kind = MediaKind::from_name(&self.kind)?;
        Some(VirtualMediaItem {
            id: self.id,
            kind,
            data_url: self.data_url,
            duration: self.duration,
        })
    }
}
