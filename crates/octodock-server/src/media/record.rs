//! Descriptor of one stored media file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::storage::MediaRow;

pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// One successful upload. Immutable once created; removed only by delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaRecord {
    pub id: String,
    /// `{id}{extension}` under the upload root.
    pub stored_file_name: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub storage_path: PathBuf,
    /// Unix timestamp (seconds).
    pub created_at: i64,
}

impl From<MediaRow> for MediaRecord {
    fn from(row: MediaRow) -> Self {
        Self {
            id: row.id,
            stored_file_name: row.stored_file_name,
            original_name: row.original_name,
            mime_type: row.mime_type,
            size_bytes: u64::try_from(row.size_bytes).unwrap_or_default(),
            storage_path: PathBuf::from(row.storage_path),
            created_at: row.created_at,
        }
    }
}

impl From<&MediaRecord> for MediaRow {
    fn from(record: &MediaRecord) -> Self {
        Self {
            id: record.id.clone(),
            stored_file_name: record.stored_file_name.clone(),
            original_name: record.original_name.clone(),
            mime_type: record.mime_type.clone(),
            size_bytes: i64::try_from(record.size_bytes).unwrap_or(i64::MAX),
            storage_path: record.storage_path.to_string_lossy().into_owned(),
            created_at: record.created_at,
        }
    }
}
