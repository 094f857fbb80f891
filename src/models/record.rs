// src/models/record.rs

//! Persisted sync state: records and asset manifest entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AssetCategory, ContentKind};

/// One synced content item. Identity is `(kind, id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncRecord<T> {
    pub id: String,
    pub kind: ContentKind,
    pub last_edited_at: String,
    pub payload: T,
}

impl<T> SyncRecord<T> {
    pub fn new(
        id: impl Into<String>,
        kind: ContentKind,
        last_edited_at: impl Into<String>,
        payload: T,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            last_edited_at: last_edited_at.into(),
            payload,
        }
    }
}

/// Where a source URL ended up. Keyed by source URL in the manifest file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub filename: String,
    pub content_type: String,
    pub content_hash: String,
    pub category: AssetCategory,
    pub last_used: DateTime<Utc>,
    /// Public URL or site-relative path of the stored asset
    pub path: String,
}
