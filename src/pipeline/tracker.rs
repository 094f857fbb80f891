//! Sync checkpoints.
//!
//! One flat JSON object holds both granularities:
//!
//! ```json
//! { "project:8f1c…": "2024-05-02T10:00:00.000Z", "collection:project": "2024-05-03T08:00:00.000Z" }
//! ```
//!
//! ISO-8601 UTC timestamps sort lexicographically, so comparisons are plain
//! string comparisons.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::Result;
use crate::models::ContentKind;
use crate::storage::local::{read_optional, write_atomic};

/// Format a timestamp the way the content source does.
pub fn iso_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn item_key(kind: ContentKind, id: &str) -> String {
    format!("{}:{}", kind.as_str(), id)
}

fn collection_key(kind: ContentKind) -> String {
    format!("collection:{}", kind.as_str())
}

/// File-backed checkpoint map. Every update rewrites the whole file.
#[derive(Debug, Clone)]
pub struct SyncCheckpoints {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl SyncCheckpoints {
    /// Load checkpoints. Missing or corrupt files start from empty.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match read_optional(&path).await? {
            None => BTreeMap::new(),
            Some(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                log::warn!(
                    "Checkpoint file {} is unreadable ({}), resyncing everything",
                    path.display(),
                    e
                );
                BTreeMap::new()
            }),
        };
        log::debug!("Loaded {} checkpoints from {}", entries.len(), path.display());
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether any item of `kind` has been recorded.
    fn has_items_of(&self, kind: ContentKind) -> bool {
        let prefix = format!("{}:", kind.as_str());
        self.entries
            .range(prefix.clone()..)
            .next()
            .is_some_and(|(k, _)| k.starts_with(&prefix))
    }

    /// Decide whether an item must be re-fetched.
    pub fn needs_sync(
        &self,
        kind: ContentKind,
        id: &str,
        remote_last_edited: Option<&str>,
        force: bool,
    ) -> bool {
        let Some(remote) = remote_last_edited.filter(|r| !r.is_empty()) else {
            return true;
        };
        if force || self.entries.is_empty() || !self.has_items_of(kind) {
            return true;
        }
        match self.entries.get(&item_key(kind, id)) {
            Some(stored) => stored.as_str() < remote,
            None => true,
        }
    }

    pub fn item_last_sync(&self, kind: ContentKind, id: &str) -> Option<&str> {
        self.entries.get(&item_key(kind, id)).map(String::as_str)
    }

    /// Record a successfully processed item.
    pub async fn record_item_sync(
        &mut self,
        kind: ContentKind,
        id: &str,
        remote_last_edited: &str,
    ) -> Result<()> {
        if remote_last_edited.is_empty() {
            return Ok(());
        }
        self.entries
            .insert(item_key(kind, id), remote_last_edited.to_string());
        self.save().await
    }

    /// Record a completed pass over a whole kind.
    pub async fn record_collection_sync(&mut self, kind: ContentKind, at: DateTime<Utc>) -> Result<()> {
        self.entries.insert(collection_key(kind), iso_timestamp(at));
        self.save().await
    }

    pub fn collection_last_sync(&self, kind: ContentKind) -> Option<&str> {
        self.entries.get(&collection_key(kind)).map(String::as_str)
    }

    /// Every collection checkpoint, for status output.
    pub fn collections(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().filter_map(|(k, v)| {
            k.strip_prefix("collection:")
                .map(|kind| (kind, v.as_str()))
        })
    }

    async fn save(&self) -> Result<()> {
        let mut json = serde_json::to_string_pretty(&self.entries)?;
        json.push('\n');
        write_atomic(&self.path, json.as_bytes()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    const T: &str = "2024-05-01T12:00:00.000Z";

    async fn seeded(tmp: &TempDir) -> SyncCheckpoints {
        let mut cp = SyncCheckpoints::load(tmp.path().join("ts.json")).await.unwrap();
        cp.record_item_sync(ContentKind::Project, "p1", T).await.unwrap();
        cp
    }

    #[tokio::test]
    async fn gating_compares_against_stored_timestamp() {
        let tmp = TempDir::new().unwrap();
        let cp = seeded(&tmp).await;

        assert!(!cp.needs_sync(ContentKind::Project, "p1", Some(T), false));
        assert!(!cp.needs_sync(ContentKind::Project, "p1", Some("2024-04-30T00:00:00.000Z"), false));
        assert!(cp.needs_sync(ContentKind::Project, "p1", Some("2024-05-01T12:00:00.001Z"), false));
        assert!(cp.needs_sync(ContentKind::Project, "p1", Some(T), true));
        assert!(cp.needs_sync(ContentKind::Project, "p1", None, false));
        assert!(cp.needs_sync(ContentKind::Project, "p2", Some(T), false));
    }

    #[tokio::test]
    async fn first_sync_of_a_kind_always_fetches() {
        let tmp = TempDir::new().unwrap();
        let mut cp = SyncCheckpoints::load(tmp.path().join("ts.json")).await.unwrap();
        assert!(cp.needs_sync(ContentKind::Post, "a", Some(T), false));

        cp.record_item_sync(ContentKind::Project, "p1", T).await.unwrap();
        // Projects are known, posts are not.
        assert!(cp.needs_sync(ContentKind::Post, "a", Some(T), false));
        // "project-x" style prefixes of other kinds don't count.
        assert!(cp.needs_sync(ContentKind::SocialLink, "s", Some(T), false));
    }

    #[tokio::test]
    async fn persists_item_and_collection_keys() {
        let tmp = TempDir::new().unwrap();
        let mut cp = seeded(&tmp).await;
        let at = Utc.with_ymd_and_hms(2024, 5, 3, 8, 0, 0).unwrap();
        cp.record_collection_sync(ContentKind::Project, at).await.unwrap();

        let reloaded = SyncCheckpoints::load(cp.path().to_path_buf()).await.unwrap();
        assert_eq!(reloaded.item_last_sync(ContentKind::Project, "p1"), Some(T));
        assert_eq!(
            reloaded.collection_last_sync(ContentKind::Project),
            Some("2024-05-03T08:00:00.000Z")
        );
        assert_eq!(reloaded.collection_last_sync(ContentKind::Post), None);
        assert_eq!(reloaded.collections().count(), 1);

        let raw: serde_json::Value =
            serde_json::from_slice(&std::fs::read(cp.path()).unwrap()).unwrap();
        assert_eq!(raw["project:p1"], T);
        assert_eq!(raw["collection:project"], "2024-05-03T08:00:00.000Z");
    }

    #[tokio::test]
    async fn corrupt_file_means_resync() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("ts.json");
        std::fs::write(&path, "not json").unwrap();

        let cp = SyncCheckpoints::load(&path).await.unwrap();
        assert!(cp.is_empty());
        assert!(cp.needs_sync(ContentKind::Hero, "h", Some(T), false));
    }
}
