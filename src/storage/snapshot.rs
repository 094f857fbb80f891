//! On-disk JSON/MDX snapshots consumed by the site build.
//!
//! ```text
//! {data_dir}/
//! ├── records/{kind}.json      # every SyncRecord of a kind, sorted by id
//! ├── projects.json            # consumer view, re-rendered from records
//! └── ...
//! {pages_dir}/
//! ├── posts/{slug}.mdx
//! └── projects/{slug}.mdx
//! ```

use std::path::{Component, Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{AppError, Result};
use crate::models::{ContentKind, SyncRecord};
use crate::storage::local::{read_optional, write_atomic};

/// A rendered markup document, path relative to the pages directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub path: PathBuf,
    pub contents: String,
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Reads and writes snapshot files. Writes are atomic and skipped when the
/// file already holds identical bytes.
#[derive(Debug, Clone)]
pub struct SnapshotWriter {
    data_dir: PathBuf,
    pages_dir: PathBuf,
}

impl SnapshotWriter {
    pub fn new(data_dir: impl Into<PathBuf>, pages_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            pages_dir: pages_dir.into(),
        }
    }

    pub fn records_path(&self, kind: ContentKind) -> PathBuf {
        self.data_dir
            .join("records")
            .join(format!("{}.json", kind.as_str()))
    }

    pub fn view_path(&self, kind: ContentKind) -> PathBuf {
        self.data_dir.join(kind.snapshot_file())
    }

    pub fn document_path(&self, document: &Document) -> PathBuf {
        self.pages_dir.join(&document.path)
    }

    /// Load every stored record of a kind. A missing or unreadable file
    /// yields an empty list.
    pub async fn load_records<T: DeserializeOwned>(
        &self,
        kind: ContentKind,
    ) -> Result<Vec<SyncRecord<T>>> {
        let path = self.records_path(kind);
        let Some(bytes) = read_optional(&path).await? else {
            return Ok(Vec::new());
        };
        match serde_json::from_slice(&bytes) {
            Ok(records) => Ok(records),
            Err(e) => {
                log::warn!(
                    "Ignoring corrupt records file {}: {}",
                    path.display(),
                    e
                );
                Ok(Vec::new())
            }
        }
    }

    /// Persist the full record set of a kind, sorted by id.
    pub async fn save_records<T: Serialize>(
        &self,
        kind: ContentKind,
        records: &[SyncRecord<T>],
    ) -> Result<bool> {
        let mut sorted: Vec<&SyncRecord<T>> = records.iter().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));
        self.write_json(&self.records_path(kind), &sorted).await
    }

    /// Write the consumer-facing view of a kind.
    pub async fn write_view<V: Serialize + ?Sized>(&self, kind: ContentKind, view: &V) -> Result<bool> {
        self.write_json(&self.view_path(kind), view).await
    }

    /// Write a document. Paths that are absolute or climb out of the
    /// pages directory are rejected.
    pub async fn write_document(&self, document: &Document) -> Result<bool> {
        let contained = document
            .path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !contained || document.path.as_os_str().is_empty() {
            return Err(AppError::validation(format!(
                "document path {} leaves the pages directory",
                document.path.display()
            )));
        }
        let path = self.document_path(document);
        self.write_if_changed(&path, document.contents.as_bytes())
            .await
    }

    async fn write_json<V: Serialize + ?Sized>(&self, path: &Path, value: &V) -> Result<bool> {
        let mut json = serde_json::to_string_pretty(value)?;
        json.push('\n');
        self.write_if_changed(path, json.as_bytes()).await
    }

    /// Returns whether the file was (re)written.
    async fn write_if_changed(&self, path: &Path, bytes: &[u8]) -> Result<bool> {
        if read_optional(path).await?.as_deref() == Some(bytes) {
            log::debug!("Unchanged: {}", path.display());
            return Ok(false);
        }
        write_atomic(path, bytes).await?;
        log::info!("Wrote {}", path.display());
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn writer(tmp: &TempDir) -> SnapshotWriter {
        SnapshotWriter::new(tmp.path().join("data"), tmp.path().join("pages"))
    }

    #[tokio::test]
    async fn records_round_trip_sorted_by_id() {
        let tmp = TempDir::new().unwrap();
        let snapshots = writer(&tmp);
        let records = vec![
            SyncRecord::new("b", ContentKind::Service, "2024-01-02T00:00:00.000Z", json!({"n": 2})),
            SyncRecord::new("a", ContentKind::Service, "2024-01-01T00:00:00.000Z", json!({"n": 1})),
        ];

        assert!(snapshots.save_records(ContentKind::Service, &records).await.unwrap());
        let loaded: Vec<SyncRecord<serde_json::Value>> =
            snapshots.load_records(ContentKind::Service).await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "a");
        assert_eq!(loaded[1].payload["n"], 2);
    }

    #[tokio::test]
    async fn documents_cannot_escape_the_pages_directory() {
        let tmp = TempDir::new().unwrap();
        let snapshots = writer(&tmp);

        for path in ["../escaped.mdx", "projects/../../escaped.mdx", "/tmp/escaped.mdx"] {
            let result = snapshots.write_document(&Document::new(path, "x")).await;
            assert!(matches!(result, Err(AppError::Validation(_))), "{}", path);
        }
        assert!(!tmp.path().join("escaped.mdx").exists());

        assert!(
            snapshots
                .write_document(&Document::new("projects/demo.mdx", "x"))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn unchanged_writes_are_skipped() {
        let tmp = TempDir::new().unwrap();
        let snapshots = writer(&tmp);
        let view = json!([{ "title": "Demo" }]);

        assert!(snapshots.write_view(ContentKind::Project, &view).await.unwrap());
        let first = std::fs::read(snapshots.view_path(ContentKind::Project)).unwrap();
        assert!(!snapshots.write_view(ContentKind::Project, &view).await.unwrap());
        let second = std::fs::read(snapshots.view_path(ContentKind::Project)).unwrap();
        assert_eq!(first, second);

        let doc = Document::new("projects/demo.mdx", "---\ntitle: \"Demo\"\n---\n");
        assert!(snapshots.write_document(&doc).await.unwrap());
        assert!(!snapshots.write_document(&doc).await.unwrap());
        assert!(tmp.path().join("pages/projects/demo.mdx").exists());
    }

    #[tokio::test]
    async fn corrupt_records_load_as_empty() {
        let tmp = TempDir::new().unwrap();
        let snapshots = writer(&tmp);
        let path = snapshots.records_path(ContentKind::Hero);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{ not json").unwrap();

        let loaded: Vec<SyncRecord<serde_json::Value>> =
            snapshots.load_records(ContentKind::Hero).await.unwrap();
        assert!(loaded.is_empty());
    }
}
