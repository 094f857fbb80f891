//! Local filesystem asset storage.
//!
//! Assets live under `{root}/{category_prefix}/{filename}` and are served by
//! the site from `{url_base}/{category_prefix}/{filename}`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{AssetCategory, CategoryPrefixes};
use crate::storage::{AssetFormat, AssetStore, StoredAsset};
use crate::utils::url::basename;

/// Ensure the parent directory of `path` exists.
pub(crate) async fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    Ok(())
}

/// Write bytes atomically (write to temp, then rename).
pub(crate) async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    ensure_parent(path).await?;

    let mut tmp_name = path.file_name().unwrap_or_default().to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let mut file = tokio::fs::File::create(&tmp).await?;
    file.write_all(bytes).await?;
    file.flush().await?;
    drop(file);

    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

/// Read bytes, returning None if the file doesn't exist.
pub(crate) async fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(AppError::Io(e)),
    }
}

/// A file found by [`LocalAssetStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalAsset {
    pub category: AssetCategory,
    pub filename: String,
    pub path: PathBuf,
}

/// Local filesystem asset backend.
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    root_dir: PathBuf,
    url_base: String,
    prefixes: CategoryPrefixes,
}

impl LocalAssetStore {
    /// Create a store rooted at `root_dir`, served under `url_base`.
    pub fn new(
        root_dir: impl Into<PathBuf>,
        url_base: impl Into<String>,
        prefixes: CategoryPrefixes,
    ) -> Self {
        Self {
            root_dir: root_dir.into(),
            url_base: url_base.into().trim_end_matches('/').to_string(),
            prefixes,
        }
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Full path of an asset.
    fn path(&self, filename: &str, category: AssetCategory) -> PathBuf {
        self.root_dir
            .join(self.prefixes.get(category))
            .join(basename(filename))
    }

    /// Public URL prefix for one category, with trailing slash.
    fn category_base(&self, category: AssetCategory) -> String {
        format!("{}/{}/", self.url_base, self.prefixes.get(category))
    }

    /// Every asset file currently on disk, grouped by category directory.
    pub async fn list(&self) -> Result<Vec<LocalAsset>> {
        let mut assets = Vec::new();
        for category in AssetCategory::ALL {
            let dir = self.root_dir.join(self.prefixes.get(category));
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(AppError::Io(e)),
            };
            while let Some(entry) = entries.next_entry().await? {
                if !entry.file_type().await?.is_file() {
                    continue;
                }
                let filename = entry.file_name().to_string_lossy().into_owned();
                if filename.ends_with(".tmp") || filename.starts_with('.') {
                    continue;
                }
                assets.push(LocalAsset {
                    category,
                    filename,
                    path: entry.path(),
                });
            }
        }
        assets.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(assets)
    }

    /// Remove an asset. Missing files are not an error.
    pub async fn delete(&self, filename: &str, category: AssetCategory) -> Result<()> {
        let path = self.path(filename, category);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                log::info!("Deleted local asset {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Copy a local asset to `remote`, returning its remote URL. The category
    /// is inferred from the filename prefix; files written before category
    /// directories existed are looked up at the root as well.
    pub async fn migrate(&self, filename: &str, remote: &dyn AssetStore) -> Result<Option<String>> {
        let name = basename(filename);
        let category = AssetCategory::classify(name);

        let bytes = match self.read(name, category).await? {
            Some(bytes) => bytes,
            None => match self.read_legacy(name).await? {
                Some(bytes) => bytes,
                None => {
                    log::warn!("Local asset {} not found, nothing to migrate", name);
                    return Ok(None);
                }
            },
        };
        if bytes.is_empty() {
            return Err(AppError::asset(name, "refusing to migrate an empty file"));
        }

        let format = AssetFormat::detect(&bytes, Some(name));
        if remote
            .store_as(name, category, &bytes, format.content_type)
            .await?
        {
            log::info!("Migrated {} to {}", name, remote.name());
        }
        Ok(Some(remote.public_url(name, category)))
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn put(
        &self,
        filename: &str,
        category: AssetCategory,
        bytes: &[u8],
        _content_type: &str,
    ) -> Result<()> {
        let path = self.path(filename, category);
        write_atomic(&path, bytes).await?;
        log::info!("Stored {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }

    async fn exists(&self, filename: &str, category: AssetCategory) -> Result<bool> {
        Ok(tokio::fs::try_exists(self.path(filename, category)).await?)
    }

    async fn read(&self, filename: &str, category: AssetCategory) -> Result<Option<Vec<u8>>> {
        read_optional(&self.path(filename, category)).await
    }

    async fn read_legacy(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        read_optional(&self.root_dir.join(basename(filename))).await
    }

    fn public_url(&self, filename: &str, category: AssetCategory) -> String {
        let base = self.category_base(category);
        if filename.starts_with(&base) && !basename(filename).is_empty() {
            return filename.to_string();
        }
        format!("{}{}", base, basename(filename))
    }

    fn locate(&self, url: &str) -> Option<StoredAsset> {
        let rest = url.strip_prefix(&self.url_base)?.strip_prefix('/')?;
        let rest = rest.split(['?', '#']).next().unwrap_or(rest);
        let stored = match rest.split_once('/') {
            Some((prefix, filename)) => StoredAsset {
                category: self.prefixes.category_of(prefix),
                filename: basename(filename).to_string(),
            },
            None => StoredAsset {
                category: None,
                filename: rest.to_string(),
            },
        };
        (!stored.filename.is_empty()).then_some(stored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store(tmp: &TempDir) -> LocalAssetStore {
        LocalAssetStore::new(tmp.path(), "/images/notion/", CategoryPrefixes::default())
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/state.json");

        write_atomic(&path, b"hello").await.unwrap();
        assert_eq!(read_optional(&path).await.unwrap(), Some(b"hello".to_vec()));
        assert!(!tmp.path().join("nested/dir/state.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let data = read_optional(&tmp.path().join("nope.txt")).await.unwrap();
        assert!(data.is_none());
    }

    #[tokio::test]
    async fn store_is_idempotent() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let first = store.store(b"\x89PNG\r\n\x1a\nabc", AssetCategory::Projects, false).await.unwrap();
        assert!(first.starts_with("project-"));
        assert!(first.ends_with(".png"));
        assert!(store.exists(&first, AssetCategory::Projects).await.unwrap());
        assert!(tmp.path().join("projects").join(&first).exists());

        let written = store
            .store_as(&first, AssetCategory::Projects, b"ignored", "image/png")
            .await
            .unwrap();
        assert!(!written);
        assert_eq!(
            store.read(&first, AssetCategory::Projects).await.unwrap().unwrap(),
            b"\x89PNG\r\n\x1a\nabc".to_vec()
        );
    }

    #[test]
    fn public_url_uses_category_prefix_without_doubling() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        let url = store.public_url("project-abc.png", AssetCategory::Projects);
        assert_eq!(url, "/images/notion/projects/project-abc.png");
        assert!(!url.contains("/posts/"));

        assert_eq!(store.public_url(&url, AssetCategory::Projects), url);
        assert_eq!(
            store.public_url("projects/project-abc.png", AssetCategory::Projects),
            url
        );

        let post = store.public_url("notion-abc.png", AssetCategory::Posts);
        assert_eq!(post, "/images/notion/posts/notion-abc.png");
        assert!(!post.contains("/projects/"));

        // A URL under the wrong prefix is re-homed, not nested.
        assert_eq!(
            store.public_url(&post, AssetCategory::Projects),
            "/images/notion/projects/notion-abc.png"
        );
    }

    #[test]
    fn locate_recognises_own_urls() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        assert_eq!(
            store.locate("/images/notion/about/about-1.jpg"),
            Some(StoredAsset {
                category: Some(AssetCategory::About),
                filename: "about-1.jpg".into()
            })
        );
        assert_eq!(
            store.locate("/images/notion/legacy.jpg"),
            Some(StoredAsset {
                category: None,
                filename: "legacy.jpg".into()
            })
        );
        assert_eq!(store.locate("https://example.com/a.png"), None);
        assert_eq!(store.locate("/images/notionx/a.png"), None);
    }

    #[tokio::test]
    async fn list_and_delete() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        store
            .put("notion-a.jpg", AssetCategory::Posts, b"a", "image/jpeg")
            .await
            .unwrap();
        store
            .put("author-b.jpg", AssetCategory::Author, b"b", "image/jpeg")
            .await
            .unwrap();

        let listed = store.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().any(|a| a.category == AssetCategory::Author && a.filename == "author-b.jpg"));

        store.delete("notion-a.jpg", AssetCategory::Posts).await.unwrap();
        store.delete("notion-a.jpg", AssetCategory::Posts).await.unwrap();
        assert_eq!(store.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn migrate_copies_to_remote_by_prefix() {
        let local_dir = TempDir::new().unwrap();
        let remote_dir = TempDir::new().unwrap();
        let local = store(&local_dir);
        let remote = LocalAssetStore::new(remote_dir.path(), "https://cdn.example", CategoryPrefixes::default());

        // Legacy flat layout
        tokio::fs::write(local_dir.path().join("project-x.png"), b"png-bytes")
            .await
            .unwrap();

        let url = local.migrate("project-x.png", &remote).await.unwrap();
        assert_eq!(url.as_deref(), Some("https://cdn.example/projects/project-x.png"));
        assert!(remote_dir.path().join("projects/project-x.png").exists());

        assert_eq!(local.migrate("author-missing.png", &remote).await.unwrap(), None);
    }
}
