//! Image pipeline: download, dedup by content, re-encode, store.

use std::collections::{BTreeMap, HashSet};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageReader};

use crate::error::{AppError, Result};
use crate::models::{AssetCategory, ImageConfig, ManifestEntry};
use crate::storage::local::{read_optional, write_atomic};
use crate::storage::{AssetFormat, AssetStore, LocalAssetStore, asset_filename, content_hash};

/// Fetches raw bytes for an image URL.
#[async_trait]
pub trait Downloader: Send + Sync {
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

/// Downloader over a shared reqwest client.
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Downloader for HttpDownloader {
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Err(AppError::asset(url, "empty download"));
        }
        Ok(bytes.to_vec())
    }
}

// --- Manifest ---

/// Source URL to stored asset mapping, persisted as one JSON object.
#[derive(Debug, Clone)]
pub struct AssetManifest {
    path: PathBuf,
    entries: BTreeMap<String, ManifestEntry>,
}

impl AssetManifest {
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: BTreeMap::new(),
        }
    }

    /// Load the manifest. Missing or corrupt files start from empty.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = match read_optional(&path).await? {
            None => BTreeMap::new(),
            Some(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                log::warn!("Image manifest {} is unreadable ({}), starting fresh", path.display(), e);
                BTreeMap::new()
            }),
        };
        log::info!("Loaded image manifest with {} entries", entries.len());
        Ok(Self { path, entries })
    }

    pub async fn save(&self) -> Result<()> {
        let mut json = serde_json::to_string_pretty(&self.entries)?;
        json.push('\n');
        write_atomic(&self.path, json.as_bytes()).await?;
        log::info!("Saved image manifest with {} entries", self.entries.len());
        Ok(())
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

    pub fn get(&self, source_url: &str) -> Option<&ManifestEntry> {
        self.entries.get(source_url)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&String, &ManifestEntry)> {
        self.entries.iter()
    }

    /// Any entry already pointing at `filename`.
    pub fn find_by_filename(&self, filename: &str) -> Option<&ManifestEntry> {
        self.entries.values().find(|e| e.filename == filename)
    }

    pub fn insert(&mut self, source_url: impl Into<String>, entry: ManifestEntry) {
        self.entries.insert(source_url.into(), entry);
    }

    /// Filenames referenced by an entry used within the retention window.
    pub fn used_filenames(&self, now: DateTime<Utc>, retention: Duration) -> HashSet<String> {
        self.entries
            .values()
            .filter(|e| now - e.last_used <= retention)
            .map(|e| e.filename.clone())
            .collect()
    }

    /// Drop entries whose file is no longer used. Returns how many were removed.
    pub fn prune(&mut self, used: &HashSet<String>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| used.contains(&e.filename));
        before - self.entries.len()
    }
}

// --- Optimisation ---

/// Re-encode and downscale. `Ok(None)` means keep the original bytes:
/// animated or vector formats, optimisation disabled, or a result that
/// came out larger than the input.
pub fn optimize(bytes: &[u8], format: AssetFormat, config: &ImageConfig) -> Result<Option<Vec<u8>>> {
    if !config.optimize {
        return Ok(None);
    }
    if !matches!(format, AssetFormat::JPEG | AssetFormat::PNG | AssetFormat::WEBP) {
        return Ok(None);
    }

    let mut img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;
    let (width, height) = img.dimensions();
    let max = config.max_dimension;
    if width > max || height > max {
        log::debug!("Resizing {}x{} to fit {}x{}", width, height, max, max);
        img = img.resize(max, max, FilterType::Lanczos3);
    }

    let mut out = Vec::new();
    match format {
        AssetFormat::JPEG => {
            let encoder = JpegEncoder::new_with_quality(&mut out, config.jpeg_quality);
            DynamicImage::ImageRgb8(img.to_rgb8()).write_with_encoder(encoder)?;
        }
        AssetFormat::PNG => {
            let encoder =
                PngEncoder::new_with_quality(&mut out, CompressionType::Best, PngFilter::Adaptive);
            img.write_with_encoder(encoder)?;
        }
        _ => {
            let encoder = WebPEncoder::new_lossless(&mut out);
            DynamicImage::ImageRgba8(img.to_rgba8()).write_with_encoder(encoder)?;
        }
    }

    if out.len() >= bytes.len() && width <= max && height <= max {
        log::debug!("Re-encoded image is not smaller, keeping original");
        return Ok(None);
    }
    Ok(Some(out))
}

// --- Pipeline ---

/// Result of an unused-asset sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub pruned_entries: usize,
    pub deleted_files: usize,
    pub kept_files: usize,
}

/// Turns arbitrary image URLs into stable URLs inside the asset store.
pub struct ImagePipeline {
    store: Arc<dyn AssetStore>,
    downloader: Arc<dyn Downloader>,
    manifest: AssetManifest,
    config: ImageConfig,
    now: DateTime<Utc>,
    uploads: usize,
}

impl ImagePipeline {
    pub fn new(
        store: Arc<dyn AssetStore>,
        downloader: Arc<dyn Downloader>,
        manifest: AssetManifest,
        config: ImageConfig,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            store,
            downloader,
            manifest,
            config,
            now,
            uploads: 0,
        }
    }

    pub fn store(&self) -> &dyn AssetStore {
        self.store.as_ref()
    }

    pub fn manifest(&self) -> &AssetManifest {
        &self.manifest
    }

    /// Number of objects written to the store by this pipeline.
    pub fn uploads(&self) -> usize {
        self.uploads
    }

    /// Resolve `url` to a stored asset URL. Never fails: any problem is
    /// logged and yields `None`, leaving the caller's reference untouched.
    pub async fn process_image_url(
        &mut self,
        url: &str,
        category: AssetCategory,
        is_cover: bool,
    ) -> Option<String> {
        let url = url.trim();
        if url.is_empty() {
            return None;
        }
        match self.try_process(url, category, is_cover).await {
            Ok(stored) => Some(stored),
            Err(e) => {
                log::warn!("Image {} left unprocessed: {}", url, e);
                None
            }
        }
    }

    async fn try_process(&mut self, url: &str, category: AssetCategory, is_cover: bool) -> Result<String> {
        if let Some(stored) = self.store.locate(url) {
            if stored.category == Some(category) {
                log::debug!("{} is already stored under {}", url, category);
                return Ok(url.to_string());
            }
            return self.relocate(url, &stored.filename, stored.category, category, is_cover).await;
        }

        log::debug!("Downloading image {}", url);
        let bytes = self.downloader.download(url).await?;
        if bytes.is_empty() {
            return Err(AppError::asset(url, "empty download"));
        }

        let hash = content_hash(&bytes);
        let format = AssetFormat::detect(&bytes, Some(url));
        let filename = asset_filename(&hash, category, is_cover, format.extension);

        // The manifest outlives storage-mode switches, so a hit only counts
        // when the current store holds the object.
        if self.manifest.find_by_filename(&filename).is_some()
            && self.store.exists(&filename, category).await?
        {
            let path = self.store.public_url(&filename, category);
            log::debug!("{} matches stored {}", url, filename);
            self.record(url, &filename, format, &hash, category, &path);
            return Ok(path);
        }

        let optimized = match optimize(&bytes, format, &self.config) {
            Ok(optimized) => optimized,
            Err(e) => {
                log::warn!("Could not optimise {}: {}. Storing original bytes", url, e);
                None
            }
        };
        let body = optimized.as_deref().unwrap_or(&bytes);

        if self
            .store
            .store_as(&filename, category, body, format.content_type)
            .await?
        {
            self.uploads += 1;
        }
        let path = self.store.public_url(&filename, category);
        self.record(url, &filename, format, &hash, category, &path);
        Ok(path)
    }

    /// Move an asset from another category (or a legacy flat location)
    /// into `category`. The old object stays where it is.
    async fn relocate(
        &mut self,
        url: &str,
        filename: &str,
        from: Option<AssetCategory>,
        category: AssetCategory,
        is_cover: bool,
    ) -> Result<String> {
        let bytes = match from {
            Some(from) => self.store.read(filename, from).await?,
            None => self.store.read_legacy(filename).await?,
        }
        .ok_or_else(|| AppError::asset(filename, "stored asset is missing"))?;
        let from = from.unwrap_or_else(|| AssetCategory::classify(filename));
        log::info!("Moving {} from {} to {}", filename, from, category);
        let format = AssetFormat::detect(&bytes, Some(filename));
        let hash = content_hash(&bytes);
        // Keep the original content hash when the name follows our scheme.
        let new_name = match filename.strip_prefix(from.filename_prefix()) {
            Some(rest) if !rest.is_empty() => format!("{}{}", category.filename_prefix(), rest),
            _ => asset_filename(&hash, category, is_cover, format.extension),
        };

        if self
            .store
            .store_as(&new_name, category, &bytes, format.content_type)
            .await?
        {
            self.uploads += 1;
        }
        let path = self.store.public_url(&new_name, category);
        self.record(url, &new_name, format, &hash, category, &path);
        Ok(path)
    }

    fn record(
        &mut self,
        url: &str,
        filename: &str,
        format: AssetFormat,
        hash: &str,
        category: AssetCategory,
        path: &str,
    ) {
        self.manifest.insert(
            url,
            ManifestEntry {
                filename: filename.to_string(),
                content_type: format.content_type.to_string(),
                content_hash: hash.to_string(),
                category,
                last_used: self.now,
                path: path.to_string(),
            },
        );
    }

    pub async fn save_manifest(&self) -> Result<()> {
        self.manifest.save().await
    }

    /// Drop manifest entries unused for longer than the retention window.
    /// With a remote store, local copies of those files are deleted once
    /// the remote copy is confirmed; local files are never the last copy
    /// to be removed.
    pub async fn sweep(&mut self, local: Option<&LocalAssetStore>) -> Result<SweepReport> {
        let retention = Duration::days(self.config.retention_days);
        let used = self.manifest.used_filenames(self.now, retention);
        let mut report = SweepReport {
            pruned_entries: self.manifest.prune(&used),
            ..SweepReport::default()
        };

        if let Some(local) = local {
            for asset in local.list().await? {
                if used.contains(&asset.filename) {
                    report.kept_files += 1;
                    continue;
                }
                if self.store.exists(&asset.filename, asset.category).await? {
                    local.delete(&asset.filename, asset.category).await?;
                    report.deleted_files += 1;
                } else {
                    log::info!("Keeping {} (no {} copy)", asset.filename, self.store.name());
                    report.kept_files += 1;
                }
            }
        }

        log::info!(
            "Sweep: {} manifest entries pruned, {} local files deleted, {} kept",
            report.pruned_entries,
            report.deleted_files,
            report.kept_files
        );
        Ok(report)
    }
}
