//! In-memory collaborators for pipeline tests.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use tempfile::TempDir;

use crate::error::{AppError, Result};
use crate::models::{ContentKind, SyncConfig};
use crate::notion::{Block, CollectionQuery, ContentSource, Page};
use crate::pipeline::context::SyncContext;
use crate::pipeline::images::{AssetManifest, Downloader, ImagePipeline};
use crate::pipeline::tracker::SyncCheckpoints;
use crate::storage::{LocalAssetStore, SnapshotWriter};

/// A small PNG with a gradient so distinct sizes hash differently.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x * 40 % 256) as u8, (y * 40 % 256) as u8, 128, 255])
    });
    let mut out = Cursor::new(Vec::new());
    DynamicImage::ImageRgba8(img)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

#[derive(Clone, Default)]
pub struct FakeDownloader {
    responses: HashMap<String, Vec<u8>>,
    calls: Arc<AtomicUsize>,
}

impl FakeDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.responses.insert(url.to_string(), bytes);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.responses.get(url) {
            Some(bytes) if bytes.is_empty() => Err(AppError::asset(url, "empty download")),
            Some(bytes) => Ok(bytes.clone()),
            None => Err(AppError::asset(url, "404 Not Found")),
        }
    }
}

/// Pages per database id and block children per block id.
#[derive(Default)]
pub struct FakeSource {
    pages: HashMap<String, Vec<Page>>,
    blocks: HashMap<String, Vec<Block>>,
    failing: HashSet<String>,
    queries: Mutex<Vec<CollectionQuery>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pages(mut self, database_id: &str, pages: Vec<Page>) -> Self {
        self.pages.insert(database_id.to_string(), pages);
        self
    }

    /// Register `blocks` as the children of `parent`, and each nested
    /// child list under its own block id.
    pub fn with_blocks(mut self, parent: &str, blocks: Vec<Block>) -> Self {
        self.register(parent, blocks);
        self
    }

    fn register(&mut self, parent: &str, blocks: Vec<Block>) {
        for block in &blocks {
            if !block.children.is_empty() {
                self.register(&block.id, block.children.clone());
            }
        }
        self.blocks.insert(parent.to_string(), blocks);
    }

    /// Make queries against `id` (a database) or child listings of `id`
    /// (a block or page) fail with a gateway error.
    pub fn failing(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    pub fn queries(&self) -> Vec<CollectionQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentSource for FakeSource {
    async fn query(&self, query: &CollectionQuery) -> Result<Vec<Page>> {
        self.queries.lock().unwrap().push(query.clone());
        if self.failing.contains(&query.database_id) {
            return Err(AppError::notion(502, "bad gateway"));
        }
        Ok(self
            .pages
            .get(&query.database_id)
            .map(|pages| pages.iter().filter(|p| query.matches(p)).cloned().collect())
            .unwrap_or_default())
    }

    async fn block_children(&self, block_id: &str) -> Result<Vec<Block>> {
        if self.failing.contains(block_id) {
            return Err(AppError::notion(502, "bad gateway"));
        }
        Ok(self.blocks.get(block_id).cloned().unwrap_or_default())
    }
}

/// Temporary site root with every path of the config rooted inside it.
pub struct TestEnv {
    tmp: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            tmp: TempDir::new().unwrap(),
        }
    }

    pub fn config(&self) -> SyncConfig {
        let mut config = SyncConfig::default();
        config.paths = config.paths.rooted_at(self.tmp.path());
        config.notion.api_key = Some("secret_test".into());
        config.collections.set(ContentKind::Project, "projects-db");
        config
    }

    pub fn data_dir(&self) -> PathBuf {
        self.config().paths.data_dir
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.config().paths.pages_dir
    }

    pub fn images_dir(&self) -> PathBuf {
        self.config().paths.images_dir
    }

    pub fn context(&self, source: FakeSource) -> ContextBuilder {
        ContextBuilder {
            config: self.config(),
            source: Arc::new(source),
            downloader: FakeDownloader::new(),
        }
    }
}

pub struct ContextBuilder {
    config: SyncConfig,
    source: Arc<FakeSource>,
    downloader: FakeDownloader,
}

impl ContextBuilder {
    pub fn with_image(mut self, url: &str, bytes: Vec<u8>) -> Self {
        self.downloader = self.downloader.with(url, bytes);
        self
    }

    pub fn with_collection(mut self, kind: ContentKind, id: &str) -> Self {
        self.config.collections.set(kind, id);
        self
    }

    pub fn source(&self) -> Arc<FakeSource> {
        Arc::clone(&self.source)
    }

    pub fn downloader(&self) -> FakeDownloader {
        self.downloader.clone()
    }

    pub async fn build(self) -> SyncContext {
        let started_at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let paths = &self.config.paths;
        let store = LocalAssetStore::new(
            &paths.images_dir,
            &paths.images_url,
            self.config.storage.prefixes.clone(),
        );
        let images = ImagePipeline::new(
            Arc::new(store),
            Arc::new(self.downloader),
            AssetManifest::load(&paths.manifest_file).await.unwrap(),
            self.config.images.clone(),
            started_at,
        );
        SyncContext {
            checkpoints: SyncCheckpoints::load(&paths.checkpoints_file).await.unwrap(),
            snapshots: SnapshotWriter::new(&paths.data_dir, &paths.pages_dir),
            images,
            source: self.source,
            previews: None,
            local_assets: None,
            started_at,
            config: Arc::new(self.config),
        }
    }
}
