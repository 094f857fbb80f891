//! Per-run state shared by every fetcher.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::markup::LinkPreviewFetcher;
use crate::models::{StorageMode, SyncConfig};
use crate::notion::{ContentSource, DisabledSource, NotionClient};
use crate::pipeline::images::{AssetManifest, HttpDownloader, ImagePipeline};
use crate::pipeline::tracker::SyncCheckpoints;
use crate::storage::{AssetStore, LocalAssetStore, SnapshotWriter};
use crate::utils::http::create_async_client;

/// Everything one sync run needs, built once and passed down explicitly.
pub struct SyncContext {
    pub config: Arc<SyncConfig>,
    pub source: Arc<dyn ContentSource>,
    pub checkpoints: SyncCheckpoints,
    pub images: ImagePipeline,
    pub snapshots: SnapshotWriter,
    /// Bookmark preview fetcher, `None` when previews are disabled
    pub previews: Option<LinkPreviewFetcher>,
    /// Local asset directory to sweep when assets live remotely
    pub local_assets: Option<LocalAssetStore>,
    pub started_at: DateTime<Utc>,
}

impl SyncContext {
    /// Wire up the production collaborators from configuration.
    pub async fn from_config(config: SyncConfig) -> Result<Self> {
        let started_at = Utc::now();
        let http = create_async_client(&config.http)?;
        let source: Arc<dyn ContentSource> = match NotionClient::new(&config.notion) {
            Ok(client) => Arc::new(client),
            Err(AppError::Config(reason)) => {
                log::warn!("{}, content kinds will be skipped", reason);
                Arc::new(DisabledSource::new(reason))
            }
            Err(e) => return Err(e),
        };

        let paths = &config.paths;
        let local = LocalAssetStore::new(
            &paths.images_dir,
            &paths.images_url,
            config.storage.prefixes.clone(),
        );
        let (store, local_assets): (Arc<dyn AssetStore>, Option<LocalAssetStore>) =
            match config.storage.mode {
                StorageMode::Local => (Arc::new(local), None),
                StorageMode::S3 => (remote_store(&config).await?, Some(local)),
            };
        log::info!("Asset storage: {}", store.name());

        let images = ImagePipeline::new(
            store,
            Arc::new(HttpDownloader::new(http.clone())),
            AssetManifest::load(&paths.manifest_file).await?,
            config.images.clone(),
            started_at,
        );
        let previews = config
            .sync
            .bookmark_previews
            .then(|| LinkPreviewFetcher::new(http));

        Ok(Self {
            checkpoints: SyncCheckpoints::load(&paths.checkpoints_file).await?,
            snapshots: SnapshotWriter::new(&paths.data_dir, &paths.pages_dir),
            images,
            source,
            previews,
            local_assets,
            started_at,
            config: Arc::new(config),
        })
    }
}

#[cfg(feature = "s3")]
async fn remote_store(config: &SyncConfig) -> Result<Arc<dyn AssetStore>> {
    let store = crate::storage::S3AssetStore::from_config(&config.storage).await?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "s3"))]
async fn remote_store(_config: &SyncConfig) -> Result<Arc<dyn AssetStore>> {
    Err(AppError::config(
        "storage mode s3 requires building with the `s3` feature",
    ))
}

/// Fail early on invalid settings. A missing API key is not fatal: the
/// content kinds are skipped and asset commands still work.
pub fn preflight(config: &SyncConfig) -> Result<()> {
    config.validate()?;
    if config.notion.api_key.is_none() {
        log::warn!("NOTION_KEY is not set");
    }
    Ok(())
}
