//! AWS S3 asset storage.
//!
//! Objects live at `{root_prefix}/{category_prefix}/{filename}` and are
//! served straight from the bucket's virtual-hosted URL.

use std::collections::HashSet;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use tokio::sync::Mutex;

use crate::error::{AppError, Result};
use crate::models::{AssetCategory, CategoryPrefixes, StorageConfig};
use crate::storage::{AssetStore, StoredAsset};
use crate::utils::url::basename;

const CACHE_CONTROL: &str = "public, max-age=31536000";

/// S3-backed asset store.
pub struct S3AssetStore {
    client: Client,
    bucket: String,
    region: String,
    root_prefix: String,
    prefixes: CategoryPrefixes,
    /// Categories whose placeholder object is known to exist
    ensured: Mutex<HashSet<AssetCategory>>,
}

impl S3AssetStore {
    pub fn new(client: Client, bucket: impl Into<String>, config: &StorageConfig) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            region: config.region.clone(),
            root_prefix: config.root_prefix.trim_matches('/').to_string(),
            prefixes: config.prefixes.clone(),
            ensured: Mutex::new(HashSet::new()),
        }
    }

    /// Build a client from the default AWS credential chain.
    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        let bucket = config
            .bucket
            .clone()
            .ok_or_else(|| AppError::config("S3 storage requires a bucket (S3_BUCKET)"))?;
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;
        Ok(Self::new(Client::new(&sdk_config), bucket, config))
    }

    /// Key prefix of one category, without trailing slash.
    fn category_prefix(&self, category: AssetCategory) -> String {
        let prefix = self.prefixes.get(category);
        if self.root_prefix.is_empty() {
            prefix.to_string()
        } else {
            format!("{}/{}", self.root_prefix, prefix)
        }
    }

    fn key(&self, filename: &str, category: AssetCategory) -> String {
        format!("{}/{}", self.category_prefix(category), basename(filename))
    }

    /// Key of a file written before category prefixes existed.
    fn legacy_key(&self, filename: &str) -> String {
        if self.root_prefix.is_empty() {
            basename(filename).to_string()
        } else {
            format!("{}/{}", self.root_prefix, basename(filename))
        }
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let result = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match result {
            Ok(output) => {
                let bytes = output.body.collect().await.map_err(AppError::s3)?;
                Ok(Some(bytes.into_bytes().to_vec()))
            }
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_no_such_key() {
                    log::debug!("No object at s3://{}/{}", self.bucket, key);
                    Ok(None)
                } else {
                    Err(AppError::s3(service_err))
                }
            }
        }
    }

    fn bucket_url(&self) -> String {
        format!("https://{}.s3.{}.amazonaws.com", self.bucket, self.region)
    }

    /// Create the zero-byte `{prefix}/` folder marker once per category.
    async fn ensure_prefix(&self, category: AssetCategory) -> Result<()> {
        let mut ensured = self.ensured.lock().await;
        if ensured.contains(&category) {
            return Ok(());
        }

        let marker = format!("{}/", self.category_prefix(category));
        let present = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(&marker)
            .send()
            .await
            .is_ok();
        if !present {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&marker)
                .body(ByteStream::from(Vec::new()))
                .send()
                .await
                .map_err(|e| AppError::s3(e.into_service_error()))?;
            log::info!("Created s3://{}/{}", self.bucket, marker);
        }

        ensured.insert(category);
        Ok(())
    }
}

#[async_trait]
impl AssetStore for S3AssetStore {
    fn name(&self) -> &'static str {
        "s3"
    }

    async fn put(
        &self,
        filename: &str,
        category: AssetCategory,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<()> {
        self.ensure_prefix(category).await?;

        let key = self.key(filename, category);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes.to_vec()))
            .content_type(content_type)
            .cache_control(CACHE_CONTROL)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|e| AppError::s3(e.into_service_error()))?;

        log::info!("Uploaded s3://{}/{} ({} bytes)", self.bucket, key, bytes.len());
        Ok(())
    }

    async fn exists(&self, filename: &str, category: AssetCategory) -> Result<bool> {
        let result = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(self.key(filename, category))
            .send()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(err) => {
                let service_err = err.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(AppError::s3(service_err))
                }
            }
        }
    }

    async fn read(&self, filename: &str, category: AssetCategory) -> Result<Option<Vec<u8>>> {
        self.get(&self.key(filename, category)).await
    }

    async fn read_legacy(&self, filename: &str) -> Result<Option<Vec<u8>>> {
        self.get(&self.legacy_key(filename)).await
    }

    fn public_url(&self, filename: &str, category: AssetCategory) -> String {
        let base = format!("{}/{}/", self.bucket_url(), self.category_prefix(category));
        if filename.starts_with(&base) && !basename(filename).is_empty() {
            return filename.to_string();
        }
        format!("{}{}", base, basename(filename))
    }

    fn locate(&self, url: &str) -> Option<StoredAsset> {
        let key = url.strip_prefix(&self.bucket_url())?.strip_prefix('/')?;
        let key = key.split(['?', '#']).next().unwrap_or(key);
        let key = if self.root_prefix.is_empty() {
            key
        } else {
            key.strip_prefix(&self.root_prefix)?.strip_prefix('/')?
        };

        let stored = match key.split_once('/') {
            Some((prefix, filename)) => StoredAsset {
                category: self.prefixes.category_of(prefix),
                filename: basename(filename).to_string(),
            },
            None => StoredAsset {
                category: None,
                filename: key.to_string(),
            },
        };
        (!stored.filename.is_empty()).then_some(stored)
    }
}
