//! Content-addressed asset storage and snapshot persistence.
//!
//! Assets are named after the SHA-256 of their bytes plus a category prefix,
//! so storing the same bytes twice is a no-op detected through `exists`.
//!
//! ## Layout
//!
//! ```text
//! {images_dir}/                  # local backend
//! ├── posts/notion-{hash}.jpg
//! ├── projects/project-{hash}-cover.png
//! ├── author/author-{hash}.webp
//! └── about/about-{hash}.jpg
//!
//! s3://{bucket}/{root_prefix}/{category_prefix}/{filename}   # S3 backend
//! ```

pub mod local;
#[cfg(feature = "s3")]
pub mod s3;
pub mod snapshot;

use async_trait::async_trait;
use image::ImageFormat;
use sha2::{Digest, Sha256};

use crate::error::Result;
use crate::models::AssetCategory;
use crate::utils::url::extension;

// Re-export for convenience
pub use local::LocalAssetStore;
#[cfg(feature = "s3")]
pub use s3::S3AssetStore;
pub use snapshot::{Document, SnapshotWriter};

/// Hex SHA-256 of a buffer.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Deterministic filename for `(hash, category, is_cover)`.
pub fn asset_filename(hash: &str, category: AssetCategory, is_cover: bool, ext: &str) -> String {
    format!(
        "{}{}{}.{}",
        category.filename_prefix(),
        hash,
        if is_cover { "-cover" } else { "" },
        ext
    )
}

/// File extension and MIME type of a stored asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssetFormat {
    pub extension: &'static str,
    pub content_type: &'static str,
}

impl AssetFormat {
    pub const JPEG: Self = Self::new("jpg", "image/jpeg");
    pub const PNG: Self = Self::new("png", "image/png");
    pub const GIF: Self = Self::new("gif", "image/gif");
    pub const WEBP: Self = Self::new("webp", "image/webp");
    pub const AVIF: Self = Self::new("avif", "image/avif");
    pub const SVG: Self = Self::new("svg", "image/svg+xml");

    const fn new(extension: &'static str, content_type: &'static str) -> Self {
        Self {
            extension,
            content_type,
        }
    }

    /// Identify the format from magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match image::guess_format(bytes) {
            Ok(ImageFormat::Jpeg) => Some(Self::JPEG),
            Ok(ImageFormat::Png) => Some(Self::PNG),
            Ok(ImageFormat::Gif) => Some(Self::GIF),
            Ok(ImageFormat::WebP) => Some(Self::WEBP),
            Ok(ImageFormat::Avif) => Some(Self::AVIF),
            _ => {
                let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
                let head = head.trim_start();
                (head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")))
                    .then_some(Self::SVG)
            }
        }
    }

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::JPEG),
            "png" => Some(Self::PNG),
            "gif" => Some(Self::GIF),
            "webp" => Some(Self::WEBP),
            "avif" => Some(Self::AVIF),
            "svg" => Some(Self::SVG),
            _ => None,
        }
    }

    /// Sniff the bytes, then fall back to the source URL extension, then JPEG.
    pub fn detect(bytes: &[u8], source: Option<&str>) -> Self {
        Self::sniff(bytes)
            .or_else(|| source.and_then(extension).and_then(|e| Self::from_extension(&e)))
            .unwrap_or(Self::JPEG)
    }
}

/// An asset this system stored, recovered from its public URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAsset {
    /// Category owning the URL's prefix, `None` for unknown or legacy prefixes
    pub category: Option<AssetCategory>,
    pub filename: String,
}

/// Backend-neutral asset storage.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Short backend name for log lines.
    fn name(&self) -> &'static str;

    /// Write bytes unconditionally.
    async fn put(
        &self,
        filename: &str,
        category: AssetCategory,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<()>;

    async fn exists(&self, filename: &str, category: AssetCategory) -> Result<bool>;

    /// Read a stored asset back, `None` if absent.
    async fn read(&self, filename: &str, category: AssetCategory) -> Result<Option<Vec<u8>>>;

    /// Read an asset from the flat layout used before category prefixes.
    async fn read_legacy(&self, filename: &str) -> Result<Option<Vec<u8>>>;

    /// Public URL of an asset. Input may be a bare filename, a prefixed
    /// path, or a URL this store produced; the result is never double-prefixed.
    fn public_url(&self, filename: &str, category: AssetCategory) -> String;

    /// Recognise a URL pointing into this store.
    fn locate(&self, url: &str) -> Option<StoredAsset>;

    /// Write under `filename` unless it already exists. Returns whether bytes were written.
    async fn store_as(
        &self,
        filename: &str,
        category: AssetCategory,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<bool> {
        if self.exists(filename, category).await? {
            log::debug!("{} already holds {}", self.name(), filename);
            return Ok(false);
        }
        self.put(filename, category, bytes, content_type).await?;
        Ok(true)
    }

    /// Store a buffer under its content-derived filename.
    async fn store(&self, buffer: &[u8], category: AssetCategory, is_cover: bool) -> Result<String> {
        let format = AssetFormat::detect(buffer, None);
        let filename = asset_filename(&content_hash(buffer), category, is_cover, format.extension);
        self.store_as(&filename, category, buffer, format.content_type)
            .await?;
        Ok(filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_is_deterministic_per_category_and_cover() {
        let hash = content_hash(b"same bytes");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            asset_filename(&hash, AssetCategory::Projects, false, "png"),
            format!("project-{}.png", hash)
        );
        assert_eq!(
            asset_filename(&hash, AssetCategory::Posts, true, "jpg"),
            format!("notion-{}-cover.jpg", hash)
        );
        assert_eq!(content_hash(b"same bytes"), hash);
        assert_ne!(content_hash(b"other bytes"), hash);
    }

    #[test]
    fn format_detection() {
        assert_eq!(AssetFormat::sniff(b"\x89PNG\r\n\x1a\n0000"), Some(AssetFormat::PNG));
        assert_eq!(AssetFormat::sniff(b"GIF89a...."), Some(AssetFormat::GIF));
        assert_eq!(AssetFormat::sniff(b"<svg xmlns=\"..\"></svg>"), Some(AssetFormat::SVG));
        assert_eq!(
            AssetFormat::detect(b"????", Some("https://x/y/pic.webp?sig=1")),
            AssetFormat::WEBP
        );
        assert_eq!(AssetFormat::detect(b"????", None), AssetFormat::JPEG);
    }
}
