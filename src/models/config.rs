//! Application configuration structures.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{AssetCategory, ContentKind};

/// Root sync configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Content-source API settings
    #[serde(default)]
    pub notion: NotionConfig,

    /// Collection id per content kind
    #[serde(default)]
    pub collections: CollectionIds,

    /// Where snapshots and state files live
    #[serde(default)]
    pub paths: PathsConfig,

    /// Asset storage backend
    #[serde(default)]
    pub storage: StorageConfig,

    /// Image re-encoding and retention
    #[serde(default)]
    pub images: ImageConfig,

    /// Outbound HTTP for image downloads and link previews
    #[serde(default)]
    pub http: HttpConfig,

    /// Behaviour switches
    #[serde(default)]
    pub sync: SyncOptions,
}

impl SyncConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Overlay secrets and ids from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|key| std::env::var(key).ok());
    }

    /// Overlay values from an arbitrary lookup. Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let get_any = |keys: &[&str]| keys.iter().find_map(|k| get(*k));

        if let Some(key) = get_any(&["NOTION_KEY", "VITE_NOTION_KEY"]) {
            self.notion.api_key = Some(key);
        }

        for kind in ContentKind::SYNC_ORDER {
            let plain = format!("NOTION_{}_DB_ID", kind.env_key());
            let vite = format!("VITE_{}_DB_ID", kind.env_key());
            if let Some(id) = get_any(&[plain.as_str(), vite.as_str()]) {
                self.collections.set(kind, id);
            }
        }
        // Posts historically used the bare DATABASE_ID variable.
        if self.collections.get(ContentKind::Post).is_none() {
            if let Some(id) = get("DATABASE_ID") {
                self.collections.set(ContentKind::Post, id);
            }
        }

        if let Some(mode) = get("SYNC_STORAGE_MODE") {
            match mode.parse() {
                Ok(mode) => self.storage.mode = mode,
                Err(e) => log::warn!("Ignoring SYNC_STORAGE_MODE: {}", e),
            }
        }
        if let Some(bucket) = get_any(&["S3_BUCKET", "AWS_S3_BUCKET"]) {
            self.storage.bucket = Some(bucket);
        }
        if let Some(region) = get("AWS_REGION") {
            self.storage.region = region;
        }
        if let Some(prefix) = get("S3_IMAGE_PREFIX") {
            self.storage.root_prefix = prefix;
        }
        for category in AssetCategory::ALL {
            let key = format!("S3_{}_PREFIX", category.as_str().to_uppercase());
            if let Some(prefix) = get(&key) {
                self.storage.prefixes.set(category, prefix);
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.notion.timeout_secs == 0 {
            return Err(AppError::validation("notion.timeout_secs must be > 0"));
        }
        if self.notion.page_size == 0 || self.notion.page_size > 100 {
            return Err(AppError::validation("notion.page_size must be in 1..=100"));
        }
        if self.images.max_dimension == 0 {
            return Err(AppError::validation("images.max_dimension must be > 0"));
        }
        if !(1..=100).contains(&self.images.jpeg_quality) {
            return Err(AppError::validation("images.jpeg_quality must be in 1..=100"));
        }
        if self.storage.mode == StorageMode::S3 && self.storage.bucket.is_none() {
            return Err(AppError::validation("storage.mode = s3 requires a bucket"));
        }

        let mut prefixes: Vec<&str> = AssetCategory::ALL
            .iter()
            .map(|c| self.storage.prefixes.get(*c))
            .collect();
        if prefixes.iter().any(|p| p.trim_matches('/').is_empty()) {
            return Err(AppError::validation("storage prefixes must not be empty"));
        }
        prefixes.sort_unstable();
        prefixes.dedup();
        if prefixes.len() != AssetCategory::ALL.len() {
            return Err(AppError::validation(
                "each asset category needs a distinct storage prefix",
            ));
        }
        Ok(())
    }
}

/// Content-source API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotionConfig {
    /// Integration token. Normally supplied through the environment.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Value of the `Notion-Version` header
    #[serde(default = "defaults::api_version")]
    pub version: String,

    /// Pause after every content-source call (3 req/s ceiling)
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    #[serde(default = "defaults::page_size")]
    pub page_size: u32,

    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: defaults::api_base(),
            version: defaults::api_version(),
            request_delay_ms: defaults::request_delay(),
            page_size: defaults::page_size(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Collection (database) id per content kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CollectionIds {
    pub posts: Option<String>,
    pub projects: Option<String>,
    pub services: Option<String>,
    pub testimonials: Option<String>,
    pub hero: Option<String>,
    pub author: Option<String>,
    pub about: Option<String>,
    pub categories: Option<String>,
    pub social_links: Option<String>,
    pub work_experience: Option<String>,
}

impl CollectionIds {
    fn slot(&mut self, kind: ContentKind) -> &mut Option<String> {
        match kind {
            ContentKind::Post => &mut self.posts,
            ContentKind::Project => &mut self.projects,
            ContentKind::Service => &mut self.services,
            ContentKind::Testimonial => &mut self.testimonials,
            ContentKind::Hero => &mut self.hero,
            ContentKind::Author => &mut self.author,
            ContentKind::About => &mut self.about,
            ContentKind::Category => &mut self.categories,
            ContentKind::SocialLink => &mut self.social_links,
            ContentKind::WorkExperience => &mut self.work_experience,
        }
    }

    pub fn get(&self, kind: ContentKind) -> Option<&str> {
        let id = match kind {
            ContentKind::Post => &self.posts,
            ContentKind::Project => &self.projects,
            ContentKind::Service => &self.services,
            ContentKind::Testimonial => &self.testimonials,
            ContentKind::Hero => &self.hero,
            ContentKind::Author => &self.author,
            ContentKind::About => &self.about,
            ContentKind::Category => &self.categories,
            ContentKind::SocialLink => &self.social_links,
            ContentKind::WorkExperience => &self.work_experience,
        };
        id.as_deref().filter(|s| !s.is_empty())
    }

    pub fn set(&mut self, kind: ContentKind, id: impl Into<String>) {
        *self.slot(kind) = Some(id.into());
    }
}

/// Filesystem locations for snapshots and run state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Per-kind JSON snapshots
    #[serde(default = "defaults::data_dir")]
    pub data_dir: PathBuf,

    /// Root for generated MDX documents
    #[serde(default = "defaults::pages_dir")]
    pub pages_dir: PathBuf,

    #[serde(default = "defaults::checkpoints_file")]
    pub checkpoints_file: PathBuf,

    #[serde(default = "defaults::manifest_file")]
    pub manifest_file: PathBuf,

    /// Local asset directory
    #[serde(default = "defaults::images_dir")]
    pub images_dir: PathBuf,

    /// Public URL base under which `images_dir` is served
    #[serde(default = "defaults::images_url")]
    pub images_url: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
            pages_dir: defaults::pages_dir(),
            checkpoints_file: defaults::checkpoints_file(),
            manifest_file: defaults::manifest_file(),
            images_dir: defaults::images_dir(),
            images_url: defaults::images_url(),
        }
    }
}

impl PathsConfig {
    /// Re-root every relative path under `root`.
    pub fn rooted_at(mut self, root: &Path) -> Self {
        let reroot = |p: PathBuf| if p.is_relative() { root.join(p) } else { p };
        self.data_dir = reroot(self.data_dir);
        self.pages_dir = reroot(self.pages_dir);
        self.checkpoints_file = reroot(self.checkpoints_file);
        self.manifest_file = reroot(self.manifest_file);
        self.images_dir = reroot(self.images_dir);
        self
    }
}

/// Which backend stores assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    #[default]
    Local,
    S3,
}

impl FromStr for StorageMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(StorageMode::Local),
            "s3" => Ok(StorageMode::S3),
            other => Err(AppError::config(format!(
                "unknown storage mode '{}' (expected local or s3)",
                other
            ))),
        }
    }
}

impl fmt::Display for StorageMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageMode::Local => f.write_str("local"),
            StorageMode::S3 => f.write_str("s3"),
        }
    }
}

/// Asset storage settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub mode: StorageMode,

    #[serde(default)]
    pub bucket: Option<String>,

    #[serde(default = "defaults::region")]
    pub region: String,

    /// Key prefix shared by every category, may be empty
    #[serde(default)]
    pub root_prefix: String,

    #[serde(default)]
    pub prefixes: CategoryPrefixes,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::default(),
            bucket: None,
            region: defaults::region(),
            root_prefix: String::new(),
            prefixes: CategoryPrefixes::default(),
        }
    }
}

/// Storage sub-directory per asset category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryPrefixes {
    #[serde(default = "defaults::posts_prefix")]
    pub posts: String,
    #[serde(default = "defaults::projects_prefix")]
    pub projects: String,
    #[serde(default = "defaults::author_prefix")]
    pub author: String,
    #[serde(default = "defaults::about_prefix")]
    pub about: String,
}

impl Default for CategoryPrefixes {
    fn default() -> Self {
        Self {
            posts: defaults::posts_prefix(),
            projects: defaults::projects_prefix(),
            author: defaults::author_prefix(),
            about: defaults::about_prefix(),
        }
    }
}

impl CategoryPrefixes {
    pub fn get(&self, category: AssetCategory) -> &str {
        let prefix = match category {
            AssetCategory::Posts => &self.posts,
            AssetCategory::Projects => &self.projects,
            AssetCategory::Author => &self.author,
            AssetCategory::About => &self.about,
        };
        prefix.trim_matches('/')
    }

    pub fn set(&mut self, category: AssetCategory, prefix: impl Into<String>) {
        let slot = match category {
            AssetCategory::Posts => &mut self.posts,
            AssetCategory::Projects => &mut self.projects,
            AssetCategory::Author => &mut self.author,
            AssetCategory::About => &mut self.about,
        };
        *slot = prefix.into();
    }

    /// Reverse lookup: which category owns this prefix.
    pub fn category_of(&self, prefix: &str) -> Option<AssetCategory> {
        let prefix = prefix.trim_matches('/');
        AssetCategory::ALL
            .into_iter()
            .find(|c| self.get(*c) == prefix)
    }
}

/// Image processing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageConfig {
    /// Re-encode and downscale before storing
    #[serde(default = "defaults::optimize")]
    pub optimize: bool,

    /// Longest allowed edge in pixels
    #[serde(default = "defaults::max_dimension")]
    pub max_dimension: u32,

    #[serde(default = "defaults::jpeg_quality")]
    pub jpeg_quality: u8,

    /// Manifest entries unused for this long become sweepable
    #[serde(default = "defaults::retention_days")]
    pub retention_days: i64,
}

impl Default for ImageConfig {
    fn default() -> Self {
        Self {
            optimize: defaults::optimize(),
            max_dimension: defaults::max_dimension(),
            jpeg_quality: defaults::jpeg_quality(),
            retention_days: defaults::retention_days(),
        }
    }
}

/// HTTP client settings for non-Notion requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// Behaviour switches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncOptions {
    /// Only pull posts whose status is `published`
    #[serde(default)]
    pub published_only: bool,

    /// Fetch title/description/image for bookmark blocks
    #[serde(default = "defaults::bookmark_previews")]
    pub bookmark_previews: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            published_only: false,
            bookmark_previews: defaults::bookmark_previews(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Notion defaults
    pub fn api_base() -> String {
        "https://api.notion.com/v1".into()
    }
    pub fn api_version() -> String {
        "2022-06-28".into()
    }
    pub fn request_delay() -> u64 {
        334
    }
    pub fn page_size() -> u32 {
        100
    }
    pub fn timeout() -> u64 {
        30
    }

    // Path defaults
    pub fn data_dir() -> PathBuf {
        PathBuf::from("src/data")
    }
    pub fn pages_dir() -> PathBuf {
        PathBuf::from("src/pages")
    }
    pub fn checkpoints_file() -> PathBuf {
        PathBuf::from("src/data/notion-sync-timestamps.json")
    }
    pub fn manifest_file() -> PathBuf {
        PathBuf::from("src/data/image-manifest.json")
    }
    pub fn images_dir() -> PathBuf {
        PathBuf::from("public/images/notion")
    }
    pub fn images_url() -> String {
        "/images/notion".into()
    }

    // Storage defaults
    pub fn region() -> String {
        "us-west-2".into()
    }
    pub fn posts_prefix() -> String {
        "posts".into()
    }
    pub fn projects_prefix() -> String {
        "projects".into()
    }
    pub fn author_prefix() -> String {
        "author".into()
    }
    pub fn about_prefix() -> String {
        "about".into()
    }

    // Image defaults
    pub fn optimize() -> bool {
        true
    }
    pub fn max_dimension() -> u32 {
        2000
    }
    pub fn jpeg_quality() -> u8 {
        80
    }
    pub fn retention_days() -> i64 {
        7
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; folio-sync/0.1)".into()
    }

    pub fn bookmark_previews() -> bool {
        true
    }
}
