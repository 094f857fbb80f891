//! Sync pipeline.
//!
//! - `context`: per-run collaborators and state
//! - `tracker`: item and collection checkpoints
//! - `images`: download, dedup, re-encode and store images
//! - `schema` / `kinds`: per-kind decoding, views and documents
//! - `hierarchy`: category tree validation
//! - `fetch`: the generic per-kind fetcher
//! - `sync`: run orchestration

pub mod context;
pub mod fetch;
pub mod hierarchy;
pub mod images;
pub mod kinds;
pub mod schema;
pub mod sync;
pub mod tracker;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::{SyncContext, preflight};
pub use fetch::{KindOutcome, sync_kind};
pub use images::{AssetManifest, Downloader, HttpDownloader, ImagePipeline, SweepReport};
pub use schema::ContentSchema;
pub use sync::{
    MigrationReport, StepResult, SyncRequest, SyncSummary, migrate_assets, run_sync, sweep_assets,
};
pub use tracker::SyncCheckpoints;
