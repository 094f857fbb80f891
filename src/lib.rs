// src/lib.rs

//! folio-sync: mirror Notion collections into JSON snapshots, MDX pages and
//! stored image assets for a static site.

pub mod error;
pub mod markup;
pub mod models;
pub mod notion;
pub mod pipeline;
pub mod storage;
pub mod utils;

pub use error::{AppError, Result};
pub use models::SyncConfig;
pub use pipeline::{SyncContext, SyncRequest, SyncSummary, run_sync};
