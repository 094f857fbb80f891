// src/notion/mod.rs

//! Content-source access.
//!
//! - `client`: throttled HTTP client for the Notion API
//! - `query`: database query filters and sorts
//! - `page`: database rows and the defaulting property decoder
//! - `block`: rich-document blocks and recursive tree fetch

pub mod block;
pub mod client;
pub mod page;
pub mod query;

use async_trait::async_trait;

use crate::error::{AppError, Result};

pub use block::{Block, BlockKind, RichText, fetch_block_tree};
pub use client::NotionClient;
pub use page::{Decoded, DefaultReason, Page, PageDecoder};
pub use query::{CollectionQuery, QueryFilter, QuerySort};

/// Anything that can answer collection queries and list block children.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Run a query, following pagination to the end.
    async fn query(&self, query: &CollectionQuery) -> Result<Vec<Page>>;

    /// Direct children of a block or page, all pages of them.
    async fn block_children(&self, block_id: &str) -> Result<Vec<Block>>;

    /// Whether the source can be queried at all.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Stand-in used when no API key is available. Every call fails with
/// the configuration error that disabled it.
pub struct DisabledSource {
    reason: String,
}

impl DisabledSource {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl ContentSource for DisabledSource {
    async fn query(&self, _query: &CollectionQuery) -> Result<Vec<Page>> {
        Err(AppError::config(self.reason.clone()))
    }

    async fn block_children(&self, _block_id: &str) -> Result<Vec<Block>> {
        Err(AppError::config(self.reason.clone()))
    }

    fn is_configured(&self) -> bool {
        false
    }
}
