// src/markup/mod.rs

//! Rich-document rendering.

pub mod converter;
pub mod preview;
pub mod text;

pub use converter::{convert, convert_block};
pub use preview::{LinkPreview, LinkPreviewFetcher, parse_link_preview};
