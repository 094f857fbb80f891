// src/models/mod.rs

//! Domain models for the sync pipeline.
//!
//! Configuration, the content-kind table, per-kind payloads and the
//! persisted record/manifest shapes.

mod config;
mod content;
mod kind;
mod record;

// Re-export all public types
pub use config::{
    CategoryPrefixes, CollectionIds, HttpConfig, ImageConfig, NotionConfig, PathsConfig,
    StorageConfig, StorageMode, SyncConfig, SyncOptions,
};
pub use content::{
    About, Author, Category, CtaButton, EmailContact, Hero, ImageRef, Post, Project, Service,
    SocialLink, Tag, Testimonial, WorkExperience,
};
pub use kind::{AssetCategory, ContentKind};
pub use record::{ManifestEntry, SyncRecord};
