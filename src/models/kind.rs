// src/models/kind.rs

//! Content kinds and asset categories.
//!
//! `ContentKind` is the per-kind table the generic fetcher consults: snapshot
//! file names, environment keys, image routing and remote filtering all hang
//! off it.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// One logical collection in the content source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentKind {
    Post,
    Project,
    Service,
    Testimonial,
    Hero,
    Author,
    About,
    Category,
    SocialLink,
    WorkExperience,
}

impl ContentKind {
    /// Every kind, in the order a full sync visits them.
    pub const SYNC_ORDER: [ContentKind; 10] = [
        ContentKind::Service,
        ContentKind::Testimonial,
        ContentKind::Hero,
        ContentKind::Category,
        ContentKind::SocialLink,
        ContentKind::Project,
        ContentKind::Post,
        ContentKind::Author,
        ContentKind::About,
        ContentKind::WorkExperience,
    ];

    /// Stable identifier used in checkpoint keys and log lines.
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Post => "post",
            ContentKind::Project => "project",
            ContentKind::Service => "service",
            ContentKind::Testimonial => "testimonial",
            ContentKind::Hero => "hero",
            ContentKind::Author => "author",
            ContentKind::About => "about",
            ContentKind::Category => "category",
            ContentKind::SocialLink => "social-link",
            ContentKind::WorkExperience => "work-experience",
        }
    }

    /// File name of the consumer-facing snapshot under the data directory.
    pub fn snapshot_file(self) -> &'static str {
        match self {
            ContentKind::Post => "posts.json",
            ContentKind::Project => "projects.json",
            ContentKind::Service => "services.json",
            ContentKind::Testimonial => "testimonials.json",
            ContentKind::Hero => "hero.json",
            ContentKind::Author => "author.json",
            ContentKind::About => "about.json",
            ContentKind::Category => "categories.json",
            ContentKind::SocialLink => "social-links.json",
            ContentKind::WorkExperience => "work-experience.json",
        }
    }

    /// Infix of the `NOTION_{..}_DB_ID` environment variable.
    pub fn env_key(self) -> &'static str {
        match self {
            ContentKind::Post => "POSTS",
            ContentKind::Project => "PROJECTS",
            ContentKind::Service => "SERVICES",
            ContentKind::Testimonial => "TESTIMONIALS",
            ContentKind::Hero => "HERO",
            ContentKind::Author => "AUTHOR",
            ContentKind::About => "ABOUT",
            ContentKind::Category => "CATEGORIES",
            ContentKind::SocialLink => "SOCIAL_LINKS",
            ContentKind::WorkExperience => "WORK_EXPERIENCE",
        }
    }

    /// Asset category images found in this kind are stored under.
    pub fn asset_category(self) -> AssetCategory {
        match self {
            ContentKind::Project => AssetCategory::Projects,
            ContentKind::Author => AssetCategory::Author,
            ContentKind::About => AssetCategory::About,
            _ => AssetCategory::Posts,
        }
    }

    /// Whether the remote collection carries an `active` checkbox to filter on.
    pub fn has_active_flag(self) -> bool {
        matches!(
            self,
            ContentKind::Hero
                | ContentKind::Author
                | ContentKind::About
                | ContentKind::SocialLink
                | ContentKind::WorkExperience
        )
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        let kind = match normalized.as_str() {
            "post" | "posts" => ContentKind::Post,
            "project" | "projects" => ContentKind::Project,
            "service" | "services" => ContentKind::Service,
            "testimonial" | "testimonials" => ContentKind::Testimonial,
            "hero" => ContentKind::Hero,
            "author" => ContentKind::Author,
            "about" => ContentKind::About,
            "category" | "categories" => ContentKind::Category,
            "social-link" | "social-links" => ContentKind::SocialLink,
            "work-experience" | "experience" => ContentKind::WorkExperience,
            other => {
                return Err(AppError::validation(format!(
                    "unknown content kind '{}'",
                    other
                )));
            }
        };
        Ok(kind)
    }
}

/// Logical bucket an image belongs to. Determines filename prefix and
/// storage location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetCategory {
    Posts,
    Projects,
    Author,
    About,
}

impl AssetCategory {
    pub const ALL: [AssetCategory; 4] = [
        AssetCategory::Posts,
        AssetCategory::Projects,
        AssetCategory::Author,
        AssetCategory::About,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            AssetCategory::Posts => "posts",
            AssetCategory::Projects => "projects",
            AssetCategory::Author => "author",
            AssetCategory::About => "about",
        }
    }

    /// Textual prefix every stored filename of this category starts with.
    pub fn filename_prefix(self) -> &'static str {
        match self {
            AssetCategory::Posts => "notion-",
            AssetCategory::Projects => "project-",
            AssetCategory::Author => "author-",
            AssetCategory::About => "about-",
        }
    }

    /// Classify a bare filename by its prefix. Anything unrecognised is a post image.
    pub fn classify(filename: &str) -> Self {
        let name = filename.rsplit('/').next().unwrap_or(filename);
        [
            AssetCategory::Projects,
            AssetCategory::Author,
            AssetCategory::About,
        ]
        .into_iter()
        .find(|c| name.starts_with(c.filename_prefix()))
        .unwrap_or(AssetCategory::Posts)
    }
}

impl fmt::Display for AssetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_from_str() {
        for kind in ContentKind::SYNC_ORDER {
            assert_eq!(kind.as_str().parse::<ContentKind>().unwrap(), kind);
        }
        assert_eq!(
            "social_links".parse::<ContentKind>().unwrap(),
            ContentKind::SocialLink
        );
        assert!("widgets".parse::<ContentKind>().is_err());
    }

    #[test]
    fn sync_order_covers_every_kind_once() {
        let mut seen = ContentKind::SYNC_ORDER.to_vec();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 10);
        assert_eq!(ContentKind::SYNC_ORDER[0], ContentKind::Service);
        assert_eq!(ContentKind::SYNC_ORDER[9], ContentKind::WorkExperience);
    }

    #[test]
    fn classify_by_prefix() {
        assert_eq!(AssetCategory::classify("project-abc.png"), AssetCategory::Projects);
        assert_eq!(AssetCategory::classify("author-abc.jpg"), AssetCategory::Author);
        assert_eq!(AssetCategory::classify("about-abc-cover.jpg"), AssetCategory::About);
        assert_eq!(AssetCategory::classify("notion-abc.webp"), AssetCategory::Posts);
        assert_eq!(AssetCategory::classify("legacy.gif"), AssetCategory::Posts);
        assert_eq!(
            AssetCategory::classify("images/projects/project-1.png"),
            AssetCategory::Projects
        );
    }

    #[test]
    fn kind_serializes_kebab_case() {
        let json = serde_json::to_string(&ContentKind::WorkExperience).unwrap();
        assert_eq!(json, "\"work-experience\"");
        let json = serde_json::to_string(&AssetCategory::Projects).unwrap();
        assert_eq!(json, "\"projects\"");
    }
}
