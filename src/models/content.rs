// src/models/content.rs

//! Normalized payloads, one struct per content kind.
//!
//! Field names serialize in camelCase because the site reads these snapshots
//! directly.

use serde::{Deserialize, Serialize};

/// Multi-select option as exposed by the content source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
}

/// Image reference with alt text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ImageRef {
    pub src: String,
    pub alt: String,
}

/// Call-to-action button on the hero section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CtaButton {
    pub text: String,
    pub url: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailContact {
    pub address: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub tags: Vec<Tag>,
    pub cover: Option<String>,
    pub status: String,
    pub publish_date: Option<String>,
    pub created_time: String,
    pub last_edited_time: String,
    pub reading_time: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub title: String,
    pub slug: String,
    pub description: String,
    pub tags: Vec<Tag>,
    pub cover_image: Option<String>,
    pub url: Option<String>,
    pub featured: bool,
    pub order: i64,
    pub created_time: String,
    pub last_edited_time: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub category: String,
    pub category_icon: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub url: Option<String>,
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub name: String,
    pub title: String,
    pub company: String,
    pub quote: String,
    pub avatar: Option<String>,
    pub featured: bool,
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hero {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub cta_button: CtaButton,
    pub secondary_cta_button: CtaButton,
    pub profile_image: ImageRef,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    pub bio: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct About {
    pub title: String,
    pub paragraphs: Vec<String>,
    pub profile_image: ImageRef,
    /// Filled from the social-links snapshot when the view is rendered.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub social_links: Vec<SocialLink>,
    pub email: EmailContact,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    pub icon: String,
    pub intro: String,
    pub footnotes: String,
    pub display_order: i64,
    pub parent: Option<String>,
    pub is_top_level: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLink {
    pub name: String,
    pub url: String,
    pub icon: String,
    pub icon_type: String,
    pub order: i64,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkExperience {
    pub title: String,
    pub company: String,
    pub location: String,
    pub start_date: Option<String>,
    pub end_date: String,
    pub period: String,
    pub employment_type: String,
    pub skills: Vec<String>,
    pub description: Vec<String>,
}
