// src/markup/preview.rs

//! Best-effort link previews for bookmark blocks.

use reqwest::Client;
use scraper::{Html, Selector};

use crate::utils::url::resolve;

/// Title, description and preview image read from a page head.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkPreview {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
}

impl LinkPreview {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.description.is_none() && self.image.is_none()
    }
}

/// Extract preview metadata from an HTML document. Relative image URLs are
/// resolved against `url`.
pub fn parse_link_preview(url: &str, html: &str) -> LinkPreview {
    let document = Html::parse_document(html);

    let meta = |attr: &str, key: &str| -> Option<String> {
        let selector = Selector::parse(&format!("meta[{}=\"{}\"]", attr, key)).ok()?;
        document
            .select(&selector)
            .filter_map(|el| el.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty())
            .map(str::to_string)
    };
    let title_tag = || -> Option<String> {
        let selector = Selector::parse("title").ok()?;
        let text: String = document.select(&selector).next()?.text().collect();
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    };

    LinkPreview {
        title: meta("property", "og:title").or_else(title_tag),
        description: meta("name", "description").or_else(|| meta("property", "og:description")),
        image: meta("property", "og:image").map(|src| resolve(url, &src)),
    }
}

/// Fetches link previews over HTTP. Every failure yields `None`.
pub struct LinkPreviewFetcher {
    client: Client,
}

impl LinkPreviewFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub async fn fetch(&self, url: &str) -> Option<LinkPreview> {
        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(e) => {
                log::debug!("Link preview request failed for {}: {}", url, e);
                return None;
            }
        };
        if !response.status().is_success() {
            log::debug!("Link preview for {} returned {}", url, response.status());
            return None;
        }
        let html = response.text().await.ok()?;
        let preview = parse_link_preview(url, &html);
        (!preview.is_empty()).then_some(preview)
    }
}
