//! Per-kind schema contract driving the generic fetcher.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::models::{ContentKind, SocialLink, SyncOptions, SyncRecord};
use crate::notion::{Block, CollectionQuery, PageDecoder, QueryFilter};
use crate::storage::Document;

/// An image reference inside a payload that the image pipeline may rewrite.
pub struct ImageSlot<'a> {
    pub url: &'a mut String,
    pub is_cover: bool,
}

impl<'a> ImageSlot<'a> {
    pub fn new(url: &'a mut String) -> Self {
        Self { url, is_cover: false }
    }

    pub fn cover(url: &'a mut String) -> Self {
        Self { url, is_cover: true }
    }
}

/// Data from other kinds that a view may embed.
#[derive(Debug, Clone, Default)]
pub struct ViewContext {
    pub social_links: Vec<SocialLink>,
}

/// A payload serialized next to its record id.
#[derive(Serialize)]
pub struct WithId<'a, T> {
    pub id: &'a str,
    #[serde(flatten)]
    pub item: &'a T,
}

impl<'a, T> From<&'a SyncRecord<T>> for WithId<'a, T> {
    fn from(record: &'a SyncRecord<T>) -> Self {
        Self {
            id: &record.id,
            item: &record.payload,
        }
    }
}

/// How one content kind is queried, decoded, enriched and rendered.
pub trait ContentSchema: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: ContentKind;

    /// Whether items carry a block body worth fetching.
    const HAS_BODY: bool = false;

    /// Base query. Kinds with an `active` flag only see active items.
    fn query(collection_id: &str, _options: &SyncOptions) -> CollectionQuery {
        let query = CollectionQuery::new(collection_id);
        if Self::KIND.has_active_flag() {
            query.filter(QueryFilter::active())
        } else {
            query
        }
    }

    /// Build the payload. Never fails; malformed fields take their defaults.
    fn decode(decoder: &mut PageDecoder<'_>) -> Self;

    /// Image references to route through the image pipeline.
    fn image_slots(&mut self) -> Vec<ImageSlot<'_>> {
        Vec::new()
    }

    /// Attach the fetched body. `markup` is the converted block tree.
    fn attach_body(&mut self, _blocks: &[Block], _markup: String) {}

    /// Consumer-facing view rendered from every record of the kind.
    /// `None` skips writing the view.
    fn view(records: &[SyncRecord<Self>], context: &ViewContext) -> Option<Value>;

    /// Markup documents to write beside the view.
    fn documents(_records: &[SyncRecord<Self>]) -> Vec<Document> {
        Vec::new()
    }
}

/// The record edited last, for kinds where one active item is shown.
pub fn most_recent<T>(records: &[SyncRecord<T>]) -> Option<&SyncRecord<T>> {
    records
        .iter()
        .max_by(|a, b| (&a.last_edited_at, &a.id).cmp(&(&b.last_edited_at, &b.id)))
}

/// Render a `---` delimited header. Values are written as JSON scalars,
/// which the site's YAML parser reads back verbatim.
pub fn front_matter(fields: &[(&str, Value)]) -> String {
    let mut out = String::from("---\n");
    for (key, value) in fields {
        out.push_str(key);
        out.push_str(": ");
        out.push_str(&value.to_string());
        out.push('\n');
    }
    out.push_str("---\n");
    out
}

/// Header, component imports and body of an MDX page.
pub fn mdx_document(header: &[(&str, Value)], body: &str) -> String {
    let mut out = front_matter(header);
    out.push_str("import Image from '../../components/Image.astro';\n");
    if body.contains("<BookmarkCard") {
        out.push_str("import BookmarkCard from '../../components/BookmarkCard.astro';\n");
    }
    out.push('\n');
    out.push_str(body.trim_end());
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn front_matter_quotes_scalars() {
        let header = front_matter(&[
            ("title", json!("Say \"hi\": part 1")),
            ("featured", json!(true)),
            ("order", json!(3)),
            ("tags", json!([{ "name": "rust" }])),
        ]);
        assert_eq!(
            header,
            "---\ntitle: \"Say \\\"hi\\\": part 1\"\nfeatured: true\norder: 3\ntags: [{\"name\":\"rust\"}]\n---\n"
        );
    }

    #[test]
    fn bookmark_import_only_when_used() {
        let plain = mdx_document(&[("title", json!("A"))], "<p>x</p>");
        assert!(plain.contains("import Image"));
        assert!(!plain.contains("BookmarkCard"));

        let with = mdx_document(&[], "<BookmarkCard url=\"u\" />\n\n");
        assert!(with.contains("import BookmarkCard from '../../components/BookmarkCard.astro';"));
        assert!(with.ends_with("<BookmarkCard url=\"u\" />\n"));
    }

    #[test]
    fn most_recent_prefers_latest_edit() {
        let records = vec![
            SyncRecord::new("a", ContentKind::Hero, "2024-01-02T00:00:00.000Z", 1),
            SyncRecord::new("b", ContentKind::Hero, "2024-03-01T00:00:00.000Z", 2),
            SyncRecord::new("c", ContentKind::Hero, "2024-02-01T00:00:00.000Z", 3),
        ];
        assert_eq!(most_recent(&records).map(|r| r.payload), Some(2));
        assert!(most_recent::<i32>(&[]).is_none());
    }
}
