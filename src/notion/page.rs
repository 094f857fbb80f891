// src/notion/page.rs

//! Database pages and the defaulting property decoder.
//!
//! Properties arrive as loosely typed JSON. Every accessor on
//! [`PageDecoder`] either yields the field or falls back to the caller's
//! default, remembering why, so one malformed field never drops a record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::models::Tag;

/// A database row as returned by the query endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub created_time: String,
    #[serde(default)]
    pub last_edited_time: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub cover: Option<Value>,
    #[serde(default)]
    pub icon: Option<Value>,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Page {
    /// URL of the page cover, whether uploaded or external.
    pub fn cover_url(&self) -> Option<String> {
        self.cover.as_ref().and_then(file_object_url)
    }
}

/// URL of a file object (`{"type": "file"|"external", ...}`).
pub fn file_object_url(value: &Value) -> Option<String> {
    let kind = value.get("type").and_then(Value::as_str).unwrap_or("external");
    value
        .get(kind)
        .and_then(|inner| inner.get("url"))
        .or_else(|| value.get("url"))
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

/// Why a field fell back to its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultReason {
    /// Property absent from the page
    Missing,
    /// Property present with an unexpected shape
    WrongType,
    /// Property present but blank
    Empty,
}

/// Outcome of decoding one field.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<T> {
    Value(T),
    Defaulted { value: T, reason: DefaultReason },
}

impl<T> Decoded<T> {
    fn from_result(result: Result<T, DefaultReason>, default: T) -> Self {
        match result {
            Ok(value) => Decoded::Value(value),
            Err(reason) => Decoded::Defaulted {
                value: default,
                reason,
            },
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Decoded::Value(v) | Decoded::Defaulted { value: v, .. } => v,
        }
    }

    pub fn reason(&self) -> Option<DefaultReason> {
        match self {
            Decoded::Value(_) => None,
            Decoded::Defaulted { reason, .. } => Some(*reason),
        }
    }
}

/// Decodes named properties of one page, collecting every defaulted field.
pub struct PageDecoder<'a> {
    page: &'a Page,
    defaulted: Vec<(String, DefaultReason)>,
}

impl<'a> PageDecoder<'a> {
    pub fn new(page: &'a Page) -> Self {
        Self {
            page,
            defaulted: Vec::new(),
        }
    }

    pub fn page(&self) -> &'a Page {
        self.page
    }

    /// Fields that fell back to defaults, in decode order.
    pub fn defaulted(&self) -> &[(String, DefaultReason)] {
        &self.defaulted
    }

    fn property(&self, name: &str) -> Result<&'a Value, DefaultReason> {
        self.page
            .properties
            .get(name)
            .ok_or(DefaultReason::Missing)
    }

    fn keep<T>(&mut self, name: &str, decoded: Decoded<T>) -> T {
        if let Some(reason) = decoded.reason() {
            self.defaulted.push((name.to_string(), reason));
        }
        decoded.into_value()
    }

    /// Decode a field with an explicit default, recording the fallback.
    pub fn decode<T>(
        &mut self,
        name: &str,
        default: T,
        extract: impl FnOnce(&'a Value) -> Result<T, DefaultReason>,
    ) -> T {
        let result = self.property(name).and_then(extract);
        self.keep(name, Decoded::from_result(result, default))
    }

    /// Text of a title, rich text, url, email, select or number property.
    pub fn text(&mut self, name: &str, default: &str) -> String {
        self.decode(name, default.to_string(), extract_text)
    }

    /// First non-empty text among several candidate property names.
    pub fn text_any(&mut self, names: &[&str], default: &str) -> String {
        for name in names {
            if let Ok(text) = self.property(name).and_then(extract_text) {
                return text;
            }
        }
        let label = names.join("|");
        self.keep(
            &label,
            Decoded::Defaulted {
                value: default.to_string(),
                reason: DefaultReason::Missing,
            },
        )
    }

    /// Optional text. Absence is normal and not recorded.
    pub fn text_opt(&self, name: &str) -> Option<String> {
        self.property(name).and_then(extract_text).ok()
    }

    pub fn number(&mut self, name: &str, default: i64) -> i64 {
        self.decode(name, default, |prop| match prop.get("number") {
            Some(Value::Null) => Err(DefaultReason::Empty),
            Some(n) => n
                .as_f64()
                .map(|f| f.round() as i64)
                .ok_or(DefaultReason::WrongType),
            None => Err(DefaultReason::WrongType),
        })
    }

    pub fn checkbox(&mut self, name: &str, default: bool) -> bool {
        self.decode(name, default, |prop| {
            prop.get("checkbox")
                .and_then(Value::as_bool)
                .ok_or(DefaultReason::WrongType)
        })
    }

    pub fn select(&mut self, name: &str, default: &str) -> String {
        self.decode(name, default.to_string(), |prop| match prop.get("select") {
            Some(Value::Null) => Err(DefaultReason::Empty),
            Some(select) => select
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(DefaultReason::WrongType),
            None => Err(DefaultReason::WrongType),
        })
    }

    /// Multi-select options. Missing means no tags.
    pub fn multi_select(&self, name: &str) -> Vec<Tag> {
        self.property(name)
            .ok()
            .and_then(|prop| prop.get("multi_select"))
            .and_then(Value::as_array)
            .map(|options| {
                options
                    .iter()
                    .filter_map(|o| {
                        let name = o.get("name")?.as_str()?.to_string();
                        Some(Tag {
                            id: o.get("id").and_then(Value::as_str).unwrap_or(name.as_str()).to_string(),
                            color: o
                                .get("color")
                                .and_then(Value::as_str)
                                .unwrap_or("default")
                                .to_string(),
                            name,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Start of a date property.
    pub fn date_start(&self, name: &str) -> Option<String> {
        self.property(name)
            .ok()
            .and_then(|prop| prop.pointer("/date/start"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    /// URL of the first file in a files property.
    pub fn file_url(&self, name: &str) -> Option<String> {
        self.property(name)
            .ok()
            .and_then(|prop| prop.get("files"))
            .and_then(Value::as_array)
            .and_then(|files| files.first())
            .and_then(file_object_url)
    }

    /// Id of the first related page.
    pub fn relation_first(&self, name: &str) -> Option<String> {
        self.property(name)
            .ok()
            .and_then(|prop| prop.pointer("/relation/0/id"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

fn plain_text(items: &Value) -> Option<String> {
    let items = items.as_array()?;
    Some(
        items
            .iter()
            .filter_map(|t| {
                t.get("plain_text")
                    .or_else(|| t.pointer("/text/content"))
                    .and_then(Value::as_str)
            })
            .collect(),
    )
}

fn extract_text(prop: &Value) -> Result<String, DefaultReason> {
    let kind = prop.get("type").and_then(Value::as_str);
    let text = match kind {
        Some("title") => prop.get("title").and_then(plain_text),
        Some("rich_text") => prop.get("rich_text").and_then(plain_text),
        Some(k @ ("url" | "email" | "phone_number")) => match prop.get(k) {
            Some(Value::Null) => return Err(DefaultReason::Empty),
            other => other.and_then(Value::as_str).map(str::to_string),
        },
        Some("select") => prop.pointer("/select/name").and_then(Value::as_str).map(str::to_string),
        Some("number") => prop.get("number").and_then(Value::as_f64).map(|n| n.to_string()),
        // Untyped fixtures: try the common shapes in turn.
        _ => prop
            .get("rich_text")
            .and_then(plain_text)
            .or_else(|| prop.get("title").and_then(plain_text)),
    }
    .ok_or(DefaultReason::WrongType)?;

    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(DefaultReason::Empty)
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(properties: Value) -> Page {
        serde_json::from_value(json!({
            "id": "page-1",
            "created_time": "2024-01-01T00:00:00.000Z",
            "last_edited_time": "2024-02-01T00:00:00.000Z",
            "cover": { "type": "external", "external": { "url": "https://img.example/cover.jpg" } },
            "properties": properties
        }))
        .unwrap()
    }

    #[test]
    fn text_reads_title_and_rich_text() {
        let p = page(json!({
            "title": { "type": "title", "title": [
                { "plain_text": "Hello " }, { "plain_text": "World" }
            ]},
            "description": { "type": "rich_text", "rich_text": [{ "plain_text": "desc" }] }
        }));
        let mut d = PageDecoder::new(&p);
        assert_eq!(d.text("title", "Untitled"), "Hello World");
        assert_eq!(d.text("description", ""), "desc");
        assert!(d.defaulted().is_empty());
    }

    #[test]
    fn missing_and_blank_fields_are_defaulted_with_reason() {
        let p = page(json!({
            "name": { "type": "rich_text", "rich_text": [{ "plain_text": "   " }] },
            "order": { "type": "number", "number": null },
            "featured": { "type": "select", "select": null }
        }));
        let mut d = PageDecoder::new(&p);
        assert_eq!(d.text("name", "Anonymous"), "Anonymous");
        assert_eq!(d.text("title", "Untitled"), "Untitled");
        assert_eq!(d.number("order", 0), 0);
        assert!(!d.checkbox("featured", false));

        let reasons: Vec<_> = d.defaulted().iter().map(|(_, r)| *r).collect();
        assert_eq!(
            reasons,
            vec![
                DefaultReason::Empty,
                DefaultReason::Missing,
                DefaultReason::Empty,
                DefaultReason::WrongType
            ]
        );
    }

    #[test]
    fn text_any_takes_first_present_candidate() {
        let p = page(json!({
            "organization": { "type": "rich_text", "rich_text": [{ "plain_text": "Acme" }] }
        }));
        let mut d = PageDecoder::new(&p);
        assert_eq!(d.text_any(&["company", "organization"], ""), "Acme");
        assert_eq!(d.text_any(&["position", "title"], ""), "");
        assert_eq!(d.defaulted().len(), 1);
        assert_eq!(d.defaulted()[0].0, "position|title");
    }

    #[test]
    fn structured_properties() {
        let p = page(json!({
            "order": { "type": "number", "number": 2.0 },
            "featured": { "type": "checkbox", "checkbox": true },
            "category": { "type": "select", "select": { "name": "Design" } },
            "tags": { "type": "multi_select", "multi_select": [
                { "id": "t1", "name": "rust", "color": "red" }
            ]},
            "startDate": { "type": "date", "date": { "start": "2022-03-01", "end": null } },
            "avatar": { "type": "files", "files": [
                { "name": "a.png", "type": "file", "file": { "url": "https://s3.notion/a.png" } }
            ]},
            "parent": { "type": "relation", "relation": [{ "id": "cat-2" }] },
            "url": { "type": "url", "url": "https://example.com" }
        }));
        let mut d = PageDecoder::new(&p);
        assert_eq!(d.number("order", 0), 2);
        assert!(d.checkbox("featured", false));
        assert_eq!(d.select("category", "Uncategorized"), "Design");
        assert_eq!(d.multi_select("tags")[0].name, "rust");
        assert_eq!(d.date_start("startDate").as_deref(), Some("2022-03-01"));
        assert_eq!(d.file_url("avatar").as_deref(), Some("https://s3.notion/a.png"));
        assert_eq!(d.relation_first("parent").as_deref(), Some("cat-2"));
        assert_eq!(d.text_opt("url").as_deref(), Some("https://example.com"));
        assert!(d.multi_select("missing").is_empty());
        assert!(d.defaulted().is_empty());
    }

    #[test]
    fn cover_url_handles_external_and_file() {
        let p = page(json!({}));
        assert_eq!(p.cover_url().as_deref(), Some("https://img.example/cover.jpg"));

        let file = json!({ "type": "file", "file": { "url": "https://s3/x.png", "expiry_time": "..." } });
        assert_eq!(file_object_url(&file).as_deref(), Some("https://s3/x.png"));
    }
}
