// src/notion/block.rs

//! Rich-document blocks.

use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::error::Result;
use crate::markup::LinkPreview;
use crate::notion::ContentSource;
use crate::notion::page::file_object_url;

/// One run of annotated text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RichText {
    pub text: String,
    pub bold: bool,
    pub italic: bool,
    pub strikethrough: bool,
    pub code: bool,
    pub href: Option<String>,
}

impl RichText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    fn from_value(value: &Value) -> Self {
        let flag = |name: &str| {
            value
                .pointer(&format!("/annotations/{}", name))
                .and_then(Value::as_bool)
                .unwrap_or(false)
        };
        Self {
            text: value
                .get("plain_text")
                .or_else(|| value.pointer("/text/content"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            bold: flag("bold"),
            italic: flag("italic"),
            strikethrough: flag("strikethrough"),
            code: flag("code"),
            href: value
                .get("href")
                .and_then(Value::as_str)
                .map(str::to_string),
        }
    }
}

/// Concatenated plain text of a run list.
pub fn plain_text(runs: &[RichText]) -> String {
    runs.iter().map(|r| r.text.as_str()).collect()
}

/// Block variants the converter understands. Everything else is `Unsupported`.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockKind {
    Paragraph(Vec<RichText>),
    Heading { level: u8, text: Vec<RichText> },
    BulletedListItem(Vec<RichText>),
    NumberedListItem(Vec<RichText>),
    ToDo { text: Vec<RichText>, checked: bool },
    Toggle(Vec<RichText>),
    Image { url: String, caption: Vec<RichText> },
    Embed { url: String, caption: Vec<RichText> },
    Video { url: String, caption: Vec<RichText> },
    Bookmark {
        url: String,
        caption: Vec<RichText>,
        preview: Option<LinkPreview>,
    },
    ColumnList,
    Column,
    Unsupported(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: String,
    pub has_children: bool,
    pub kind: BlockKind,
    pub children: Vec<Block>,
}

impl Block {
    pub fn new(id: impl Into<String>, kind: BlockKind) -> Self {
        Self {
            id: id.into(),
            has_children: false,
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<Block>) -> Self {
        self.has_children = !children.is_empty();
        self.children = children;
        self
    }

    /// Parse the API representation of a block. Never fails; unknown or
    /// malformed blocks become `Unsupported`.
    pub fn from_value(value: &Value) -> Self {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let has_children = value
            .get("has_children")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let kind_name = value
            .get("type")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let body = value.get(kind_name).unwrap_or(&Value::Null);

        let text = |key: &str| -> Vec<RichText> {
            body.get(key)
                .and_then(Value::as_array)
                .map(|runs| runs.iter().map(RichText::from_value).collect())
                .unwrap_or_default()
        };
        let media_url = || {
            file_object_url(body)
                .or_else(|| body.get("url").and_then(Value::as_str).map(str::to_string))
                .unwrap_or_default()
        };

        let kind = match kind_name {
            "paragraph" => BlockKind::Paragraph(text("rich_text")),
            "heading_1" | "heading_2" | "heading_3" => BlockKind::Heading {
                level: kind_name
                    .trim_start_matches("heading_")
                    .parse()
                    .unwrap_or(1),
                text: text("rich_text"),
            },
            "bulleted_list_item" => BlockKind::BulletedListItem(text("rich_text")),
            "numbered_list_item" => BlockKind::NumberedListItem(text("rich_text")),
            "to_do" => BlockKind::ToDo {
                text: text("rich_text"),
                checked: body
                    .get("checked")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            },
            "toggle" => BlockKind::Toggle(text("rich_text")),
            "image" => BlockKind::Image {
                url: media_url(),
                caption: text("caption"),
            },
            "embed" => BlockKind::Embed {
                url: media_url(),
                caption: text("caption"),
            },
            "video" => BlockKind::Video {
                url: media_url(),
                caption: text("caption"),
            },
            "bookmark" => BlockKind::Bookmark {
                url: media_url(),
                caption: text("caption"),
                preview: None,
            },
            "column_list" => BlockKind::ColumnList,
            "column" => BlockKind::Column,
            other => BlockKind::Unsupported(other.to_string()),
        };

        Self {
            id,
            has_children,
            kind,
            children: Vec::new(),
        }
    }

    /// Plain text of this block and its descendants, space separated.
    pub fn plain_text(&self) -> String {
        let own = match &self.kind {
            BlockKind::Paragraph(t)
            | BlockKind::BulletedListItem(t)
            | BlockKind::NumberedListItem(t)
            | BlockKind::Toggle(t)
            | BlockKind::Heading { text: t, .. }
            | BlockKind::ToDo { text: t, .. } => plain_text(t),
            _ => String::new(),
        };
        let mut parts = vec![own];
        parts.extend(self.children.iter().map(Block::plain_text));
        parts.retain(|p| !p.is_empty());
        parts.join(" ")
    }
}

/// Fetch a block's children, descending into every block that has its own.
pub fn fetch_block_tree<'a>(
    source: &'a dyn ContentSource,
    block_id: &str,
) -> BoxFuture<'a, Result<Vec<Block>>> {
    let block_id = block_id.to_string();
    async move {
        let mut blocks = source.block_children(&block_id).await?;
        for block in &mut blocks {
            if block.has_children {
                block.children = fetch_block_tree(source, &block.id).await?;
            }
        }
        Ok(blocks)
    }
    .boxed()
}
