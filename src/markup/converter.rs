// src/markup/converter.rs

//! Block tree to MDX markup.
//!
//! Consecutive list items of the same kind share one enclosing list. The scan
//! keeps an explicit [`ListState`]; any other block, a list of the other kind,
//! or the end of the sibling sequence closes the open list.

use crate::markup::text::{escape_attr, render_inline};
use crate::notion::block::plain_text;
use crate::notion::{Block, BlockKind, RichText};
use crate::utils::url::video_embed_url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Bulleted,
    Numbered,
}

impl ListKind {
    fn of(block: &Block) -> Option<Self> {
        match block.kind {
            BlockKind::BulletedListItem(_) => Some(ListKind::Bulleted),
            BlockKind::NumberedListItem(_) => Some(ListKind::Numbered),
            _ => None,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            ListKind::Bulleted => "ul",
            ListKind::Numbered => "ol",
        }
    }
}

/// Open-list state carried across a sibling scan.
#[derive(Debug, Default)]
enum ListState {
    #[default]
    NoList,
    Open { kind: ListKind, items: Vec<String> },
}

impl ListState {
    /// Add an item, opening a new list (and closing the old one) if the kind changes.
    fn push(&mut self, kind: ListKind, item: String, out: &mut Vec<String>) {
        if let ListState::Open { kind: open, items } = self {
            if *open == kind {
                items.push(item);
                return;
            }
        }
        self.close(out);
        *self = ListState::Open {
            kind,
            items: vec![item],
        };
    }

    /// Emit the open list, if any, and return to `NoList`.
    fn close(&mut self, out: &mut Vec<String>) {
        if let ListState::Open { kind, items } = std::mem::take(self) {
            let tag = kind.tag();
            out.push(format!("<{tag}>\n{}\n</{tag}>", items.join("\n")));
        }
    }
}

/// Convert a sequence of sibling blocks (and their descendants).
pub fn convert(blocks: &[Block]) -> String {
    let mut out = Vec::new();
    let mut state = ListState::NoList;

    for block in blocks {
        match ListKind::of(block) {
            Some(kind) => state.push(kind, list_item(block), &mut out),
            None => {
                state.close(&mut out);
                if let Some(fragment) = convert_block(block) {
                    out.push(fragment);
                }
            }
        }
    }
    state.close(&mut out);

    out.join("\n\n")
}

/// Convert one block on its own. List items render as a bare `<li>`;
/// unsupported blocks yield `None`.
pub fn convert_block(block: &Block) -> Option<String> {
    let fragment = match &block.kind {
        BlockKind::Paragraph(text) => {
            let inline = render_inline(text);
            if inline.trim().is_empty() {
                return None;
            }
            format!("<p>{}</p>", inline)
        }
        BlockKind::Heading { level, text } => {
            let level = (*level).clamp(1, 6);
            format!("<h{level}>{}</h{level}>", render_inline(text))
        }
        BlockKind::BulletedListItem(_) | BlockKind::NumberedListItem(_) => list_item(block),
        BlockKind::ToDo { text, checked } => format!(
            "<div class=\"notion-todo\"><input type=\"checkbox\" disabled{} /> <span>{}</span></div>",
            if *checked { " checked" } else { "" },
            render_inline(text)
        ),
        BlockKind::Toggle(text) => format!(
            "<details>\n<summary>{}</summary>\n{}\n</details>",
            render_inline(text),
            convert(&block.children)
        ),
        BlockKind::Image { url, caption } => format!(
            "<Image src=\"{}\" alt=\"{}\" />",
            escape_attr(url),
            escape_attr(&plain_text(caption))
        ),
        BlockKind::Embed { url, caption } => figure(
            &format!("<iframe src=\"{}\"></iframe>", escape_attr(url)),
            caption,
        ),
        BlockKind::Video { url, caption } => figure(
            &format!(
                "<iframe width=\"100%\" height=\"480\" src=\"{}\" frameborder=\"0\" \
                 allow=\"accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture\" \
                 allowfullscreen></iframe>",
                escape_attr(&video_embed_url(url))
            ),
            caption,
        ),
        BlockKind::Bookmark {
            url,
            caption,
            preview,
        } => match preview {
            Some(p) => format!(
                "<BookmarkCard url=\"{}\" title=\"{}\" description=\"{}\" image=\"{}\" />",
                escape_attr(url),
                escape_attr(p.title.as_deref().unwrap_or(url.as_str())),
                escape_attr(p.description.as_deref().unwrap_or_default()),
                escape_attr(p.image.as_deref().unwrap_or_default())
            ),
            None => {
                let label = plain_text(caption);
                let label = if label.trim().is_empty() { url.as_str() } else { label.as_str() };
                format!(
                    "<p><a href=\"{}\">{}</a></p>",
                    escape_attr(url),
                    escape_attr(label)
                )
            }
        },
        BlockKind::ColumnList => {
            let columns: Vec<String> = block
                .children
                .iter()
                .filter(|c| matches!(c.kind, BlockKind::Column))
                .map(|c| format!("<div class=\"notion-column\">\n{}\n</div>", convert(&c.children)))
                .collect();
            format!("<div class=\"notion-columns\">\n{}\n</div>", columns.join("\n"))
        }
        BlockKind::Column => format!(
            "<div class=\"notion-column\">\n{}\n</div>",
            convert(&block.children)
        ),
        BlockKind::Unsupported(kind) => {
            log::debug!("Dropping unsupported block {} ({})", block.id, kind);
            return None;
        }
    };
    Some(fragment)
}

fn list_item(block: &Block) -> String {
    let text = match &block.kind {
        BlockKind::BulletedListItem(t) | BlockKind::NumberedListItem(t) => render_inline(t),
        _ => String::new(),
    };
    if block.children.is_empty() {
        format!("<li>{}</li>", text)
    } else {
        format!("<li>{}\n{}\n</li>", text, convert(&block.children))
    }
}

fn figure(inner: &str, caption: &[RichText]) -> String {
    let caption = render_inline(caption);
    if caption.trim().is_empty() {
        format!("<figure>{}</figure>", inner)
    } else {
        format!("<figure>{}<figcaption>{}</figcaption></figure>", inner, caption)
    }
}
