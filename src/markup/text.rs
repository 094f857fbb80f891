// src/markup/text.rs

//! Escaping and inline rendering of annotated text runs.

use std::sync::OnceLock;

use regex::Regex;

use crate::notion::RichText;

/// Escape text content for MDX: HTML specials plus JSX braces.
pub fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '{' => out.push_str("&#123;"),
            '}' => out.push_str("&#125;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape an attribute value (double-quoted).
pub fn escape_attr(raw: &str) -> String {
    escape_text(raw).replace('"', "&quot;")
}

/// Render one run with its annotations as inline markup.
pub fn render_run(run: &RichText) -> String {
    let mut html = escape_text(&run.text).replace('\n', "<br />");
    if html.is_empty() {
        return html;
    }
    if run.code {
        html = format!("<code>{}</code>", html);
    }
    if run.bold {
        html = format!("<strong>{}</strong>", html);
    }
    if run.italic {
        html = format!("<em>{}</em>", html);
    }
    if run.strikethrough {
        html = format!("<s>{}</s>", html);
    }
    if let Some(href) = &run.href {
        html = format!("<a href=\"{}\">{}</a>", escape_attr(href), html);
    }
    html
}

/// Render a run list as inline markup.
pub fn render_inline(runs: &[RichText]) -> String {
    runs.iter().map(render_run).collect()
}

fn leading_marker() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*[-*▪◦●]\s+").ok())
        .as_ref()
}

/// Split `•`- or newline-separated text into items, dropping list markers.
pub fn bullet_lines(text: &str) -> Vec<String> {
    text.split(['\n', '•'])
        .map(|line| match leading_marker() {
            Some(marker) => marker.replace(line, "").trim().to_string(),
            None => line.trim().to_string(),
        })
        .filter(|line| !line.is_empty())
        .collect()
}
