// src/utils/url.rs

//! URL and slug helpers.

use url::Url;

/// Resolve a potentially relative URL against a base URL.
///
/// # Examples
/// ```
/// use folio_sync::utils::url::resolve;
///
/// assert_eq!(
///     resolve("https://example.com/blog/post", "/img/a.png"),
///     "https://example.com/img/a.png"
/// );
/// ```
pub fn resolve(base: &str, href: &str) -> String {
    Url::parse(base)
        .and_then(|b| b.join(href))
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Rewrite a YouTube watch or short link to its embeddable player URL.
/// Other URLs are returned unchanged.
///
/// # Examples
/// ```
/// use folio_sync::utils::url::video_embed_url;
///
/// assert_eq!(
///     video_embed_url("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42"),
///     "https://www.youtube.com/embed/dQw4w9WgXcQ"
/// );
/// ```
pub fn video_embed_url(raw: &str) -> String {
    let Ok(parsed) = Url::parse(raw) else {
        return raw.to_string();
    };
    let host = parsed
        .host_str()
        .unwrap_or_default()
        .trim_start_matches("www.")
        .trim_start_matches("m.");

    let id = match host {
        "youtube.com" if parsed.path() == "/watch" => parsed
            .query_pairs()
            .find(|(k, _)| k == "v")
            .map(|(_, v)| v.into_owned()),
        "youtu.be" => parsed
            .path_segments()
            .and_then(|mut s| s.next())
            .map(str::to_string),
        _ => None,
    };

    match id.filter(|id| !id.is_empty()) {
        Some(id) => format!("https://www.youtube.com/embed/{}", id),
        None => raw.to_string(),
    }
}

/// Lowercase, strip punctuation and join words with `-`.
///
/// # Examples
/// ```
/// use folio_sync::utils::url::slugify;
///
/// assert_eq!(slugify("Hello, World: Part 2!"), "hello-world-part-2");
/// ```
pub fn slugify(title: &str) -> String {
    let kept: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join("-")
}

/// Last path segment of a URL or path, without query string.
pub fn basename(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path.rsplit('/').next().unwrap_or(path)
}

/// Lowercased extension of the last path segment, if any.
pub fn extension(path: &str) -> Option<String> {
    let name = basename(path);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() || ext.len() > 5 {
        return None;
    }
    Some(ext.to_lowercase())
}
