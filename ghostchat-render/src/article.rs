//! Recognition of encyclopedia article URLs.
//!
//! Image queries may arrive as Wikipedia links instead of plain topics. These
//! helpers turn such links back into article titles.

use url::Url;

const ARTICLE_HOST: &str = "wikipedia.org";
const TITLE_PARAMS: [&str; 4] = ["gsrsearch", "titles", "title", "page"];

/// Find the first `http(s)` URL embedded in free text.
///
/// The URL ends at whitespace, angle brackets, quotes, `)` or `]`.
pub fn extract_first_url(text: &str) -> Option<&str> {
    let lower = text.to_ascii_lowercase();
    let mut from = 0;

    while let Some(offset) = lower[from..].find("http") {
        let start = from + offset;
        let rest = &lower[start + 4..];
        let scheme_len = if rest.starts_with("s://") {
            8
        } else if rest.starts_with("://") {
            7
        } else {
            from = start + 1;
            continue;
        };

        let body_start = start + scheme_len;
        let end = text[body_start..]
            .find(|c: char| c.is_whitespace() || matches!(c, '<' | '>' | '"' | '\'' | ')' | ']'))
            .map_or(text.len(), |i| body_start + i);
        if end > body_start {
            return Some(&text[start..end]);
        }
        from = start + 1;
    }

    None
}

/// Percent-decode a title and turn `_`/`+` separators into spaces.
pub fn normalize_title(raw: &str) -> String {
    let decoded = urlencoding::decode(raw).map(|s| s.into_owned());
    let text = decoded.unwrap_or_else(|_| raw.to_string());
    text.replace(['_', '+'], " ").trim().to_string()
}

fn has_http_scheme(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    ["http://", "https://"].iter().any(|scheme| {
        bytes.len() >= scheme.len() && bytes[..scheme.len()].eq_ignore_ascii_case(scheme.as_bytes())
    })
}

fn is_article_host(host: &str) -> bool {
    host == ARTICLE_HOST || host.ends_with(".wikipedia.org")
}

/// Extract the article title from a Wikipedia URL.
///
/// Understands `/wiki/<Title>` paths and the `api.php`/`index.php` endpoints
/// with a `gsrsearch`, `titles`, `title` or `page` parameter.
pub fn article_title_from_url(raw: &str) -> Option<String> {
    if !has_http_scheme(raw) {
        return None;
    }

    let url = Url::parse(raw).ok()?;
    if !url.host_str().is_some_and(is_article_host) {
        return None;
    }

    let path = url.path();
    let title = if let Some(title) = path.strip_prefix("/wiki/") {
        normalize_title(title)
    } else if path.ends_with("/w/api.php") || path.ends_with("/w/index.php") {
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        let value = TITLE_PARAMS
            .iter()
            .find_map(|name| {
                pairs
                    .iter()
                    .find(|(key, value)| key == name && !value.is_empty())
                    .map(|(_, value)| value.as_str())
            })
            .unwrap_or_default();
        normalize_title(value)
    } else {
        return None;
    };

    (!title.is_empty()).then_some(title)
}

/// Normalize an image query.
///
/// When the query embeds an article URL the decoded title replaces it;
/// otherwise the trimmed query is returned unchanged.
pub fn normalize_image_query(raw: &str) -> String {
    let query = raw.trim();
    if query.is_empty() {
        return String::new();
    }

    extract_first_url(query)
        .and_then(article_title_from_url)
        .unwrap_or_else(|| query.to_string())
}
