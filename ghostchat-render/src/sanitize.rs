//! URL validation and text escaping.

use tracing::debug;
use url::Url;

/// Schemes a rendered href or image source may use.
const ALLOWED_SCHEMES: [&str; 2] = ["http", "https"];

/// Escape the five HTML-significant characters.
///
/// The output is safe to embed both as element text and inside a
/// double-quoted attribute value.
pub fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Resolves possibly-relative URLs against a page origin and keeps only
/// `http`/`https` results.
#[derive(Debug, Clone)]
pub struct UrlSanitizer {
    base: Option<Url>,
}

impl Default for UrlSanitizer {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_BASE_URL)
    }
}

impl UrlSanitizer {
    /// Create a sanitizer resolving relative URLs against `base`.
    ///
    /// An unparseable base disables relative resolution; absolute URLs are
    /// still accepted.
    pub fn new(base: &str) -> Self {
        let base = match Url::parse(base) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!(base = %base, error = %e, "Ignoring invalid base URL");
                None
            }
        };
        Self { base }
    }

    /// Create a sanitizer that only accepts absolute URLs.
    pub fn absolute_only() -> Self {
        Self { base: None }
    }

    /// Return the absolute form of `raw` if it resolves to an allowed scheme.
    pub fn sanitize(&self, raw: &str) -> Option<String> {
        if raw.is_empty() {
            return None;
        }

        let parsed = match &self.base {
            Some(base) => base.join(raw),
            None => Url::parse(raw),
        };

        match parsed {
            Ok(url) if ALLOWED_SCHEMES.contains(&url.scheme()) => Some(url.into()),
            Ok(url) => {
                debug!(scheme = url.scheme(), "Rejected URL scheme");
                None
            }
            Err(_) => None,
        }
    }
}

/// Sanitize `raw` against the default page origin.
///
/// Returns an empty string when the URL is rejected.
pub fn sanitize_url(raw: &str) -> String {
    UrlSanitizer::default().sanitize(raw).unwrap_or_default()
}
