//! Resolved images.

use serde::{Deserialize, Serialize};

/// Maximum length of an image description.
pub const MAX_DESCRIPTION_CHARS: usize = 200;

/// Cuts at a space only when it keeps more than this many characters.
const MIN_WORD_CUT: usize = 60;

/// A verified image for a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageResolutionResult {
    /// Absolute `http(s)` image URL.
    pub url: String,
    /// Short description, possibly empty.
    pub description: String,
    /// Canonical subject name.
    pub title: String,
}

impl ImageResolutionResult {
    /// Caption to show under the image: description, else title, else `alt`.
    pub fn caption<'a>(&'a self, alt: &'a str) -> &'a str {
        [self.description.trim(), self.title.trim()]
            .into_iter()
            .find(|text| !text.is_empty())
            .unwrap_or(alt)
    }
}

/// Shorten `text` to at most `max_chars` characters plus `...`.
///
/// The cut happens at the last space when that keeps more than 60
/// characters, otherwise in the middle of a word.
pub fn shorten_text(text: &str, max_chars: usize) -> String {
    let text = text.trim();
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let window: String = text.chars().take(max_chars + 1).collect();
    if let Some(space) = window.rfind(' ') {
        if window[..space].chars().count() > MIN_WORD_CUT {
            return format!("{}...", window[..space].trim());
        }
    }

    let hard: String = text.chars().take(max_chars).collect();
    format!("{}...", hard.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_unchanged() {
        assert_eq!(shorten_text("  La tour Eiffel.  ", 200), "La tour Eiffel.");
        assert_eq!(shorten_text("", 200), "");
    }

    #[test]
    fn test_cut_at_word() {
        let text = format!("{} fin du texte", "mot ".repeat(60));
        let short = shorten_text(&text, 200);
        assert!(short.ends_with("mot..."));
        assert!(short.chars().count() <= 203);
    }

    #[test]
    fn test_hard_cut_without_late_space() {
        let text = format!("court {}", "x".repeat(300));
        let short = shorten_text(&text, 200);
        assert_eq!(short.chars().count(), 203);
        assert!(short.starts_with("court xxx"));
    }

    #[test]
    fn test_multibyte_text() {
        let text = "é".repeat(250);
        assert_eq!(shorten_text(&text, 200), format!("{}...", "é".repeat(200)));
    }

    #[test]
    fn test_caption_fallbacks() {
        let mut result = ImageResolutionResult {
            url: "https://img/x.jpg".into(),
            description: "Mammifère d'Afrique".into(),
            title: "Girafe".into(),
        };
        assert_eq!(result.caption("alt"), "Mammifère d'Afrique");
        result.description.clear();
        assert_eq!(result.caption("alt"), "Girafe");
        result.title = "  ".into();
        assert_eq!(result.caption("alt"), "alt");
    }
}
