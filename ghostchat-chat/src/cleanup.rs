//! Assistant text cleanup.

use crate::error::ChatResult;
use regex::Regex;

const SUPPORT_BLOCK: &str = r"(?i)\n*\s*---\s*\n\s*\*\*Support Pollinations\.AI:\*\*[\s\S]*?keep AI accessible for everyone\.\s*";
const BLANK_RUN: &str = r"\n{3,}";

/// Strips the upstream advertisement footer and excess blank lines.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    support_block: Regex,
    blank_run: Regex,
}

impl TextCleaner {
    /// Compile the cleanup patterns.
    pub fn new() -> ChatResult<Self> {
        Ok(Self {
            support_block: Regex::new(SUPPORT_BLOCK)?,
            blank_run: Regex::new(BLANK_RUN)?,
        })
    }

    /// Remove every advertisement block, collapse 3+ newlines to 2, trim.
    pub fn clean(&self, text: &str) -> String {
        let stripped = self.support_block.replace_all(text, "");
        let collapsed = self.blank_run.replace_all(&stripped, "\n\n");
        collapsed.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_strips_support_block() {
        let cleaner = TextCleaner::new().unwrap();
        let raw = "Paris is the capital.\n\n---\n**Support Pollinations.AI:**\n🌸 Ad 🌸\nPowered by ads, keep AI accessible for everyone.\n";
        assert_eq!(cleaner.clean(raw), "Paris is the capital.");
    }

    #[test]
    fn test_block_match_is_case_insensitive_and_lazy() {
        let cleaner = TextCleaner::new().unwrap();
        let raw = "A\n---\n**support pollinations.ai:** x keep ai accessible for everyone.\nB";
        assert_eq!(cleaner.clean(raw), "AB");
    }

    #[test]
    fn test_collapses_blank_lines() {
        let cleaner = TextCleaner::new().unwrap();
        assert_eq!(cleaner.clean("  one\n\n\n\n two  \n"), "one\n\n two");
    }

    #[test]
    fn test_plain_text_untouched() {
        let cleaner = TextCleaner::new().unwrap();
        assert_eq!(cleaner.clean("---\nnot an ad"), "---\nnot an ad");
    }
}
