//! Attribute parsing for tool directives.
//!
//! The grammar is a sequence of `key="value"` pairs separated by arbitrary
//! text. Keys are ASCII word characters and are case-folded; values run up to
//! the next double quote and cannot contain one. Anything that does not fit
//! the grammar is skipped.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Attributes of a tool directive, in source order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(IndexMap<String, String>);

impl Attributes {
    /// Create an empty attribute map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the raw value of `key` (lowercase).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// First non-empty value among `keys`.
    pub fn first_of(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.get(key))
            .find(|value| !value.is_empty())
    }

    /// Insert a value, replacing any earlier one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Number of attributes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no attribute was parsed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn skip_whitespace(bytes: &[u8], mut pos: usize) -> usize {
    while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
        pos += 1;
    }
    pos
}

/// Parse `key="value"` pairs out of a directive body.
///
/// Runs in a single left-to-right pass. Duplicate keys keep the last value.
pub fn parse_attributes(raw: &str) -> Attributes {
    let bytes = raw.as_bytes();
    let mut attrs = Attributes::new();
    let mut pos = 0;

    while pos < bytes.len() {
        if !is_word_byte(bytes[pos]) {
            pos += 1;
            continue;
        }

        let key_start = pos;
        while pos < bytes.len() && is_word_byte(bytes[pos]) {
            pos += 1;
        }
        let key_end = pos;

        let after_key = skip_whitespace(bytes, pos);
        if bytes.get(after_key) != Some(&b'=') {
            continue;
        }
        let value_open = skip_whitespace(bytes, after_key + 1);
        if bytes.get(value_open) != Some(&b'"') {
            continue;
        }

        let value_start = value_open + 1;
        let Some(len) = raw[value_start..].find('"') else {
            // An unterminated value swallows the rest of the input.
            break;
        };
        let value_end = value_start + len;

        attrs.insert(
            raw[key_start..key_end].to_ascii_lowercase(),
            &raw[value_start..value_end],
        );
        pos = value_end + 1;
    }

    attrs
}
