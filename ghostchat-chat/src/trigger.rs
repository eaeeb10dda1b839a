//! Auto-image heuristic for the highest reasoning tier.
//!
//! The phrase lists are plain data ([`TriggerPhrases`]) compiled once into an
//! [`AutoImageTrigger`]. Each list is a set of regex alternatives matched
//! case-insensitively against the lowercased user text.

use crate::error::ChatResult;
use ghostchat_core::ReasoningLevel;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Longest user text (in characters) still considered for an auto image.
pub const MAX_TRIGGER_CHARS: usize = 140;

/// Bilingual phrase lists driving the heuristic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerPhrases {
    /// Explicit refusals of an image.
    pub negations: Vec<String>,
    /// How-to and explanation requests.
    pub explanations: Vec<String>,
    /// "What does X look like", "show me", "picture".
    pub visual: Vec<String>,
    /// "What is X".
    pub definitions: Vec<String>,
    /// Leading phrases stripped from the query, applied in order.
    pub leading: Vec<String>,
    /// Articles stripped from the start of the query.
    pub articles: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

impl Default for TriggerPhrases {
    fn default() -> Self {
        Self {
            negations: strings(&[
                r"sans\s+image",
                r"no\s+image",
                r"pas\s+d['’]?image",
                r"without\s+image",
            ]),
            explanations: strings(&[
                r"comment\s",
                r"how\s+to",
                "pourquoi",
                "expliquer",
                "explain",
                "guide",
                "tutoriel",
                "tutorial",
            ]),
            visual: strings(&[
                r"à?\s*quoi\s+ressemble",
                r"a\s*quoi\s+ressemble",
                r"looks?\s+like",
                r"what\s+does.+look\s+like",
                "montre(?:-moi)?",
                r"show\s+me",
                "image",
                "photo",
                "picture",
                "voir",
                "visuel",
                "visual",
            ]),
            definitions: strings(&[
                r"c'?est\s+quoi",
                r"qu['’]?est-ce\s+que",
                r"what\s+is",
                "what['’]s",
            ]),
            leading: strings(&[
                r"à?\s*quoi\s+ressemble\s+",
                r"a\s*quoi\s+ressemble\s+",
                r"what\s+does\s+",
                r"what\s+is\s+",
                r"what['’]s\s+",
                r"c'?est\s+quoi\s+",
                r"qu['’]?est-ce\s+que\s+",
                r"montre(?:-moi)?\s+",
                r"show\s+me\s+",
                r"image\s+de\s+",
                r"photo\s+de\s+",
                r"image\s+d['’]\s*",
                r"photo\s+d['’]\s*",
            ]),
            articles: strings(&["un", "une", "des", "le", "la", "les", "the", "a", "an"]),
        }
    }
}

/// Case-insensitive alternation of `alternatives`, `None` when there are none.
const PHRASE_TEMPLATE: &str = "(?i)(?:{})";
const ARTICLE_TEMPLATE: &str = r"(?i)^(?:{})\s+";

fn any_of(template: &str, alternatives: &[String]) -> ChatResult<Option<Regex>> {
    if alternatives.is_empty() {
        return Ok(None);
    }
    let pattern = template.replace("{}", &alternatives.join("|"));
    Ok(Some(Regex::new(&pattern)?))
}

fn is_match(pattern: Option<&Regex>, text: &str) -> bool {
    pattern.is_some_and(|re| re.is_match(text))
}

/// Compiled form of [`TriggerPhrases`].
#[derive(Debug, Clone)]
pub struct AutoImageTrigger {
    negation: Option<Regex>,
    explanation: Option<Regex>,
    visual: Option<Regex>,
    definition: Option<Regex>,
    leading: Vec<Regex>,
    trailing_punctuation: Regex,
    article: Option<Regex>,
    elision: Regex,
    existing_image: Regex,
}

impl AutoImageTrigger {
    /// Compile a phrase set.
    pub fn new(phrases: &TriggerPhrases) -> ChatResult<Self> {
        let leading = phrases
            .leading
            .iter()
            .map(|p| Regex::new(&format!(r"(?i)^\s*{p}")))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            negation: any_of(PHRASE_TEMPLATE, &phrases.negations)?,
            explanation: any_of(PHRASE_TEMPLATE, &phrases.explanations)?,
            visual: any_of(PHRASE_TEMPLATE, &phrases.visual)?,
            definition: any_of(PHRASE_TEMPLATE, &phrases.definitions)?,
            leading,
            trailing_punctuation: Regex::new(r"[?!.]+$")?,
            article: any_of(ARTICLE_TEMPLATE, &phrases.articles)?,
            elision: Regex::new(r"(?i)^d['’]\s+")?,
            existing_image: Regex::new(r"(?i)\[tool:(?:show_image|generate_image)\b")?,
        })
    }

    /// Compile the built-in French/English phrase set.
    pub fn bilingual() -> ChatResult<Self> {
        Self::new(&TriggerPhrases::default())
    }

    /// Whether an image should be appended to this reply.
    pub fn should_auto_show_image(
        &self,
        user_text: &str,
        level: ReasoningLevel,
        assistant_text: &str,
    ) -> bool {
        if !level.is_highest_tier() || user_text.is_empty() {
            return false;
        }
        if self.existing_image.is_match(assistant_text) {
            return false;
        }

        let normalized = user_text.to_lowercase();
        if normalized.chars().count() > MAX_TRIGGER_CHARS {
            return false;
        }
        if is_match(self.negation.as_ref(), &normalized)
            || is_match(self.explanation.as_ref(), &normalized)
        {
            return false;
        }
        is_match(self.visual.as_ref(), &normalized)
            || is_match(self.definition.as_ref(), &normalized)
    }

    /// Reduce a question to the thing to picture.
    pub fn extract_image_query(&self, user_text: &str) -> String {
        let raw = user_text.trim();
        let mut query = raw.to_string();
        for pattern in &self.leading {
            query = pattern.replace(&query, "").into_owned();
        }
        query = self.trailing_punctuation.replace(&query, "").trim().to_string();
        if let Some(article) = &self.article {
            query = article.replace(&query, "").into_owned();
        }
        query = self.elision.replace(&query, "").into_owned();

        if query.is_empty() {
            raw.to_string()
        } else {
            query
        }
    }

    /// Append a `show_image` directive when the heuristic fires.
    pub fn maybe_inject_image(
        &self,
        user_text: &str,
        level: ReasoningLevel,
        assistant_text: &str,
    ) -> String {
        if !self.should_auto_show_image(user_text, level, assistant_text) {
            return assistant_text.to_string();
        }
        let query = escape_tool_attr_value(&self.extract_image_query(user_text));
        if query.is_empty() {
            return assistant_text.to_string();
        }

        let tag = format!("[tool:show_image query=\"{query}\" alt=\"{query}\"]");
        if assistant_text.trim().is_empty() {
            tag
        } else {
            format!("{assistant_text}\n\n{tag}")
        }
    }
}

/// Make a value safe inside a double-quoted directive attribute.
///
/// Quotes and brackets become spaces and whitespace runs collapse.
#[must_use]
pub fn escape_tool_attr_value(value: &str) -> String {
    value
        .replace(['"', '[', ']'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
