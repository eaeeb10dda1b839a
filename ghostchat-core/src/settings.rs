//! Reasoning levels.
//!
//! A reasoning level is the effort tier selected for a reply. It controls the
//! `reasoning_effort` sent upstream and whether the auto-image heuristic runs.

use crate::errors::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Effort tier selected by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReasoningLevel {
    /// Let the router pick a level per prompt.
    Auto,
    /// Extraction, formatting, very short tasks.
    Minimal,
    /// Simple questions.
    #[default]
    Low,
    /// General tasks.
    Medium,
    /// Complex, multi-step reasoning.
    High,
    /// Highest tier; enables auto-injected images.
    Ultra,
}

impl ReasoningLevel {
    /// All levels, in increasing order.
    pub const ALL: [ReasoningLevel; 6] = [
        Self::Auto,
        Self::Minimal,
        Self::Low,
        Self::Medium,
        Self::High,
        Self::Ultra,
    ];

    /// The `reasoning_effort` value sent to the completion endpoint.
    #[must_use]
    pub fn effort(self) -> &'static str {
        match self {
            Self::Auto | Self::Minimal | Self::Low => "low",
            Self::Medium => "medium",
            Self::High | Self::Ultra => "high",
        }
    }

    /// Whether this is the highest tier.
    #[must_use]
    pub fn is_highest_tier(self) -> bool {
        self == Self::Ultra
    }

    /// Whether the system prompt should carry the tool grammar.
    #[must_use]
    pub fn uses_tools(self) -> bool {
        matches!(self, Self::High | Self::Ultra)
    }

    /// Lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Minimal => "minimal",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Ultra => "ultra",
        }
    }
}

impl fmt::Display for ReasoningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReasoningLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|level| level.as_str() == lower)
            .ok_or_else(|| CoreError::UnknownReasoningLevel(s.to_string()))
    }
}

/// Levels the reasoning router is allowed to answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RouterLevel {
    /// Minimal.
    Minimal,
    /// Low.
    Low,
    /// Medium.
    Medium,
    /// High.
    High,
}

impl RouterLevel {
    /// Parse the router's raw answer.
    ///
    /// Only the first whitespace-separated token counts, lowercased and stripped
    /// of anything that is not an ASCII letter.
    #[must_use]
    pub fn parse_answer(raw: &str) -> Option<Self> {
        let lower = raw.trim().to_lowercase();
        let token: String = lower
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .chars()
            .filter(char::is_ascii_lowercase)
            .collect();
        match token.as_str() {
            "minimal" => Some(Self::Minimal),
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl From<RouterLevel> for ReasoningLevel {
    fn from(level: RouterLevel) -> Self {
        match level {
            RouterLevel::Minimal => Self::Minimal,
            RouterLevel::Low => Self::Low,
            RouterLevel::Medium => Self::Medium,
            RouterLevel::High => Self::High,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ReasoningLevel::Auto, "low")]
    #[case(ReasoningLevel::Minimal, "low")]
    #[case(ReasoningLevel::Low, "low")]
    #[case(ReasoningLevel::Medium, "medium")]
    #[case(ReasoningLevel::High, "high")]
    #[case(ReasoningLevel::Ultra, "high")]
    fn test_effort_mapping(#[case] level: ReasoningLevel, #[case] effort: &str) {
        assert_eq!(level.effort(), effort);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!("ULTRA".parse::<ReasoningLevel>().unwrap(), ReasoningLevel::Ultra);
        assert_eq!(" auto ".parse::<ReasoningLevel>().unwrap(), ReasoningLevel::Auto);
        assert!("turbo".parse::<ReasoningLevel>().is_err());
    }

    #[test]
    fn test_only_ultra_is_highest() {
        assert!(ReasoningLevel::Ultra.is_highest_tier());
        assert!(!ReasoningLevel::High.is_highest_tier());
    }

    #[test]
    fn test_router_answer() {
        assert_eq!(RouterLevel::parse_answer("High"), Some(RouterLevel::High));
        assert_eq!(
            RouterLevel::parse_answer("  medium.\nbecause"),
            Some(RouterLevel::Medium)
        );
        assert_eq!(RouterLevel::parse_answer("ultra"), None);
        assert_eq!(RouterLevel::parse_answer(""), None);
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&ReasoningLevel::Medium).unwrap();
        assert_eq!(json, "\"medium\"");
    }
}
