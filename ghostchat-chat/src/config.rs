//! Chat configuration.

use ghostchat_render::config::DEFAULT_IMAGE_SYNTHESIS_BASE;
use ghostchat_retries::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default completion endpoint.
pub const DEFAULT_COMPLETION_URL: &str = "https://text.pollinations.ai/openai";

/// Default model name.
pub const DEFAULT_MODEL: &str = "openai";

/// First message of every new conversation.
pub const DEFAULT_GREETING: &str = "Hello! I am GhostChat. How can I help you today?";

/// Tone requested from the assistant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStyle {
    /// Balanced and natural.
    #[default]
    Default,
    /// Clear, structured, formal.
    Professional,
    /// Short replies.
    Direct,
    /// Step-by-step explanations.
    Pedagogic,
    /// Vivid language.
    Creative,
    /// Precise and dev-oriented.
    Technical,
    /// Jargon and tech references.
    Geek,
    /// Structured and convincing.
    Persuasive,
}

impl ResponseStyle {
    /// All styles.
    pub const ALL: [ResponseStyle; 8] = [
        Self::Default,
        Self::Professional,
        Self::Direct,
        Self::Pedagogic,
        Self::Creative,
        Self::Technical,
        Self::Geek,
        Self::Persuasive,
    ];

    /// Lowercase identifier.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Professional => "professional",
            Self::Direct => "direct",
            Self::Pedagogic => "pedagogic",
            Self::Creative => "creative",
            Self::Technical => "technical",
            Self::Geek => "geek",
            Self::Persuasive => "persuasive",
        }
    }

    /// Instruction appended to the system prompt.
    #[must_use]
    pub fn instruction(self) -> &'static str {
        match self {
            Self::Default => "Use a balanced, clear, and natural style.",
            Self::Professional => "Use a professional voice: clear, structured, formal, and neutral. Keep paragraphs tidy and well presented.",
            Self::Direct => "Be direct and concise. Get straight to the point without unnecessary filler.",
            Self::Pedagogic => "Explain in a teaching style: clear, progressive, and structured. Use steps or examples when helpful.",
            Self::Creative => "Be creative: original, expressive, and lively. Use imagery and a fluid tone.",
            Self::Technical => "Be technical: precise, development- or logic-oriented. Include technical details and code when relevant.",
            Self::Geek => "Be geeky: use well-controlled technical jargon, relevant tech references, and high precision.",
            Self::Persuasive => "Be persuasive: structure arguments, highlight key points, and aim to convince clearly.",
        }
    }
}

impl fmt::Display for ResponseStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResponseStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|style| style.as_str() == lower)
            .ok_or_else(|| format!("unknown response style: {s}"))
    }
}

/// Configuration for [`ChatClient`](crate::ChatClient) and
/// [`ChatSession`](crate::ChatSession).
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// Completion endpoint, also used by the router.
    pub completion_url: String,
    /// Model name sent upstream.
    pub model: String,
    /// Number of trailing messages sent as context.
    pub history_window: usize,
    /// Replaces the built-in base system prompt when set.
    pub system_prompt: Option<String>,
    /// Requested tone.
    pub style: ResponseStyle,
    /// Origin of the image synthesis endpoint.
    pub image_synthesis_base: String,
    /// Pause before an image-generation reply is produced.
    pub generation_delay: Duration,
    /// `false` runs in ghost mode: nothing is ever written to the store.
    pub persist: bool,
    /// First assistant message of a new conversation.
    pub greeting: String,
    /// Rate-limit retry policy.
    pub retry: RetryPolicy,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            completion_url: DEFAULT_COMPLETION_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            history_window: 6,
            system_prompt: None,
            style: ResponseStyle::Default,
            image_synthesis_base: DEFAULT_IMAGE_SYNTHESIS_BASE.to_string(),
            generation_delay: Duration::from_secs(1),
            persist: true,
            greeting: DEFAULT_GREETING.to_string(),
            retry: RetryPolicy::for_api(),
        }
    }
}

impl ChatConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `GHOSTCHAT_COMPLETION_URL`, `GHOSTCHAT_MODEL`
    /// and `GHOSTCHAT_SYSTEM_PROMPT` when set and non-empty.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(url) = non_empty_var("GHOSTCHAT_COMPLETION_URL") {
            config.completion_url = url;
        }
        if let Some(model) = non_empty_var("GHOSTCHAT_MODEL") {
            config.model = model;
        }
        if let Some(prompt) = non_empty_var("GHOSTCHAT_SYSTEM_PROMPT") {
            config.system_prompt = Some(prompt);
        }
        config
    }

    /// Set the completion endpoint.
    #[must_use]
    pub fn completion_url(mut self, url: impl Into<String>) -> Self {
        self.completion_url = url.into();
        self
    }

    /// Set the model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the context window.
    #[must_use]
    pub fn history_window(mut self, messages: usize) -> Self {
        self.history_window = messages;
        self
    }

    /// Replace the base system prompt.
    #[must_use]
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Set the response style.
    #[must_use]
    pub fn style(mut self, style: ResponseStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the image synthesis origin.
    #[must_use]
    pub fn image_synthesis_base(mut self, base: impl Into<String>) -> Self {
        self.image_synthesis_base = base.into();
        self
    }

    /// Set the image generation delay.
    #[must_use]
    pub fn generation_delay(mut self, delay: Duration) -> Self {
        self.generation_delay = delay;
        self
    }

    /// Enable or disable persistence.
    #[must_use]
    pub fn persist(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    /// Shortcut for `persist(false)`.
    #[must_use]
    pub fn ghost_mode(self) -> Self {
        self.persist(false)
    }

    /// Set the greeting.
    #[must_use]
    pub fn greeting(mut self, greeting: impl Into<String>) -> Self {
        self.greeting = greeting.into();
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ChatConfig::default();
        assert_eq!(config.completion_url, DEFAULT_COMPLETION_URL);
        assert_eq!(config.model, "openai");
        assert_eq!(config.history_window, 6);
        assert_eq!(config.generation_delay, Duration::from_secs(1));
        assert!(config.persist);
        assert_eq!(config.retry.max_retries, 2);
    }

    #[test]
    fn test_builder() {
        let config = ChatConfig::new()
            .completion_url("http://localhost:9000/chat")
            .model("mistral")
            .history_window(2)
            .style(ResponseStyle::Direct)
            .ghost_mode();

        assert_eq!(config.completion_url, "http://localhost:9000/chat");
        assert_eq!(config.model, "mistral");
        assert_eq!(config.history_window, 2);
        assert_eq!(config.style, ResponseStyle::Direct);
        assert!(!config.persist);
    }

    #[test]
    fn test_style_parse() {
        assert_eq!("Geek".parse::<ResponseStyle>(), Ok(ResponseStyle::Geek));
        assert!("loud".parse::<ResponseStyle>().is_err());
        for style in ResponseStyle::ALL {
            assert!(!style.instruction().is_empty());
        }
    }
}
