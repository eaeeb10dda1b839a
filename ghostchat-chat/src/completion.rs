//! Completion and router calls against an OpenAI-compatible endpoint.

use crate::cleanup::TextCleaner;
use crate::config::ChatConfig;
use crate::error::ChatResult;
use crate::prompts::{router_user_prompt, system_prompt, ROUTER_SYSTEM_PROMPT};
use crate::trigger::AutoImageTrigger;
use ghostchat_core::{Message, ReasoningLevel, RouterLevel};
use ghostchat_render::{escape_text, RenderConfig};
use ghostchat_retries::{decode_json, NetworkResult, RetryClient};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Reply used when the endpoint answers without content.
pub const EMPTY_COMPLETION: &str = "No response.";

/// Exclusive upper bound of the per-request seed.
pub const SEED_RANGE: u32 = 10_000;

/// One message of the request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireMessage {
    /// `system`, `user` or `assistant`.
    pub role: String,
    /// Text.
    pub content: String,
}

impl WireMessage {
    fn new(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: content.into(),
        }
    }
}

impl From<&Message> for WireMessage {
    fn from(message: &Message) -> Self {
        Self::new(message.role.as_str(), message.content.clone())
    }
}

/// Completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionRequest {
    /// System prompt followed by the conversation tail.
    pub messages: Vec<WireMessage>,
    /// Model name.
    pub model: String,
    /// `low`, `medium` or `high`.
    pub reasoning_effort: &'static str,
    /// Random per attempt so identical prompts are not served from cache.
    pub seed: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionResponse {
    fn content(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.is_empty())
    }
}

/// Client for the completion endpoint, the router and image generation.
#[derive(Debug, Clone)]
pub struct ChatClient {
    http: RetryClient,
    config: ChatConfig,
    cleaner: TextCleaner,
    trigger: AutoImageTrigger,
}

impl ChatClient {
    /// Create a client with the built-in trigger phrases.
    pub fn new(config: ChatConfig) -> ChatResult<Self> {
        Self::with_trigger(config, AutoImageTrigger::bilingual()?)
    }

    /// Create a client with a custom auto-image trigger.
    pub fn with_trigger(config: ChatConfig, trigger: AutoImageTrigger) -> ChatResult<Self> {
        Ok(Self {
            http: RetryClient::new(config.retry.clone()),
            cleaner: TextCleaner::new()?,
            config,
            trigger,
        })
    }

    /// Configuration in use.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// Auto-image trigger in use.
    pub fn trigger(&self) -> &AutoImageTrigger {
        &self.trigger
    }

    /// Build the request messages: system prompt, then the last
    /// `history_window` messages.
    pub fn build_messages(&self, history: &[Message], level: ReasoningLevel) -> Vec<WireMessage> {
        let start = history.len().saturating_sub(self.config.history_window);
        let mut messages = Vec::with_capacity(history.len() - start + 1);
        messages.push(WireMessage::new("system", system_prompt(&self.config, level)));
        messages.extend(history[start..].iter().map(WireMessage::from));
        messages
    }

    async fn post(&self, messages: &[WireMessage], effort: &'static str) -> NetworkResult<Option<String>> {
        debug!(url = %self.config.completion_url, effort, "Completion request");
        let response = self
            .http
            .send(|client| {
                let body = CompletionRequest {
                    messages: messages.to_vec(),
                    model: self.config.model.clone(),
                    reasoning_effort: effort,
                    seed: rand::thread_rng().gen_range(0..SEED_RANGE),
                };
                client.post(self.config.completion_url.as_str()).json(&body)
            })
            .await?;
        let decoded: CompletionResponse = decode_json(response).await?;
        Ok(decoded.content())
    }

    /// Ask the router for a level. Any failure or unknown answer yields `Low`.
    pub async fn route(&self, user_text: &str) -> ReasoningLevel {
        let messages = [
            WireMessage::new("system", ROUTER_SYSTEM_PROMPT),
            WireMessage::new("user", router_user_prompt(user_text)),
        ];
        match self.post(&messages, ReasoningLevel::Low.effort()).await {
            Ok(answer) => {
                let level = answer
                    .as_deref()
                    .and_then(RouterLevel::parse_answer)
                    .map_or(ReasoningLevel::Low, ReasoningLevel::from);
                info!(level = %level, "Router picked reasoning level");
                level
            }
            Err(e) => {
                warn!(error = %e, "Router failed, defaulting to low");
                ReasoningLevel::Low
            }
        }
    }

    /// `Auto` goes through the router; every other level is used as is.
    pub async fn resolve_level(&self, selected: ReasoningLevel, user_text: &str) -> ReasoningLevel {
        if selected == ReasoningLevel::Auto {
            self.route(user_text).await
        } else {
            selected
        }
    }

    /// Raw completion for `history` at an already resolved level.
    pub async fn complete(&self, history: &[Message], level: ReasoningLevel) -> ChatResult<String> {
        let messages = self.build_messages(history, level);
        let content = self.post(&messages, level.effort()).await?;
        Ok(content.unwrap_or_else(|| EMPTY_COMPLETION.to_string()))
    }

    /// Full text reply: route, complete, clean, maybe append an auto image.
    pub async fn reply(
        &self,
        user_text: &str,
        history: &[Message],
        selected: ReasoningLevel,
    ) -> ChatResult<String> {
        let level = self.resolve_level(selected, user_text).await;
        let raw = self.complete(history, level).await?;
        let cleaned = self.cleaner.clean(&raw);
        Ok(self.trigger.maybe_inject_image(user_text, level, &cleaned))
    }

    /// Image reply for `prompt`, after the configured delay.
    pub async fn generate_image(&self, prompt: &str) -> String {
        tokio::time::sleep(self.config.generation_delay).await;
        image_embed_html(&self.config.image_synthesis_base, prompt)
    }
}

/// Trusted `<img>` markup for a synthesized image.
#[must_use]
pub fn image_embed_html(synthesis_base: &str, prompt: &str) -> String {
    let url = RenderConfig::new()
        .image_synthesis_base(synthesis_base)
        .synthesis_url(prompt);
    format!(
        "<img src=\"{}\" alt=\"{}\" style=\"max-width: 100%; border-radius: 8px; margin-top: 4px;\">",
        escape_text(&url),
        escape_text(prompt)
    )
}
