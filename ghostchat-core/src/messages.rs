//! Chat messages and conversations.
//!
//! A [`Message`] keeps every regenerated variant of an assistant reply in
//! `versions`; `content` always mirrors the selected version once loading is
//! over. A [`Conversation`] is the unit that gets persisted.

use crate::errors::{CoreError, Result};
use crate::identifier::{now_utc, ConversationId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prefix of message content produced by the image generation path.
///
/// Such content is pre-rendered HTML and bypasses the markup renderer.
pub const IMAGE_EMBED_MARKER: &str = "<img";

/// Title used before a conversation has any user message.
pub const DEFAULT_TITLE: &str = "New Conversation";

const AUTO_TITLE_CHARS: usize = 30;

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person chatting.
    User,
    /// The model.
    Assistant,
    /// System instructions (never persisted in a conversation).
    System,
}

impl Role {
    /// Lowercase role name as used on the wire.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Author.
    pub role: Role,
    /// Displayed content.
    pub content: String,
    /// Content snapshots, empty unless the message was regenerated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<String>,
    /// Index of the selected version.
    #[serde(default)]
    pub current_version: usize,
    /// Whether a regeneration is in flight.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_loading: bool,
    /// Version selected before the in-flight regeneration.
    #[serde(skip)]
    restore_version: Option<usize>,
}

impl Message {
    /// Create a message.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            versions: Vec::new(),
            current_version: 0,
            is_loading: false,
            restore_version: None,
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Whether the content is a pre-rendered image embed.
    #[must_use]
    pub fn is_image_embed(&self) -> bool {
        self.content.starts_with(IMAGE_EMBED_MARKER)
    }

    /// Whether this message was produced by the image generation path,
    /// judged by its current content or its first version.
    #[must_use]
    pub fn is_generated_image(&self) -> bool {
        self.is_image_embed()
            || self
                .versions
                .first()
                .is_some_and(|v| v.starts_with(IMAGE_EMBED_MARKER))
    }

    /// Check `versions[current_version] == content` when not loading.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        if self.is_loading || self.versions.is_empty() {
            return true;
        }
        self.versions
            .get(self.current_version)
            .is_some_and(|v| *v == self.content)
    }

    /// Start a regeneration: snapshot the current content if needed, append an
    /// empty placeholder version, select it and mark the message loading.
    pub fn begin_regeneration(&mut self) {
        if self.versions.is_empty() {
            self.versions.push(self.content.clone());
            self.current_version = 0;
        }
        self.restore_version = Some(self.current_version);
        self.versions.push(String::new());
        self.current_version = self.versions.len() - 1;
        self.content.clear();
        self.is_loading = true;
    }

    /// Fill the placeholder version with the regenerated content.
    pub fn complete_regeneration(&mut self, content: impl Into<String>) {
        let content = content.into();
        if let Some(slot) = self.versions.get_mut(self.current_version) {
            slot.clone_from(&content);
        }
        self.content = content;
        self.is_loading = false;
        self.restore_version = None;
    }

    /// Drop the placeholder version and go back to the previous one.
    ///
    /// Does nothing unless a regeneration is in progress.
    pub fn abort_regeneration(&mut self) {
        if !self.is_loading {
            return;
        }
        self.versions.pop();
        let last = self.versions.len().saturating_sub(1);
        self.current_version = self
            .restore_version
            .take()
            .filter(|&index| index <= last)
            .unwrap_or(last);
        self.content = self
            .versions
            .get(self.current_version)
            .cloned()
            .unwrap_or_default();
        self.is_loading = false;
    }

    /// Select another version.
    pub fn switch_version(&mut self, index: usize) -> Result<()> {
        let version = self
            .versions
            .get(index)
            .ok_or(CoreError::VersionOutOfRange {
                index,
                len: self.versions.len(),
            })?;
        self.content = version.clone();
        self.current_version = index;
        Ok(())
    }
}

/// A persisted conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    /// Identifier.
    pub id: ConversationId,
    /// Displayed title.
    pub title: String,
    /// Title chosen by the user, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_title: Option<String>,
    /// Last modification time.
    pub timestamp: DateTime<Utc>,
    /// Messages in order.
    pub messages: Vec<Message>,
}

impl Conversation {
    /// Create an empty conversation.
    pub fn new(id: ConversationId) -> Self {
        Self {
            id,
            title: DEFAULT_TITLE.to_string(),
            manual_title: None,
            timestamp: now_utc(),
            messages: Vec::new(),
        }
    }

    /// Create a conversation holding the given messages.
    pub fn with_messages(id: ConversationId, messages: Vec<Message>) -> Self {
        let mut conversation = Self::new(id);
        conversation.messages = messages;
        conversation.refresh_title();
        conversation
    }

    /// Whether any message was written by the user.
    #[must_use]
    pub fn has_user_message(&self) -> bool {
        self.messages.iter().any(|m| m.role == Role::User)
    }

    /// Title derived from the first user message.
    #[must_use]
    pub fn auto_title(&self) -> String {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| {
                let head: String = m.content.chars().take(AUTO_TITLE_CHARS).collect();
                format!("{head}...")
            })
            .unwrap_or_else(|| DEFAULT_TITLE.to_string())
    }

    /// Recompute the displayed title and bump the timestamp.
    pub fn refresh_title(&mut self) {
        self.title = self.manual_title.clone().unwrap_or_else(|| self.auto_title());
        self.timestamp = now_utc();
    }

    /// Set or clear the manual title.
    pub fn set_manual_title(&mut self, title: Option<String>) {
        self.manual_title = title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());
        self.refresh_title();
    }

    /// Append a message and refresh the title.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.refresh_title();
    }

    /// Index of the closest user message before `index`.
    #[must_use]
    pub fn previous_user_message(&self, index: usize) -> Option<usize> {
        self.messages[..index.min(self.messages.len())]
            .iter()
            .rposition(|m| m.role == Role::User)
    }

    /// Mutable access to a message, checked.
    pub fn message_mut(&mut self, index: usize) -> Result<&mut Message> {
        let len = self.messages.len();
        self.messages
            .get_mut(index)
            .ok_or(CoreError::MessageOutOfRange { index, len })
    }
}
