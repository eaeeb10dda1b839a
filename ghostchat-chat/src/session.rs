//! Chat session flows.
//!
//! A reply is produced in three steps so the network call can run while the
//! session keeps serving other operations:
//!
//! 1. [`ChatSession::begin_send`] or [`ChatSession::begin_regenerate`] mutate
//!    the active conversation and return a [`ReplyRequest`] stamped with the
//!    id of the conversation active at that moment.
//! 2. [`ReplyRequest::execute`] talks to the endpoint.
//! 3. [`ChatSession::finish`] applies the outcome. If the stamped conversation
//!    is no longer active the outcome goes to the history store instead of the
//!    displayed conversation, or is dropped in ghost mode.

use crate::completion::ChatClient;
use crate::config::ChatConfig;
use crate::error::{ChatError, ChatResult};
use crate::store::HistoryStore;
use ghostchat_core::{Conversation, ConversationId, CoreError, Message, ReasoningLevel, Role};
use tracing::{debug, info, warn};

/// Assistant message appended when a text reply fails.
pub const SEND_ERROR_MESSAGE: &str = "⚠️ Error: Could not reach the ghost in the machine.";

/// Assistant message appended when image generation fails.
pub const IMAGE_ERROR_MESSAGE: &str = "⚠️ Error generating image.";

/// What the reply should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// Completion text.
    Text,
    /// Synthesized image embed.
    Image,
}

/// Where the reply lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyTarget {
    /// A new assistant message.
    Append,
    /// A new version of an existing assistant message.
    Version {
        /// Index of the regenerated message.
        message_index: usize,
    },
}

/// An in-flight reply.
#[derive(Debug, Clone)]
pub struct ReplyRequest {
    /// Conversation active when the request was made.
    pub conversation_id: ConversationId,
    /// Append or regenerate.
    pub target: ReplyTarget,
    /// Text or image.
    pub kind: ReplyKind,
    /// Prompt the reply answers.
    pub user_text: String,
    /// Context sent upstream, ending with the prompt.
    pub history: Vec<Message>,
    /// Level selected by the user.
    pub reasoning: ReasoningLevel,
}

impl ReplyRequest {
    /// Produce the reply content.
    pub async fn execute(&self, client: &ChatClient) -> ChatResult<String> {
        match self.kind {
            ReplyKind::Text => {
                client
                    .reply(&self.user_text, &self.history, self.reasoning)
                    .await
            }
            ReplyKind::Image => Ok(client.generate_image(&self.user_text).await),
        }
    }
}

/// How a finished reply was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Applied to the displayed conversation.
    Displayed,
    /// Written to the history of a conversation that is no longer active.
    Persisted,
    /// Dropped: the conversation is gone and persistence is off.
    Discarded,
}

/// State of one chat window.
#[derive(Debug)]
pub struct ChatSession {
    config: ChatConfig,
    history: HistoryStore,
    active: Conversation,
    pending: Option<ConversationId>,
    reasoning: ReasoningLevel,
    image_mode: bool,
}

impl ChatSession {
    /// Open a session, restoring the last active conversation when stored.
    pub fn new(config: ChatConfig, history: HistoryStore) -> Self {
        let restored = history.active_id().and_then(|id| history.get(&id));
        let active = match restored {
            Some(conversation) => {
                debug!(conversation_id = %conversation.id, "Restored active conversation");
                conversation
            }
            None => greeting_conversation(&config),
        };
        Self {
            config,
            history,
            active,
            pending: None,
            reasoning: ReasoningLevel::default(),
            image_mode: false,
        }
    }

    /// Session over an in-memory store.
    pub fn in_memory(config: ChatConfig) -> Self {
        Self::new(config, HistoryStore::in_memory())
    }

    /// Configuration in use.
    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// History store.
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// The displayed conversation.
    pub fn active(&self) -> &Conversation {
        &self.active
    }

    /// Whether a send is waiting for its reply.
    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    /// Selected reasoning level.
    pub fn reasoning(&self) -> ReasoningLevel {
        self.reasoning
    }

    /// Select a reasoning level.
    pub fn set_reasoning(&mut self, level: ReasoningLevel) {
        self.reasoning = level;
    }

    /// Whether sends generate images.
    pub fn image_mode(&self) -> bool {
        self.image_mode
    }

    /// Toggle image generation for sends.
    pub fn set_image_mode(&mut self, enabled: bool) {
        self.image_mode = enabled;
    }

    /// Stored conversations, most recent first.
    pub fn conversations(&self) -> Vec<Conversation> {
        self.history.load()
    }

    /// Stored conversations whose title contains `term`.
    pub fn search(&self, term: &str) -> Vec<Conversation> {
        self.history.search(term)
    }

    fn persist_active(&self) -> ChatResult<()> {
        if !self.config.persist {
            return Ok(());
        }
        if self.history.upsert(&self.active)? {
            self.history.set_active_id(&self.active.id)?;
        }
        Ok(())
    }

    /// Append the user's message and prepare the reply.
    pub fn begin_send(&mut self, text: &str) -> ChatResult<ReplyRequest> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if self.pending.is_some() {
            return Err(ChatError::Busy);
        }

        self.active.push(Message::user(text));
        self.persist_active()?;
        self.pending = Some(self.active.id.clone());

        Ok(ReplyRequest {
            conversation_id: self.active.id.clone(),
            target: ReplyTarget::Append,
            kind: if self.image_mode {
                ReplyKind::Image
            } else {
                ReplyKind::Text
            },
            user_text: text.to_string(),
            history: self.active.messages.clone(),
            reasoning: self.reasoning,
        })
    }

    /// Open a placeholder version on an assistant message and prepare its
    /// replacement.
    ///
    /// The context ends with the closest preceding user message. Image embeds
    /// are regenerated from that message as a prompt.
    pub fn begin_regenerate(&mut self, message_index: usize) -> ChatResult<ReplyRequest> {
        let message = self
            .active
            .messages
            .get(message_index)
            .ok_or(ChatError::InvalidIndex(message_index))?;
        if message.role != Role::Assistant {
            return Err(CoreError::NotAssistant(message_index).into());
        }
        if message.is_loading {
            return Err(ChatError::Busy);
        }
        let kind = if message.is_generated_image() {
            ReplyKind::Image
        } else {
            ReplyKind::Text
        };
        let user_index = self
            .active
            .previous_user_message(message_index)
            .ok_or(CoreError::NoPrecedingUserMessage(message_index))?;

        let user_text = self.active.messages[user_index].content.clone();
        let history = self.active.messages[..=user_index].to_vec();
        self.active.message_mut(message_index)?.begin_regeneration();

        Ok(ReplyRequest {
            conversation_id: self.active.id.clone(),
            target: ReplyTarget::Version { message_index },
            kind,
            user_text,
            history,
            reasoning: self.reasoning,
        })
    }

    /// Apply a finished reply.
    ///
    /// A failed send still appends one assistant message carrying the error
    /// text. A failed regeneration removes the placeholder version.
    pub fn finish(
        &mut self,
        request: ReplyRequest,
        outcome: ChatResult<String>,
    ) -> ChatResult<Delivery> {
        if let Err(e) = &outcome {
            warn!(conversation_id = %request.conversation_id, error = %e, "Reply failed");
        }
        match request.target {
            ReplyTarget::Append => {
                if self.pending.as_ref() == Some(&request.conversation_id) {
                    self.pending = None;
                }
                let content = outcome.unwrap_or_else(|_| match request.kind {
                    ReplyKind::Text => SEND_ERROR_MESSAGE.to_string(),
                    ReplyKind::Image => IMAGE_ERROR_MESSAGE.to_string(),
                });
                self.deliver_message(&request.conversation_id, Message::assistant(content))
            }
            ReplyTarget::Version { message_index } => {
                self.deliver_version(&request.conversation_id, message_index, outcome.ok())
            }
        }
    }

    fn deliver_message(&mut self, id: &ConversationId, message: Message) -> ChatResult<Delivery> {
        if self.active.id == *id {
            self.active.push(message);
            self.persist_active()?;
            return Ok(Delivery::Displayed);
        }
        if !self.config.persist {
            debug!(conversation_id = %id, "Stale reply discarded");
            return Ok(Delivery::Discarded);
        }
        self.history.append_message(id, message)?;
        info!(conversation_id = %id, "Stale reply persisted out-of-band");
        Ok(Delivery::Persisted)
    }

    fn deliver_version(
        &mut self,
        id: &ConversationId,
        message_index: usize,
        content: Option<String>,
    ) -> ChatResult<Delivery> {
        if self.active.id == *id {
            apply_version(self.active.message_mut(message_index)?, content);
            self.persist_active()?;
            return Ok(Delivery::Displayed);
        }
        if !self.config.persist {
            debug!(conversation_id = %id, "Stale regeneration discarded");
            return Ok(Delivery::Discarded);
        }
        let mut changed = false;
        let found = self.history.update(id, |conversation| {
            let message = conversation.message_mut(message_index)?;
            match content {
                Some(_) if !message.is_loading => message.begin_regeneration(),
                None if !message.is_loading => return Ok(()),
                _ => {}
            }
            apply_version(message, content);
            changed = true;
            Ok(())
        })?;
        if !found {
            debug!(conversation_id = %id, "Regenerated conversation no longer stored");
            return Ok(Delivery::Discarded);
        }
        if !changed {
            debug!(conversation_id = %id, "Stale failed regeneration left stored message unchanged");
            return Ok(Delivery::Discarded);
        }
        info!(conversation_id = %id, "Stale regeneration persisted out-of-band");
        Ok(Delivery::Persisted)
    }

    /// Select another version of a message.
    pub fn switch_version(&mut self, message_index: usize, version: usize) -> ChatResult<()> {
        let message = self.active.message_mut(message_index)?;
        if message.is_loading {
            return Err(ChatError::Busy);
        }
        message.switch_version(version)?;
        self.persist_active()
    }

    /// Replace the displayed conversation with a fresh one.
    pub fn new_conversation(&mut self) -> ChatResult<&Conversation> {
        self.active = greeting_conversation(&self.config);
        self.pending = None;
        if self.config.persist {
            self.history.set_active_id(&self.active.id)?;
        }
        Ok(&self.active)
    }

    /// Display a stored conversation.
    pub fn open_conversation(&mut self, id: &ConversationId) -> ChatResult<&Conversation> {
        let conversation = self
            .history
            .get(id)
            .ok_or_else(|| ChatError::UnknownConversation(id.clone()))?;
        self.active = conversation;
        self.pending = None;
        if self.config.persist {
            self.history.set_active_id(id)?;
        }
        Ok(&self.active)
    }

    /// Set or clear a conversation's manual title.
    pub fn rename_conversation(&mut self, id: &ConversationId, title: Option<String>) -> ChatResult<()> {
        if self.active.id == *id {
            self.active.set_manual_title(title);
            return self.persist_active();
        }
        if self.config.persist {
            self.history.rename(id, title)?;
        }
        Ok(())
    }

    /// Delete a stored conversation, starting a new one if it was displayed.
    pub fn delete_conversation(&mut self, id: &ConversationId) -> ChatResult<bool> {
        let existed = self.config.persist && self.history.delete(id)?;
        if self.active.id == *id {
            self.new_conversation()?;
        }
        Ok(existed)
    }

    /// Delete every stored conversation and start a new one.
    pub fn clear_history(&mut self) -> ChatResult<()> {
        if self.config.persist {
            self.history.clear()?;
        }
        self.new_conversation()?;
        Ok(())
    }

    /// Send and wait for the reply.
    pub async fn send(&mut self, client: &ChatClient, text: &str) -> ChatResult<Delivery> {
        let request = self.begin_send(text)?;
        let outcome = request.execute(client).await;
        self.finish(request, outcome)
    }

    /// Regenerate and wait for the new version.
    pub async fn regenerate(&mut self, client: &ChatClient, message_index: usize) -> ChatResult<Delivery> {
        let request = self.begin_regenerate(message_index)?;
        let outcome = request.execute(client).await;
        self.finish(request, outcome)
    }
}

fn greeting_conversation(config: &ChatConfig) -> Conversation {
    Conversation::with_messages(
        ConversationId::new(),
        vec![Message::assistant(config.greeting.clone())],
    )
}

fn apply_version(message: &mut Message, content: Option<String>) {
    match content {
        Some(content) => message.complete_regeneration(content),
        None => message.abort_regeneration(),
    }
}
