//! Conversation history over an opaque key/value store.
//!
//! [`HistoryStore`] keeps every conversation as one JSON list under
//! [`HISTORY_KEY`], most recent first, and the active conversation id under
//! [`ACTIVE_CHAT_KEY`]. The backing store only needs `get` and `set`.

use crate::error::ChatResult;
use ghostchat_core::{Conversation, ConversationId, Message};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Key holding the JSON conversation list.
pub const HISTORY_KEY: &str = "ghostchat_history";

/// Key holding the active conversation id.
pub const ACTIVE_CHAT_KEY: &str = "ghostchat_active_chat_id";

/// Minimal string key/value collaborator.
pub trait KeyValueStore: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value.
    fn set(&self, key: &str, value: String) -> ChatResult<()>;
}

/// In-memory [`KeyValueStore`].
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: String) -> ChatResult<()> {
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }
}

/// Conversation history.
#[derive(Clone)]
pub struct HistoryStore {
    kv: Arc<dyn KeyValueStore>,
}

impl fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryStore").finish_non_exhaustive()
    }
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl HistoryStore {
    /// Wrap a key/value store.
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self { kv }
    }

    /// History backed by a fresh [`MemoryKeyValueStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryKeyValueStore::new()))
    }

    /// All conversations, most recent first.
    ///
    /// Unreadable history is logged and treated as empty.
    pub fn load(&self) -> Vec<Conversation> {
        let Some(raw) = self.kv.get(HISTORY_KEY) else {
            return Vec::new();
        };
        match serde_json::from_str(&raw) {
            Ok(conversations) => conversations,
            Err(e) => {
                warn!(error = %e, "Stored history is corrupt, starting empty");
                Vec::new()
            }
        }
    }

    /// Replace the whole list.
    pub fn save(&self, conversations: &[Conversation]) -> ChatResult<()> {
        let json = serde_json::to_string(conversations)?;
        self.kv.set(HISTORY_KEY, json)
    }

    /// Look up one conversation.
    pub fn get(&self, id: &ConversationId) -> Option<Conversation> {
        self.load().into_iter().find(|c| c.id == *id)
    }

    /// Store a conversation at the front of the list.
    ///
    /// Conversations without a user message are not stored; returns whether
    /// anything was written.
    pub fn upsert(&self, conversation: &Conversation) -> ChatResult<bool> {
        if !conversation.has_user_message() {
            return Ok(false);
        }
        let mut all = self.load();
        all.retain(|c| c.id != conversation.id);
        all.insert(0, conversation.clone());
        self.save(&all)?;
        debug!(conversation_id = %conversation.id, "Conversation saved");
        Ok(true)
    }

    /// Append a message to a stored conversation, creating it if absent, and
    /// move it to the front.
    pub fn append_message(&self, id: &ConversationId, message: Message) -> ChatResult<Conversation> {
        let mut all = self.load();
        let mut conversation = match all.iter().position(|c| c.id == *id) {
            Some(pos) => all.remove(pos),
            None => Conversation::new(id.clone()),
        };
        conversation.push(message);
        all.insert(0, conversation.clone());
        self.save(&all)?;
        Ok(conversation)
    }

    /// Edit a stored conversation in place, keeping its position.
    ///
    /// Returns `false` when no conversation has this id.
    pub fn update<F>(&self, id: &ConversationId, edit: F) -> ChatResult<bool>
    where
        F: FnOnce(&mut Conversation) -> ChatResult<()>,
    {
        let mut all = self.load();
        let Some(conversation) = all.iter_mut().find(|c| c.id == *id) else {
            return Ok(false);
        };
        edit(conversation)?;
        self.save(&all)?;
        Ok(true)
    }

    /// Set or clear the manual title of a stored conversation.
    pub fn rename(&self, id: &ConversationId, title: Option<String>) -> ChatResult<bool> {
        self.update(id, |c| {
            c.set_manual_title(title);
            Ok(())
        })
    }

    /// Remove one conversation. Returns whether it existed.
    pub fn delete(&self, id: &ConversationId) -> ChatResult<bool> {
        let mut all = self.load();
        let before = all.len();
        all.retain(|c| c.id != *id);
        if all.len() == before {
            return Ok(false);
        }
        self.save(&all)?;
        Ok(true)
    }

    /// Remove every conversation.
    pub fn clear(&self) -> ChatResult<()> {
        self.save(&[])
    }

    /// Conversations whose title contains `term`, ignoring case.
    pub fn search(&self, term: &str) -> Vec<Conversation> {
        let needle = term.trim().to_lowercase();
        self.load()
            .into_iter()
            .filter(|c| needle.is_empty() || c.title.to_lowercase().contains(&needle))
            .collect()
    }

    /// Id of the last active conversation.
    pub fn active_id(&self) -> Option<ConversationId> {
        self.kv
            .get(ACTIVE_CHAT_KEY)
            .filter(|id| !id.is_empty())
            .map(ConversationId::from)
    }

    /// Remember the active conversation.
    pub fn set_active_id(&self, id: &ConversationId) -> ChatResult<()> {
        self.kv.set(ACTIVE_CHAT_KEY, id.as_str().to_string())
    }
}
