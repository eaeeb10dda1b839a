//! # ghostchat-core
//!
//! Core types, messages, and error handling for the ghostchat workspace.
//!
//! This crate provides the foundational types shared by the renderer, the image
//! resolution chain and the chat session:
//!
//! - **Messages**: chat messages with regeneration versions
//! - **Conversations**: ordered message lists with titles and timestamps
//! - **Settings**: reasoning levels and their upstream effort mapping
//! - **Identifiers**: type-safe conversation IDs
//! - **Errors**: failures of message and conversation operations
//!
//! ## Example
//!
//! ```rust
//! use ghostchat_core::{Message, ReasoningLevel};
//!
//! let mut reply = Message::assistant("Bonjour !");
//! reply.begin_regeneration();
//! reply.complete_regeneration("Salut !");
//! assert_eq!(reply.versions.len(), 2);
//!
//! assert_eq!(ReasoningLevel::Ultra.effort(), "high");
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod errors;
pub mod identifier;
pub mod messages;
pub mod settings;

// Re-exports for convenience
pub use errors::{CoreError, Result};
pub use identifier::{now_utc, ConversationId};
pub use messages::{Conversation, Message, Role, IMAGE_EMBED_MARKER};
pub use settings::{ReasoningLevel, RouterLevel};

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::errors::{CoreError, Result};
    pub use crate::identifier::{generate_conversation_id, now_utc, ConversationId};
    pub use crate::messages::{Conversation, Message, Role};
    pub use crate::settings::{ReasoningLevel, RouterLevel};
}
