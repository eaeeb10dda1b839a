//! # ghostchat-chat
//!
//! Chat flows for ghostchat: the completion and router client, assistant text
//! cleanup, the auto-image heuristic, conversation history and the session
//! state machine that ties them together.
//!
//! Every reply is stamped with the conversation that was active when it was
//! requested. When it arrives after the user switched away it is written to
//! that conversation's stored history and never touches the displayed one.
//!
//! ## Example
//!
//! ```rust
//! use ghostchat_chat::{ChatConfig, ChatSession, Delivery};
//!
//! let mut session = ChatSession::in_memory(ChatConfig::default());
//! let request = session.begin_send("What is a tapir?").unwrap();
//!
//! // The user opens a new conversation before the reply arrives.
//! session.new_conversation().unwrap();
//!
//! let delivery = session
//!     .finish(request, Ok("A tapir is a large herbivore.".to_string()))
//!     .unwrap();
//! assert_eq!(delivery, Delivery::Persisted);
//! assert_eq!(session.active().messages.len(), 1);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod cleanup;
pub mod completion;
pub mod config;
pub mod error;
pub mod prompts;
pub mod session;
pub mod store;
pub mod trigger;

pub use cleanup::TextCleaner;
pub use completion::{image_embed_html, ChatClient, CompletionRequest, WireMessage, EMPTY_COMPLETION};
pub use config::{ChatConfig, ResponseStyle};
pub use error::{ChatError, ChatResult};
pub use session::{
    ChatSession, Delivery, ReplyKind, ReplyRequest, ReplyTarget, IMAGE_ERROR_MESSAGE,
    SEND_ERROR_MESSAGE,
};
pub use store::{HistoryStore, KeyValueStore, MemoryKeyValueStore};
pub use trigger::{escape_tool_attr_value, AutoImageTrigger, TriggerPhrases};

/// Prelude module for common imports.
pub mod prelude {
    pub use crate::{
        AutoImageTrigger, ChatClient, ChatConfig, ChatError, ChatResult, ChatSession, Delivery,
        HistoryStore, KeyValueStore, ReplyRequest,
    };
}
