//! Error types for ghostchat core operations.

use thiserror::Error;

/// Errors raised by message and conversation operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A version index outside the message's version list.
    #[error("Version {index} out of range (message has {len} versions)")]
    VersionOutOfRange {
        /// Requested version.
        index: usize,
        /// Number of versions.
        len: usize,
    },

    /// A message index outside the conversation.
    #[error("Message {index} out of range (conversation has {len} messages)")]
    MessageOutOfRange {
        /// Requested message.
        index: usize,
        /// Number of messages.
        len: usize,
    },

    /// The operation needs an assistant message.
    #[error("Message {0} is not an assistant message")]
    NotAssistant(usize),

    /// No user message precedes the given assistant message.
    #[error("No user message precedes message {0}")]
    NoPrecedingUserMessage(usize),

    /// Unknown reasoning level name.
    #[error("Unknown reasoning level: {0}")]
    UnknownReasoningLevel(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using CoreError.
pub type Result<T> = std::result::Result<T, CoreError>;
