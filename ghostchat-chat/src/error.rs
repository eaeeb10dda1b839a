//! Chat errors.

use ghostchat_core::{ConversationId, CoreError};
use ghostchat_retries::NetworkError;
use thiserror::Error;

/// Errors from chat flows, the completion client and the history store.
#[derive(Debug, Error)]
pub enum ChatError {
    /// Transport failure after the retry budget.
    #[error(transparent)]
    Network(#[from] NetworkError),

    /// Message or conversation operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The key/value collaborator refused a write.
    #[error("Store error: {0}")]
    Store(String),

    /// History could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A trigger phrase did not compile.
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// A reply is already in flight.
    #[error("A reply is already being generated")]
    Busy,

    /// Nothing to send.
    #[error("Message is empty")]
    EmptyMessage,

    /// The message cannot be used for this operation.
    #[error("Invalid message index {0}")]
    InvalidIndex(usize),

    /// No stored conversation has this id.
    #[error("Unknown conversation: {0}")]
    UnknownConversation(ConversationId),
}

impl ChatError {
    /// Create a store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }
}

/// Result type for chat operations.
pub type ChatResult<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_error_is_transparent() {
        let err: ChatError = NetworkError::http(503, "down").into();
        assert_eq!(err.to_string(), NetworkError::http(503, "down").to_string());
    }

    #[test]
    fn test_store_error_message() {
        assert_eq!(ChatError::store("quota").to_string(), "Store error: quota");
    }
}
