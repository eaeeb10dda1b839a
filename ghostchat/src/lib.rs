//! # ghostchat
//!
//! Building blocks for an AI chat overlay that has to display untrusted model
//! output safely.
//!
//! ## Quick Start
//!
//! ```rust
//! use ghostchat::prelude::*;
//!
//! let renderer = Renderer::default();
//! let doc = renderer.render(r#"Try [tool:link url="javascript:evil()" text="bad"] and `code`"#);
//!
//! assert!(!doc.to_html().contains("javascript"));
//! assert!(doc.to_html().contains("<code"));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|--------|
//! | `images` | Image resolution chain and pending-image back-fill | ✅ |
//! | `chat` | Completion client, history store and session flows | ✅ |
//!
//! ## Architecture
//!
//! - [`ghostchat_core`] - Messages, conversations, reasoning levels
//! - [`ghostchat_retries`] - Rate-limit aware HTTP transport
//! - [`ghostchat_render`] - Sanitizer, tool directives, markup renderer
//! - [`ghostchat_images`] - Encyclopedia-backed image resolution (optional)
//! - [`ghostchat_chat`] - Chat session, router, history (optional)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod direct;

// ============================================================================
// Crate Re-exports
// ============================================================================

/// Messages, conversations and reasoning levels.
pub use ghostchat_core as core;

/// Rate-limit aware HTTP transport.
pub use ghostchat_retries as retries;

/// Safe markup rendering.
pub use ghostchat_render as render;

/// Image resolution chain.
#[cfg(feature = "images")]
#[cfg_attr(docsrs, doc(cfg(feature = "images")))]
pub use ghostchat_images as images;

/// Chat flows.
#[cfg(feature = "chat")]
#[cfg_attr(docsrs, doc(cfg(feature = "chat")))]
pub use ghostchat_chat as chat;

// ============================================================================
// Flat Re-exports
// ============================================================================

pub use ghostchat_core::{Conversation, ConversationId, CoreError, Message, ReasoningLevel, Role};
pub use ghostchat_render::{
    escape_text, sanitize_url, Document, RenderConfig, RenderFragment, Renderer, UrlSanitizer,
};
pub use ghostchat_retries::{NetworkError, RetryClient, RetryPolicy};

#[cfg(feature = "images")]
pub use ghostchat_images::{ImageBackfill, ImageError, ImageResolutionResult, ImageResolver};

#[cfg(feature = "chat")]
pub use ghostchat_chat::{
    ChatClient, ChatConfig, ChatError, ChatSession, Delivery, HistoryStore, KeyValueStore,
};

/// Prelude module for common imports.
pub mod prelude {
    pub use ghostchat_core::prelude::*;
    pub use ghostchat_render::prelude::*;
    pub use ghostchat_retries::prelude::*;

    #[cfg(feature = "images")]
    pub use ghostchat_images::prelude::*;

    #[cfg(feature = "chat")]
    pub use ghostchat_chat::prelude::*;
}
