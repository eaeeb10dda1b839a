//! One-call helpers.
//!
//! Use these for scripts and simple integrations that do not need to keep a
//! [`Renderer`] or a chat session around.
//!
//! ```rust
//! use ghostchat::direct::render_to_html;
//!
//! let html = render_to_html("Use `cargo test`");
//! assert!(html.contains("<code"));
//! ```

use ghostchat_core::Role;
use ghostchat_render::Renderer;

/// Render assistant text to HTML with the default configuration.
pub fn render_to_html(text: &str) -> String {
    Renderer::default().render(text).to_html()
}

/// Render a stored message the way the chat window shows it.
pub fn render_message_html(role: Role, content: &str) -> String {
    Renderer::default().render_message(role, content).to_html()
}

/// Render assistant text and resolve every pending image before returning.
#[cfg(feature = "images")]
#[cfg_attr(docsrs, doc(cfg(feature = "images")))]
pub async fn render_with_images(
    renderer: &Renderer,
    resolver: &ghostchat_images::ImageResolver,
    text: &str,
) -> ghostchat_render::Document {
    let mut doc = renderer.render(text);
    ghostchat_images::ImageBackfill::new()
        .fill(&mut doc, resolver)
        .await;
    doc
}

/// Ask a single question outside of any conversation.
#[cfg(feature = "chat")]
#[cfg_attr(docsrs, doc(cfg(feature = "chat")))]
pub async fn ask(
    config: ghostchat_chat::ChatConfig,
    level: ghostchat_core::ReasoningLevel,
    question: &str,
) -> ghostchat_chat::ChatResult<String> {
    let client = ghostchat_chat::ChatClient::new(config)?;
    let history = [ghostchat_core::Message::user(question)];
    client.reply(question, &history, level).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_to_html_escapes() {
        let html = render_to_html("<script>alert(1)</script>");
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_user_message_stays_plain() {
        let html = render_message_html(Role::User, "`not code`");
        assert!(!html.contains("<code"));
    }
}
