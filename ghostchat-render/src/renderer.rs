//! The markup renderer.

use crate::config::RenderConfig;
use crate::directive::{DirectiveInterpreter, Interpretation};
use crate::fragment::Document;
use crate::scanner::{render_chunk, split_directives, Segment};
use ghostchat_core::{Role, IMAGE_EMBED_MARKER};

/// Turns chat text into [`Document`]s.
///
/// Pending image ids are unique for the lifetime of a renderer, so one
/// renderer should be shared by everything that back-fills images.
#[derive(Debug)]
pub struct Renderer {
    interpreter: DirectiveInterpreter,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(RenderConfig::default())
    }
}

impl Renderer {
    /// Create a renderer.
    pub fn new(config: RenderConfig) -> Self {
        Self {
            interpreter: DirectiveInterpreter::new(config),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &RenderConfig {
        self.interpreter.config()
    }

    /// Render assistant text.
    pub fn render(&self, text: &str) -> Document {
        let sanitizer = self.interpreter.sanitizer();
        let mut doc = Document::new();

        for segment in split_directives(text) {
            match segment {
                Segment::Chunk(chunk) => render_chunk(chunk, sanitizer, &mut doc),
                Segment::Directive(directive) => match self.interpreter.interpret(&directive) {
                    Interpretation::Fragment(fragment) => doc.push(fragment),
                    Interpretation::Drop => {}
                    Interpretation::Literal => doc.push_text(directive.source),
                },
            }
        }

        doc
    }

    /// Render text and return the HTML with the rich-markup flag.
    pub fn render_html(&self, text: &str) -> (String, bool) {
        let doc = self.render(text);
        (doc.to_html(), doc.contains_rich_markup())
    }

    /// Render a chat message according to its author.
    ///
    /// User text is always literal. Assistant content starting with the image
    /// embed marker is HTML produced by the image generation path and is kept
    /// as is; any other assistant content goes through [`Renderer::render`].
    pub fn render_message(&self, role: Role, content: &str) -> Document {
        match role {
            Role::Assistant if content.starts_with(IMAGE_EMBED_MARKER) => {
                Document::trusted(content)
            }
            Role::Assistant => self.render(content),
            Role::User | Role::System => Document::plain(content),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{CodeBlock, CodeOrigin, RenderFragment};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_plain_text_is_not_rich() {
        let renderer = Renderer::default();
        let (html, rich) = renderer.render_html("1 < 2 & \"ok\"");
        assert_eq!(html, "1 &lt; 2 &amp; &quot;ok&quot;");
        assert!(!rich);
    }

    #[test]
    fn test_check_link_and_inline_code() {
        let renderer = Renderer::default();
        let doc = renderer.render(r#"Check [tool:link url="javascript:evil()" text="bad"] and `code`"#);

        assert_eq!(
            doc.fragments(),
            &[
                RenderFragment::text("Check  and "),
                RenderFragment::InlineCode {
                    code: "code".to_string()
                },
            ]
        );
        let html = doc.to_html();
        assert_eq!(html, "Check  and <code class=\"gc-inline-code\">code</code>");
        assert!(!html.contains("<a"));
        assert!(!html.contains("[tool"));
    }

    #[test]
    fn test_unknown_directive_shows_escaped_source() {
        let renderer = Renderer::default();
        let doc = renderer.render(r#"Hi [tool:weather city="<Paris>"]"#);
        assert_eq!(
            doc.to_html(),
            "Hi [tool:weather city=&quot;&lt;Paris&gt;&quot;]"
        );
        assert!(!doc.contains_rich_markup());
    }

    #[test]
    fn test_directive_takes_precedence_over_inline_code() {
        let renderer = Renderer::default();
        let doc = renderer.render("`a [tool:link url=\"https://x.org\"] b`");
        assert_eq!(
            doc.fragments(),
            &[
                RenderFragment::text("`a "),
                RenderFragment::ToolLink {
                    href: "https://x.org/".to_string(),
                    label: "https://x.org/".to_string(),
                },
                RenderFragment::text(" b`"),
            ]
        );
    }

    #[test]
    fn test_mixed_message() {
        let renderer = Renderer::default();
        let text = "Voici :\n```rust\nfn main() {}\n```\n[tool:code lang=\"sh\"]ls -la\n[/tool:code]\nVoir https://doc.rust-lang.org.";
        let doc = renderer.render(text);

        let blocks: Vec<&CodeBlock> = doc
            .fragments()
            .iter()
            .filter_map(|f| match f {
                RenderFragment::CodeBlock(block) => Some(block),
                _ => None,
            })
            .collect();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].origin, CodeOrigin::Fence);
        assert_eq!(blocks[0].label(), "rust");
        assert_eq!(blocks[1].origin, CodeOrigin::Directive);
        assert_eq!(blocks[1].code, "ls -la");

        let html = doc.to_html();
        assert!(html.contains("<div class=\"gc-tool gc-tool-code\">"));
        assert!(html.ends_with(
            "Voir <a class=\"gc-inline-link\" href=\"https://doc.rust-lang.org/\" target=\"_blank\" rel=\"noopener noreferrer\">https://doc.rust-lang.org</a>."
        ));
    }

    #[test]
    fn test_render_message_roles() {
        let renderer = Renderer::default();

        let user = renderer.render_message(Role::User, "`not code` [tool:link url=\"https://x.org\"]");
        assert!(!user.contains_rich_markup());
        assert_eq!(user.fragments().len(), 1);

        let embed = "<img src=\"https://image.pollinations.ai/prompt/cat\" alt=\"cat\">";
        let trusted = renderer.render_message(Role::Assistant, embed);
        assert_eq!(trusted.to_html(), embed);

        let assistant = renderer.render_message(Role::Assistant, "`x`");
        assert!(assistant.contains_rich_markup());
    }

    #[test]
    fn test_pending_images_are_listed() {
        let renderer = Renderer::default();
        let doc = renderer.render(
            r#"[tool:show_image query="giraffe"] et [tool:show_image url="https://en.wikipedia.org/wiki/Zebra"]"#,
        );
        let queries: Vec<_> = doc.pending_images().map(|p| p.query.as_str()).collect();
        assert_eq!(queries, vec!["giraffe", "Zebra"]);
    }
}
