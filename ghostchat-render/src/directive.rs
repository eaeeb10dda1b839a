//! Interpretation of tool directives.

use crate::article::{article_title_from_url, normalize_image_query};
use crate::config::RenderConfig;
use crate::fragment::{
    CodeBlock, CodeOrigin, ImageKind, ImageSource, PendingImage, PendingImageId, RenderFragment,
    ToolImage,
};
use crate::sanitize::UrlSanitizer;
use crate::scanner::ToolDirective;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

const DEFAULT_WEB_ALT: &str = "Web image";

/// What a directive turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interpretation {
    /// A rendered fragment.
    Fragment(RenderFragment),
    /// Nothing: the directive referenced a rejected URL.
    Drop,
    /// The directive source, shown as literal text.
    Literal,
}

/// Maps directives to fragments.
#[derive(Debug)]
pub struct DirectiveInterpreter {
    config: RenderConfig,
    sanitizer: UrlSanitizer,
    next_pending_id: AtomicU64,
}

impl DirectiveInterpreter {
    /// Create an interpreter.
    pub fn new(config: RenderConfig) -> Self {
        let sanitizer = UrlSanitizer::new(&config.base_url);
        Self {
            config,
            sanitizer,
            next_pending_id: AtomicU64::new(1),
        }
    }

    /// The URL sanitizer in use.
    pub fn sanitizer(&self) -> &UrlSanitizer {
        &self.sanitizer
    }

    /// Configuration in use.
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Interpret one directive.
    pub fn interpret(&self, directive: &ToolDirective<'_>) -> Interpretation {
        let outcome = match directive.name.as_str() {
            "generate_image" => self.generate_image(directive),
            "show_image" => self.show_image(directive),
            "link" => self.link(directive),
            "code" => Self::code(directive),
            _ => Interpretation::Literal,
        };

        if !matches!(outcome, Interpretation::Fragment(_)) {
            debug!(name = %directive.name, ?outcome, "Directive not rendered");
        }
        outcome
    }

    fn pending(&self, query: String, alt: Option<&str>) -> Interpretation {
        let id = PendingImageId(self.next_pending_id.fetch_add(1, Ordering::Relaxed));
        let alt = alt.map_or_else(|| query.clone(), str::to_string);
        Interpretation::Fragment(RenderFragment::ToolImage(ToolImage {
            source: ImageSource::Pending(PendingImage { id, query }),
            alt,
            caption: None,
            kind: ImageKind::Web,
        }))
    }

    fn generate_image(&self, directive: &ToolDirective<'_>) -> Interpretation {
        let Some(prompt) = directive.attributes.first_of(&["prompt", "text"]) else {
            return Interpretation::Literal;
        };

        Interpretation::Fragment(RenderFragment::ToolImage(ToolImage {
            source: ImageSource::Url {
                url: self.config.synthesis_url(prompt),
            },
            alt: prompt.to_string(),
            caption: Some(prompt.to_string()),
            kind: ImageKind::Generated,
        }))
    }

    fn show_image(&self, directive: &ToolDirective<'_>) -> Interpretation {
        let attrs = &directive.attributes;
        let alt = attrs.first_of(&["alt"]);

        let raw_query = attrs.first_of(&["query", "search", "text"]).unwrap_or_default();
        let query = normalize_image_query(raw_query);
        if !query.is_empty() {
            return self.pending(query, alt);
        }

        let Some(raw_url) = attrs.first_of(&["url"]) else {
            return Interpretation::Literal;
        };
        if let Some(title) = article_title_from_url(raw_url) {
            return self.pending(title, alt);
        }

        let Some(url) = self.sanitizer.sanitize(raw_url) else {
            return Interpretation::Drop;
        };
        let alt = alt.unwrap_or(DEFAULT_WEB_ALT).to_string();
        Interpretation::Fragment(RenderFragment::ToolImage(ToolImage {
            source: ImageSource::Url { url },
            caption: Some(alt.clone()),
            alt,
            kind: ImageKind::Web,
        }))
    }

    fn link(&self, directive: &ToolDirective<'_>) -> Interpretation {
        let Some(raw_url) = directive.attributes.first_of(&["url"]) else {
            return Interpretation::Literal;
        };
        let Some(href) = self.sanitizer.sanitize(raw_url) else {
            return Interpretation::Drop;
        };
        let label = directive
            .attributes
            .first_of(&["text"])
            .map_or_else(|| href.clone(), str::to_string);

        Interpretation::Fragment(RenderFragment::ToolLink { href, label })
    }

    fn code(directive: &ToolDirective<'_>) -> Interpretation {
        let Some(body) = directive.body else {
            return Interpretation::Literal;
        };
        let language = directive
            .attributes
            .first_of(&["lang", "language"])
            .unwrap_or_default();

        Interpretation::Fragment(RenderFragment::CodeBlock(CodeBlock::new(
            language,
            body,
            CodeOrigin::Directive,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{split_directives, Segment};
    use pretty_assertions::assert_eq;

    fn interpret(source: &str) -> Interpretation {
        let interpreter = DirectiveInterpreter::new(RenderConfig::default());
        let segments = split_directives(source);
        match segments.as_slice() {
            [Segment::Directive(directive)] => interpreter.interpret(directive),
            other => panic!("expected one directive, got {other:?}"),
        }
    }

    fn image(outcome: Interpretation) -> ToolImage {
        match outcome {
            Interpretation::Fragment(RenderFragment::ToolImage(image)) => image,
            other => panic!("expected image, got {other:?}"),
        }
    }

    #[test]
    fn test_generate_image() {
        let image = image(interpret(r#"[tool:generate_image prompt="un chat roux"]"#));
        assert_eq!(
            image.source,
            ImageSource::Url {
                url: "https://image.pollinations.ai/prompt/un%20chat%20roux?nologo=true".to_string()
            }
        );
        assert_eq!(image.caption.as_deref(), Some("un chat roux"));
        assert_eq!(image.kind, ImageKind::Generated);
    }

    #[test]
    fn test_generate_image_text_fallback_and_missing_prompt() {
        let image = image(interpret(r#"[tool:generate_image text="sunset"]"#));
        assert_eq!(image.alt, "sunset");
        assert_eq!(interpret(r#"[tool:generate_image prompt=""]"#), Interpretation::Literal);
    }

    #[test]
    fn test_show_image_query_is_pending() {
        let image = image(interpret(r#"[tool:show_image query=" giraffe " alt="Une girafe"]"#));
        let pending = image.pending().cloned().unwrap();
        assert_eq!(pending.query, "giraffe");
        assert_eq!(image.alt, "Une girafe");
        assert_eq!(image.caption, None);
    }

    #[test]
    fn test_show_image_article_url_becomes_query() {
        let image = image(interpret(
            r#"[tool:show_image url="https://fr.wikipedia.org/wiki/Tour_Eiffel"]"#,
        ));
        assert_eq!(image.pending().unwrap().query, "Tour Eiffel");
        assert_eq!(image.alt, "Tour Eiffel");
    }

    #[test]
    fn test_show_image_direct_url() {
        let image = image(interpret(r#"[tool:show_image url="https://cdn.test/cat.png"]"#));
        assert_eq!(
            image.source,
            ImageSource::Url {
                url: "https://cdn.test/cat.png".to_string()
            }
        );
        assert_eq!(image.alt, "Web image");
        assert_eq!(image.caption.as_deref(), Some("Web image"));
    }

    #[test]
    fn test_show_image_rejected_url_is_dropped() {
        assert_eq!(
            interpret(r#"[tool:show_image url="javascript:alert(1)"]"#),
            Interpretation::Drop
        );
        assert_eq!(interpret("[tool:show_image]"), Interpretation::Literal);
    }

    #[test]
    fn test_link() {
        assert_eq!(
            interpret(r#"[tool:link url="https://rust-lang.org" text="Rust"]"#),
            Interpretation::Fragment(RenderFragment::ToolLink {
                href: "https://rust-lang.org/".to_string(),
                label: "Rust".to_string(),
            })
        );
        assert_eq!(
            interpret(r#"[tool:link url="https://rust-lang.org"]"#),
            Interpretation::Fragment(RenderFragment::ToolLink {
                href: "https://rust-lang.org/".to_string(),
                label: "https://rust-lang.org/".to_string(),
            })
        );
        assert_eq!(interpret(r#"[tool:link url="javascript:evil()"]"#), Interpretation::Drop);
        assert_eq!(interpret(r#"[tool:link text="nowhere"]"#), Interpretation::Literal);
    }

    #[test]
    fn test_code_directive() {
        let outcome = interpret("[tool:code language=\"Python\"]print(1)\n\n[/tool:code]");
        assert_eq!(
            outcome,
            Interpretation::Fragment(RenderFragment::CodeBlock(CodeBlock {
                language: Some("Python".to_string()),
                code: "print(1)".to_string(),
                origin: CodeOrigin::Directive,
            }))
        );
        assert_eq!(interpret("[tool:code]"), Interpretation::Literal);
    }

    #[test]
    fn test_unknown_directive_is_literal() {
        assert_eq!(interpret(r#"[tool:weather city="Paris"]"#), Interpretation::Literal);
    }

    #[test]
    fn test_pending_ids_are_unique() {
        let interpreter = DirectiveInterpreter::new(RenderConfig::default());
        let segments = split_directives(r#"[tool:show_image query="a"][tool:show_image query="b"]"#);
        let ids: Vec<_> = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Directive(d) => Some(image(interpreter.interpret(d)).pending().unwrap().id),
                Segment::Chunk(_) => None,
            })
            .collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }
}
