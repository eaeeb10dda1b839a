//! # ghostchat-render
//!
//! Safe rendering of AI-generated chat text.
//!
//! Assistant replies may embed tool directives next to ordinary markdown-ish
//! text. The renderer scans them in a fixed precedence order:
//!
//! 1. Tool directives: `[tool:name key="value"]` and
//!    `[tool:code lang="x"]...[/tool:code]`
//! 2. Fenced code blocks
//! 3. Inline code
//! 4. Markdown links, then bare URLs
//!
//! Every scan is a single linear pass. Every URL goes through a
//! [`UrlSanitizer`] that only keeps `http` and `https`. Every text span is
//! escaped when the [`Document`] is turned into HTML.
//!
//! ## Example
//!
//! ```rust
//! use ghostchat_render::Renderer;
//!
//! let renderer = Renderer::default();
//! let doc = renderer.render(r#"Voir [tool:link url="https://www.rust-lang.org" text="Rust"] et `cargo`"#);
//!
//! assert!(doc.contains_rich_markup());
//! assert!(doc.to_html().contains(r#"href="https://www.rust-lang.org/""#));
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod article;
pub mod attributes;
pub mod config;
pub mod directive;
pub mod fragment;
pub mod renderer;
pub mod sanitize;
pub mod scanner;

pub use article::{article_title_from_url, extract_first_url, normalize_image_query, normalize_title};
pub use attributes::{parse_attributes, Attributes};
pub use config::RenderConfig;
pub use directive::{DirectiveInterpreter, Interpretation};
pub use fragment::{
    CodeBlock, CodeOrigin, Document, ImageKind, ImageSource, PendingImage, PendingImageId,
    RenderFragment, ToolImage,
};
pub use renderer::Renderer;
pub use sanitize::{escape_text, sanitize_url, UrlSanitizer};
pub use scanner::{split_directives, Segment, ToolDirective};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        escape_text, normalize_image_query, parse_attributes, sanitize_url, Document,
        PendingImageId, RenderConfig, RenderFragment, Renderer, UrlSanitizer,
    };
}
