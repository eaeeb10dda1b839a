//! Rendered fragments and documents.
//!
//! A [`Document`] is the ordered list of fragments produced from one message.
//! Fragments own unescaped text; escaping happens once, in [`Document::to_html`].

use crate::sanitize::escape_text;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a pending image, unique per [`Renderer`](crate::Renderer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingImageId(pub u64);

impl fmt::Display for PendingImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "img-{}", self.0)
    }
}

/// An image still waiting for a resolved URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingImage {
    /// Bookkeeping identifier.
    pub id: PendingImageId,
    /// Free-text query to resolve.
    pub query: String,
}

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageSource {
    /// Absolute, sanitized URL.
    Url {
        /// The image URL.
        url: String,
    },
    /// Query to be resolved asynchronously.
    Pending(PendingImage),
}

/// Kind of image tool, shown as the fragment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageKind {
    /// Produced by the image synthesis endpoint.
    Generated,
    /// Looked up on the web.
    Web,
}

impl ImageKind {
    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Generated => "Generated Image",
            Self::Web => "Web Image",
        }
    }
}

/// An image produced by a tool directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolImage {
    /// Resolved URL or pending query.
    pub source: ImageSource,
    /// Alternative text.
    pub alt: String,
    /// Caption under the image.
    pub caption: Option<String>,
    /// Label kind.
    pub kind: ImageKind,
}

impl ToolImage {
    /// The pending query, if the image is not resolved yet.
    pub fn pending(&self) -> Option<&PendingImage> {
        match &self.source {
            ImageSource::Pending(pending) => Some(pending),
            ImageSource::Url { .. } => None,
        }
    }
}

/// Origin of a code block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeOrigin {
    /// Triple-backtick fence.
    Fence,
    /// `[tool:code]` directive.
    Directive,
}

/// A block of code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeBlock {
    /// Language as written, trimmed; `None` when absent.
    pub language: Option<String>,
    /// Body with trailing whitespace removed.
    pub code: String,
    /// Where the block came from.
    pub origin: CodeOrigin,
}

impl CodeBlock {
    /// Build a block from a raw language token and body.
    pub fn new(language: &str, body: &str, origin: CodeOrigin) -> Self {
        let language = language.trim();
        Self {
            language: (!language.is_empty()).then(|| language.to_string()),
            code: body.trim_end().to_string(),
            origin,
        }
    }

    /// Header label, `Plain` when no language was given.
    pub fn label(&self) -> &str {
        self.language.as_deref().unwrap_or("Plain")
    }

    /// Style class suffix: the language lowercased and reduced to `[a-z0-9_-]`.
    pub fn class(&self) -> Option<String> {
        let class: String = self
            .language
            .as_deref()?
            .to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '_' | '-'))
            .collect();
        (!class.is_empty()).then_some(class)
    }
}

/// A piece of a rendered message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderFragment {
    /// Literal text.
    PlainText {
        /// The text.
        text: String,
    },
    /// Backtick-delimited code.
    InlineCode {
        /// The code.
        code: String,
    },
    /// Inline link from markdown syntax or a bare URL.
    Link {
        /// Sanitized target.
        href: String,
        /// Visible text.
        label: String,
    },
    /// Fenced or directive code block.
    CodeBlock(CodeBlock),
    /// Image from `generate_image` or `show_image`.
    ToolImage(ToolImage),
    /// Link from the `link` directive.
    ToolLink {
        /// Sanitized target.
        href: String,
        /// Visible text.
        label: String,
    },
    /// HTML produced by this system's own image generation path.
    TrustedHtml {
        /// The markup.
        html: String,
    },
}

impl RenderFragment {
    /// Plain text fragment.
    pub fn text(text: impl Into<String>) -> Self {
        Self::PlainText { text: text.into() }
    }

    /// Whether this fragment is plain text.
    pub fn is_plain_text(&self) -> bool {
        matches!(self, Self::PlainText { .. })
    }

    /// Append the HTML form of this fragment to `out`.
    pub fn write_html(&self, out: &mut String) {
        match self {
            Self::PlainText { text } => out.push_str(&escape_text(text)),
            Self::InlineCode { code } => {
                out.push_str("<code class=\"gc-inline-code\">");
                out.push_str(&escape_text(code));
                out.push_str("</code>");
            }
            Self::Link { href, label } => {
                out.push_str("<a class=\"gc-inline-link\" href=\"");
                out.push_str(&escape_text(href));
                out.push_str("\" target=\"_blank\" rel=\"noopener noreferrer\">");
                out.push_str(&escape_text(label));
                out.push_str("</a>");
            }
            Self::CodeBlock(block) => write_code_block(block, out),
            Self::ToolImage(image) => write_tool_image(image, out),
            Self::ToolLink { href, label } => {
                out.push_str("<div class=\"gc-tool gc-tool-link\"><a href=\"");
                out.push_str(&escape_text(href));
                out.push_str("\" target=\"_blank\" rel=\"noopener noreferrer\">");
                out.push_str(&escape_text(label));
                out.push_str("</a></div>");
            }
            Self::TrustedHtml { html } => out.push_str(html),
        }
    }
}

fn write_code_block(block: &CodeBlock, out: &mut String) {
    let wrapper = match block.origin {
        CodeOrigin::Fence => "gc-code-block",
        CodeOrigin::Directive => "gc-tool gc-tool-code",
    };
    out.push_str(&format!(
        "<div class=\"{wrapper}\"><div class=\"gc-code-header\"><span>Code</span><span>{}</span></div><pre><code",
        escape_text(block.label())
    ));
    if let Some(class) = block.class() {
        out.push_str(&format!(" class=\"language-{class}\""));
    }
    out.push('>');
    out.push_str(&escape_text(&block.code));
    out.push_str("</code></pre></div>");
}

fn write_tool_image(image: &ToolImage, out: &mut String) {
    let alt = escape_text(&image.alt);
    let caption = image
        .caption
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(escape_text);

    match &image.source {
        ImageSource::Url { url } => {
            out.push_str(&format!(
                "<div class=\"gc-tool gc-tool-image\"><div class=\"gc-tool-label\">{}</div><img src=\"{}\" alt=\"{alt}\" loading=\"lazy\">",
                image.kind.label(),
                escape_text(url)
            ));
            if let Some(caption) = caption {
                out.push_str(&format!("<div class=\"gc-tool-caption\">{caption}</div>"));
            }
        }
        ImageSource::Pending(pending) => {
            out.push_str(&format!(
                "<div class=\"gc-tool gc-tool-image\" data-gc-image-id=\"{}\" data-gc-image-query=\"{}\" data-gc-image-alt=\"{alt}\"><div class=\"gc-tool-label\">{}</div><img alt=\"{alt}\" loading=\"lazy\">",
                pending.id,
                escape_text(&pending.query),
                image.kind.label()
            ));
            match caption {
                Some(caption) => out.push_str(&format!(
                    "<div class=\"gc-tool-caption\" data-gc-image-caption>{caption}</div>"
                )),
                None => out.push_str(
                    "<div class=\"gc-tool-caption\" data-gc-image-caption style=\"display:none\"></div>",
                ),
            }
        }
    }
    out.push_str("</div>");
}

/// A rendered message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    fragments: Vec<RenderFragment>,
    rich: bool,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Document made of a single literal text.
    pub fn plain(text: impl Into<String>) -> Self {
        let mut doc = Self::new();
        doc.push_text(&text.into());
        doc
    }

    /// Document wrapping trusted, pre-rendered HTML.
    pub fn trusted(html: impl Into<String>) -> Self {
        let mut doc = Self::new();
        doc.push(RenderFragment::TrustedHtml { html: html.into() });
        doc
    }

    /// Append literal text, merging with a preceding text fragment.
    pub fn push_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if let Some(RenderFragment::PlainText { text: last }) = self.fragments.last_mut() {
            last.push_str(text);
        } else {
            self.fragments.push(RenderFragment::text(text));
        }
    }

    /// Append a fragment. Anything but plain text marks the document rich.
    pub fn push(&mut self, fragment: RenderFragment) {
        if let RenderFragment::PlainText { text } = &fragment {
            self.push_text(text);
            return;
        }
        self.rich = true;
        self.fragments.push(fragment);
    }

    /// Fragments in source order.
    pub fn fragments(&self) -> &[RenderFragment] {
        &self.fragments
    }

    /// Whether any fragment besides plain text was produced.
    pub fn contains_rich_markup(&self) -> bool {
        self.rich
    }

    /// Render to HTML.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            fragment.write_html(&mut out);
        }
        out
    }

    /// Images still waiting for resolution.
    pub fn pending_images(&self) -> impl Iterator<Item = &PendingImage> {
        self.images().filter_map(ToolImage::pending)
    }

    fn images(&self) -> impl Iterator<Item = &ToolImage> {
        self.fragments.iter().filter_map(|fragment| match fragment {
            RenderFragment::ToolImage(image) => Some(image),
            _ => None,
        })
    }

    /// The pending image with this id.
    pub fn pending_image(&self, id: PendingImageId) -> Option<&ToolImage> {
        self.images()
            .find(|image| image.pending().is_some_and(|pending| pending.id == id))
    }

    fn pending_mut(&mut self, id: PendingImageId) -> Option<&mut ToolImage> {
        self.fragments.iter_mut().find_map(|fragment| match fragment {
            RenderFragment::ToolImage(image)
                if image.pending().is_some_and(|pending| pending.id == id) =>
            {
                Some(image)
            }
            _ => None,
        })
    }

    /// Fill a pending image with its resolved URL and caption.
    ///
    /// Returns `false` if no pending image has this id.
    pub fn resolve_image(&mut self, id: PendingImageId, url: &str, caption: &str) -> bool {
        let Some(image) = self.pending_mut(id) else {
            return false;
        };
        image.source = ImageSource::Url {
            url: url.to_string(),
        };
        image.caption = Some(caption.to_string());
        true
    }

    /// Mark a pending image as unresolvable: its alt text becomes the caption.
    pub fn fail_image(&mut self, id: PendingImageId) -> bool {
        let Some(image) = self.pending_mut(id) else {
            return false;
        };
        image.caption = Some(image.alt.clone());
        true
    }
}
