//! Layered, linear-time scanning of assistant text.
//!
//! Layers in precedence order: tool directives, code fences, inline code,
//! markdown links, bare URLs. Each layer hands the text it does not claim to
//! the next one. Searches for closing delimiters are cached so that no byte
//! is rescanned when an opening delimiter fails to match.

use crate::attributes::{parse_attributes, Attributes};
use crate::fragment::{CodeBlock, CodeOrigin, Document, RenderFragment};
use crate::sanitize::UrlSanitizer;
use tracing::debug;

const TOOL_OPEN: &str = "[tool:";
const CODE_OPEN: &str = "[tool:code";
const CODE_CLOSE: &str = "[/tool:code]";
const FENCE: &str = "```";
const URL_TRAILING: &[char] = &[')', '.', ',', ';', ':', '!', '?', ']'];

/// A `[tool:...]` directive as found in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolDirective<'a> {
    /// Lowercased directive name.
    pub name: String,
    /// Parsed attributes.
    pub attributes: Attributes,
    /// Body of the block form, `None` for the single-tag form.
    pub body: Option<&'a str>,
    /// The full source span.
    pub source: &'a str,
}

/// Output of the directive layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Text outside any directive.
    Chunk(&'a str),
    /// A directive.
    Directive(ToolDirective<'a>),
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Position of the next occurrence of `needle` at or after `from`, cached.
///
/// Callers only ever ask for increasing `from`, so a cached position is
/// reused until the scan moves past it.
struct NextMatch<'a> {
    haystack: &'a str,
    needle: &'a str,
    cached: Option<Option<usize>>,
}

impl<'a> NextMatch<'a> {
    fn new(haystack: &'a str, needle: &'a str) -> Self {
        Self {
            haystack,
            needle,
            cached: None,
        }
    }

    fn at_or_after(&mut self, from: usize) -> Option<usize> {
        match self.cached {
            Some(Some(pos)) if pos >= from => return Some(pos),
            Some(None) => return None,
            _ => {}
        }
        let found = self
            .haystack
            .get(from..)
            .and_then(|rest| rest.find(self.needle))
            .map(|i| from + i);
        self.cached = Some(found);
        found
    }
}

/// Position of the next link target stop (whitespace or `)`), cached.
///
/// Same forward-only contract as [`NextMatch`].
struct NextTargetStop<'a> {
    haystack: &'a str,
    cached: Option<Option<usize>>,
}

impl<'a> NextTargetStop<'a> {
    fn new(haystack: &'a str) -> Self {
        Self {
            haystack,
            cached: None,
        }
    }

    fn at_or_after(&mut self, from: usize) -> Option<usize> {
        match self.cached {
            Some(Some(pos)) if pos >= from => return Some(pos),
            Some(None) => return None,
            _ => {}
        }
        let found = self
            .haystack
            .get(from..)
            .and_then(|rest| rest.find(|c: char| c.is_whitespace() || c == ')'))
            .map(|i| from + i);
        self.cached = Some(found);
        found
    }
}

/// Split text into chunks and tool directives.
///
/// Directive names are matched case-insensitively. The block form
/// `[tool:code attrs]body[/tool:code]` is tried before the single-tag form
/// `[tool:name attrs]`; a `[tool:code]` without closing tag is a single tag
/// with no body.
pub fn split_directives(text: &str) -> Vec<Segment<'_>> {
    let lower = text.to_ascii_lowercase();
    let bytes = text.as_bytes();
    let mut next_bracket = NextMatch::new(text, "]");
    let mut next_close = NextMatch::new(&lower, CODE_CLOSE);

    let mut segments = Vec::new();
    let mut last = 0;
    let mut from = 0;

    while let Some(offset) = lower[from..].find(TOOL_OPEN) {
        let start = from + offset;
        from = start + 1;

        let Some(tag_end) = next_bracket.at_or_after(start) else {
            // No `]` left: nothing after this point can be a directive.
            break;
        };

        let directive = block_directive(text, &lower, start, tag_end, &mut next_close)
            .or_else(|| single_directive(text, bytes, start, tag_end));

        if let Some(directive) = directive {
            if start > last {
                segments.push(Segment::Chunk(&text[last..start]));
            }
            last = start + directive.source.len();
            from = last;
            segments.push(Segment::Directive(directive));
        }
    }

    if last < text.len() {
        segments.push(Segment::Chunk(&text[last..]));
    }
    segments
}

fn block_directive<'a>(
    text: &'a str,
    lower: &str,
    start: usize,
    tag_end: usize,
    next_close: &mut NextMatch<'_>,
) -> Option<ToolDirective<'a>> {
    if !lower[start..].starts_with(CODE_OPEN) {
        return None;
    }
    let name_end = start + CODE_OPEN.len();
    if lower.as_bytes().get(name_end).copied().is_some_and(is_word_byte) {
        return None;
    }

    let body_start = tag_end + 1;
    let close = next_close.at_or_after(body_start)?;
    let end = close + CODE_CLOSE.len();

    Some(ToolDirective {
        name: "code".to_string(),
        attributes: parse_attributes(&text[name_end..tag_end]),
        body: Some(&text[body_start..close]),
        source: &text[start..end],
    })
}

fn single_directive<'a>(
    text: &'a str,
    bytes: &[u8],
    start: usize,
    tag_end: usize,
) -> Option<ToolDirective<'a>> {
    let name_start = start + TOOL_OPEN.len();
    let mut name_end = name_start;
    while name_end < tag_end && is_word_byte(bytes[name_end]) {
        name_end += 1;
    }
    if name_end == name_start {
        return None;
    }

    Some(ToolDirective {
        name: text[name_start..name_end].to_ascii_lowercase(),
        attributes: parse_attributes(&text[name_end..tag_end]),
        body: None,
        source: &text[start..=tag_end],
    })
}

/// Render a chunk that lies outside any directive.
pub fn render_chunk(text: &str, sanitizer: &UrlSanitizer, doc: &mut Document) {
    render_fences(text, sanitizer, doc);
}

/// Fences: three backticks, an optional `[A-Za-z0-9_-]+` language, a newline,
/// then the body up to the next three backticks.
fn render_fences(text: &str, sanitizer: &UrlSanitizer, doc: &mut Document) {
    let bytes = text.as_bytes();
    let mut next_fence = NextMatch::new(text, FENCE);
    let mut last = 0;
    let mut from = 0;

    while let Some(start) = next_fence.at_or_after(from) {
        from = start + 1;

        let lang_start = start + FENCE.len();
        let mut lang_end = lang_start;
        while lang_end < bytes.len() && (is_word_byte(bytes[lang_end]) || bytes[lang_end] == b'-') {
            lang_end += 1;
        }
        if bytes.get(lang_end) != Some(&b'\n') {
            continue;
        }

        let body_start = lang_end + 1;
        let Some(close) = text[body_start..].find(FENCE).map(|i| body_start + i) else {
            // No closing fence after this body: no later fence can close either.
            break;
        };

        render_inline_code(&text[last..start], sanitizer, doc);
        doc.push(RenderFragment::CodeBlock(CodeBlock::new(
            &text[lang_start..lang_end],
            &text[body_start..close],
            CodeOrigin::Fence,
        )));
        last = close + FENCE.len();
        from = last;
    }

    render_inline_code(&text[last..], sanitizer, doc);
}

/// Inline code: a backtick, one or more non-backtick characters, a backtick.
fn render_inline_code(text: &str, sanitizer: &UrlSanitizer, doc: &mut Document) {
    let mut last = 0;
    let mut from = 0;

    while let Some(offset) = text[from..].find('`') {
        let start = from + offset;
        let Some(len) = text[start + 1..].find('`') else {
            break;
        };
        let close = start + 1 + len;
        if len == 0 {
            from = close;
            continue;
        }

        render_markdown_links(&text[last..start], sanitizer, doc);
        doc.push(RenderFragment::InlineCode {
            code: text[start + 1..close].to_string(),
        });
        last = close + 1;
        from = last;
    }

    render_markdown_links(&text[last..], sanitizer, doc);
}

/// Length of an `http://` or `https://` prefix at the start of `text`.
fn http_scheme_len(text: &str) -> Option<usize> {
    if text.starts_with("https://") {
        Some(8)
    } else if text.starts_with("http://") {
        Some(7)
    } else {
        None
    }
}

/// End of a `(http(s)://target)` suffix starting right after `label_end`.
///
/// Returns the index of the closing `)`.
fn link_target_end(
    text: &str,
    label_end: usize,
    stops: &mut NextTargetStop<'_>,
) -> Option<usize> {
    let target_start = label_end + 2;
    if text.get(label_end + 1..target_start) != Some("(") {
        return None;
    }
    let body_start = target_start + http_scheme_len(&text[target_start..])?;
    let stop = stops.at_or_after(body_start).unwrap_or(text.len());
    if stop == body_start || !text[stop..].starts_with(')') {
        return None;
    }
    Some(stop)
}

/// Markdown links: `[label](http(s)://target)`.
fn render_markdown_links(text: &str, sanitizer: &UrlSanitizer, doc: &mut Document) {
    let mut next_bracket = NextMatch::new(text, "]");
    let mut next_stop = NextTargetStop::new(text);
    // Openers sharing a closing `]` share the same target outcome.
    let mut target_cache: Option<(usize, Option<usize>)> = None;
    let mut last = 0;
    let mut from = 0;

    while let Some(offset) = text[from..].find('[') {
        let start = from + offset;
        from = start + 1;

        let Some(label_end) = next_bracket.at_or_after(start + 1) else {
            break;
        };
        if label_end == start + 1 {
            continue;
        }

        let target_end = match target_cache {
            Some((at, cached)) if at == label_end => cached,
            _ => {
                let found = link_target_end(text, label_end, &mut next_stop);
                target_cache = Some((label_end, found));
                found
            }
        };
        let Some(target_end) = target_end else {
            continue;
        };
        let end = target_end + 1;

        render_bare_urls(&text[last..start], sanitizer, doc);
        let label = &text[start + 1..label_end];
        match sanitizer.sanitize(&text[label_end + 2..target_end]) {
            Some(href) => doc.push(RenderFragment::Link {
                href,
                label: label.to_string(),
            }),
            None => {
                debug!("Markdown link target rejected");
                doc.push_text(&text[start..end]);
            }
        }
        last = end;
        from = end;
    }

    render_bare_urls(&text[last..], sanitizer, doc);
}

/// Bare URLs: `http(s)://` followed by anything but whitespace or `<`.
///
/// Trailing `).,;:!?]` characters are not part of the link and are emitted as
/// text after it.
fn render_bare_urls(text: &str, sanitizer: &UrlSanitizer, doc: &mut Document) {
    let mut last = 0;
    let mut from = 0;

    while let Some(offset) = text[from..].find("http") {
        let start = from + offset;
        from = start + 1;

        let Some(scheme_len) = http_scheme_len(&text[start..]) else {
            continue;
        };
        let body_start = start + scheme_len;
        let body_len = text[body_start..]
            .find(|c: char| c.is_whitespace() || c == '<')
            .unwrap_or(text.len() - body_start);
        if body_len == 0 {
            continue;
        }
        let end = body_start + body_len;
        let url = text[start..end].trim_end_matches(URL_TRAILING);
        let trailing = &text[start + url.len()..end];

        doc.push_text(&text[last..start]);
        match sanitizer.sanitize(url) {
            Some(href) => doc.push(RenderFragment::Link {
                href,
                label: url.to_string(),
            }),
            None => doc.push_text(url),
        }
        doc.push_text(trailing);
        last = end;
        from = end;
    }

    doc.push_text(&text[last..]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::time::{Duration, Instant};

    fn chunk(text: &str) -> Document {
        let mut doc = Document::new();
        render_chunk(text, &UrlSanitizer::default(), &mut doc);
        doc
    }

    fn names(segments: &[Segment<'_>]) -> Vec<String> {
        segments
            .iter()
            .map(|segment| match segment {
                Segment::Chunk(text) => format!("chunk:{text}"),
                Segment::Directive(d) => format!("tool:{}", d.name),
            })
            .collect()
    }

    #[test]
    fn test_split_single_directive() {
        let segments = split_directives(r#"Voici [TOOL:Show_Image query="chat" alt="un chat"] !"#);
        assert_eq!(names(&segments), vec!["chunk:Voici ", "tool:show_image", "chunk: !"]);

        let Segment::Directive(directive) = &segments[1] else {
            panic!("expected directive");
        };
        assert_eq!(directive.attributes.get("query"), Some("chat"));
        assert_eq!(directive.source, r#"[TOOL:Show_Image query="chat" alt="un chat"]"#);
        assert_eq!(directive.body, None);
    }

    #[test]
    fn test_split_code_block_directive() {
        let text = "a[tool:code lang=\"rust\"]fn main() {}\n[/TOOL:CODE]b";
        let segments = split_directives(text);
        assert_eq!(names(&segments), vec!["chunk:a", "tool:code", "chunk:b"]);

        let Segment::Directive(directive) = &segments[1] else {
            panic!("expected directive");
        };
        assert_eq!(directive.body, Some("fn main() {}\n"));
        assert_eq!(directive.attributes.get("lang"), Some("rust"));
    }

    #[test]
    fn test_code_without_close_is_single_tag() {
        let segments = split_directives("[tool:code lang=\"py\"] print(1)");
        let Segment::Directive(directive) = &segments[0] else {
            panic!("expected directive");
        };
        assert_eq!(directive.name, "code");
        assert_eq!(directive.body, None);
    }

    #[test]
    fn test_code_prefix_needs_word_boundary() {
        let segments = split_directives("[tool:codex]x[/tool:code]");
        let Segment::Directive(directive) = &segments[0] else {
            panic!("expected directive");
        };
        assert_eq!(directive.name, "codex");
        assert_eq!(names(&segments), vec!["tool:codex", "chunk:x[/tool:code]"]);
    }

    #[test]
    fn test_malformed_directives_are_chunks() {
        let text = "[tool:] [tool: link] [tool:link url=\"x\"";
        assert_eq!(names(&split_directives(text)), vec![format!("chunk:{text}")]);
    }

    #[test]
    fn test_many_unclosed_openers() {
        let text = "[tool:code".repeat(10_000);
        let segments = split_directives(&text);
        assert_eq!(segments.len(), 1);
    }

    #[test]
    fn test_fenced_block() {
        let doc = chunk("before\n```js\nlet x=1;   \n```after");
        assert_eq!(
            doc.fragments(),
            &[
                RenderFragment::text("before\n"),
                RenderFragment::CodeBlock(CodeBlock {
                    language: Some("js".to_string()),
                    code: "let x=1;".to_string(),
                    origin: CodeOrigin::Fence,
                }),
                RenderFragment::text("after"),
            ]
        );
    }

    #[test]
    fn test_fence_requires_newline() {
        let doc = chunk("```js let x```");
        assert_eq!(
            doc.fragments(),
            &[
                RenderFragment::text("``"),
                RenderFragment::InlineCode {
                    code: "js let x".to_string()
                },
                RenderFragment::text("``"),
            ]
        );
    }

    #[test]
    fn test_fence_contents_not_rescanned() {
        let doc = chunk("```\nsee `x` and https://example.com\n```");
        assert_eq!(doc.fragments().len(), 1);
        assert!(matches!(&doc.fragments()[0], RenderFragment::CodeBlock(b) if b.label() == "Plain"));
    }

    #[test]
    fn test_inline_code() {
        let doc = chunk("`x`");
        assert_eq!(
            doc.fragments(),
            &[RenderFragment::InlineCode {
                code: "x".to_string()
            }]
        );
    }

    #[test]
    fn test_inline_code_not_rescanned_for_links() {
        let doc = chunk("run `curl https://example.com` now");
        assert_eq!(doc.fragments().len(), 3);
        assert!(doc
            .fragments()
            .iter()
            .all(|f| !matches!(f, RenderFragment::Link { .. })));
    }

    #[test]
    fn test_markdown_link() {
        let doc = chunk("Lire [la doc](https://docs.rs/x) ici");
        assert_eq!(
            doc.fragments(),
            &[
                RenderFragment::text("Lire "),
                RenderFragment::Link {
                    href: "https://docs.rs/x".to_string(),
                    label: "la doc".to_string(),
                },
                RenderFragment::text(" ici"),
            ]
        );
    }

    #[test]
    fn test_markdown_link_needs_http_target() {
        let doc = chunk("[x](javascript:alert(1))");
        assert_eq!(doc.fragments(), &[RenderFragment::text("[x](javascript:alert(1))")]);
        assert!(!doc.contains_rich_markup());
    }

    #[test]
    fn test_bare_url_trailing_punctuation() {
        let doc = chunk("See https://example.com/a).");
        assert_eq!(
            doc.fragments(),
            &[
                RenderFragment::text("See "),
                RenderFragment::Link {
                    href: "https://example.com/a".to_string(),
                    label: "https://example.com/a".to_string(),
                },
                RenderFragment::text(")."),
            ]
        );
    }

    #[test]
    fn test_bare_url_excludes_trailing_comma() {
        let doc = chunk("see https://a.com, then");
        assert_eq!(
            doc.fragments(),
            &[
                RenderFragment::text("see "),
                RenderFragment::Link {
                    href: "https://a.com/".to_string(),
                    label: "https://a.com".to_string(),
                },
                RenderFragment::text(", then"),
            ]
        );
    }

    #[test]
    fn test_rejected_bare_url_is_text_once() {
        let doc = chunk("bad http://[::1.");
        assert_eq!(doc.fragments(), &[RenderFragment::text("bad http://[::1.")]);
    }

    #[test]
    fn test_bare_url_stops_at_angle_bracket() {
        let doc = chunk("see https://example.com/<b>");
        assert_eq!(
            doc.fragments(),
            &[
                RenderFragment::text("see "),
                RenderFragment::Link {
                    href: "https://example.com/".to_string(),
                    label: "https://example.com/".to_string(),
                },
                RenderFragment::text("<b>"),
            ]
        );
    }

    #[test]
    fn test_nested_openers_share_one_target() {
        let text = "[".repeat(5_000) + "a](https://example.com/x";
        let doc = chunk(&text);
        assert!(doc
            .fragments()
            .iter()
            .any(|f| matches!(f, RenderFragment::Link { href, .. } if href == "https://example.com/x")));
    }

    #[test]
    fn test_unclosed_link_targets_scale_linearly() {
        let render = |n: usize| {
            let text = "[x](http://a".repeat(n);
            let started = Instant::now();
            let doc = chunk(&text);
            assert!(!doc.fragments().is_empty());
            started.elapsed()
        };

        let small = render(20_000);
        let large = render(80_000);
        assert!(
            large <= small * 10 + Duration::from_millis(200),
            "4x input took {large:?} vs {small:?}"
        );
    }

    #[test]
    fn test_adversarial_brackets() {
        let text = "[a](".repeat(20_000) + &"`".repeat(3);
        let doc = chunk(&text);
        assert!(!doc.fragments().is_empty());
    }
}
