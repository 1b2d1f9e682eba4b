//! Event-loop HTML renderer over pulldown-cmark.
//!
//! The renderer walks the engine's event stream and writes HTML, delegating
//! headings and code blocks to a [`RenderHooks`] implementation. The hook
//! defaults reproduce the engine's own output; callers override a hook by
//! composing with the matching `default_*` function rather than patching
//! shared state.

use std::collections::HashMap;
use std::fmt::Write;

use pulldown_cmark::{Alignment, CodeBlockKind, Event, HeadingLevel, Tag, TagEnd};

/// Overridable output forms.
///
/// Both hooks have engine-default implementations. An override that only
/// decorates the default output should call the corresponding free function
/// ([`default_heading`], [`default_code_block`]) and transform its result.
pub trait RenderHooks {
    /// Render a heading whose inline content is already rendered to `html`.
    ///
    /// `id` is the deduplicated anchor slug for this heading; implementations
    /// decide whether to emit it.
    fn heading(&mut self, html: &str, level: u8, id: Option<&str>, out: &mut String) {
        default_heading(html, level, id, out);
    }

    /// Render a code block.
    ///
    /// `escaped` is true when `code` is already HTML-safe and must not be
    /// escaped again.
    fn code(&mut self, code: &str, lang: Option<&str>, escaped: bool, out: &mut String) {
        default_code_block(code, lang, escaped, out);
    }
}

/// Hooks that keep every engine default.
pub struct DefaultHooks;

impl RenderHooks for DefaultHooks {}

/// Engine-default heading form: `<hN id="...">...</hN>`.
pub fn default_heading(html: &str, level: u8, id: Option<&str>, out: &mut String) {
    match id {
        Some(id) => write!(out, r#"<h{level} id="{id}">{}</h{level}>"#, html.trim()).unwrap(),
        None => write!(out, "<h{level}>{}</h{level}>", html.trim()).unwrap(),
    }
}

/// Engine-default code block form: `<pre><code class="language-...">`.
pub fn default_code_block(code: &str, lang: Option<&str>, escaped: bool, out: &mut String) {
    let body = if escaped {
        std::borrow::Cow::Borrowed(code)
    } else {
        std::borrow::Cow::Owned(escape_html(code))
    };
    match lang {
        Some(lang) => write!(
            out,
            r#"<pre><code class="language-{}">{body}</code></pre>"#,
            escape_html(lang)
        )
        .unwrap(),
        None => write!(out, "<pre><code>{body}</code></pre>").unwrap(),
    }
}

/// In-flight code block.
struct CodeBuffer {
    lang: Option<String>,
    text: String,
}

/// In-flight heading. `text` feeds slug generation, `html` keeps inline markup.
struct HeadingBuffer {
    level: u8,
    text: String,
    html: String,
}

/// In-flight image waiting for its alt text.
struct ImageBuffer {
    src: String,
    title: String,
    alt: String,
}

#[derive(Default)]
struct TableContext {
    in_head: bool,
    alignments: Vec<Alignment>,
    cell: usize,
}

impl TableContext {
    fn alignment_style(&self) -> &'static str {
        match self.alignments.get(self.cell) {
            Some(Alignment::Left) => r#" style="text-align:left""#,
            Some(Alignment::Center) => r#" style="text-align:center""#,
            Some(Alignment::Right) => r#" style="text-align:right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// Markdown-to-HTML renderer with pluggable hooks.
pub struct HtmlRenderer<H: RenderHooks> {
    hooks: H,
    /// Treat soft breaks as forced line breaks.
    hardwrap: bool,
    output: String,
    code: Option<CodeBuffer>,
    heading: Option<HeadingBuffer>,
    image: Option<ImageBuffer>,
    table: TableContext,
    /// Occurrence counts for heading slugs, for `-1`, `-2` dedup suffixes.
    used_ids: HashMap<String, usize>,
}

impl<H: RenderHooks> HtmlRenderer<H> {
    /// Create a renderer around the given hooks.
    #[must_use]
    pub fn new(hooks: H) -> Self {
        Self {
            hooks,
            hardwrap: false,
            output: String::with_capacity(4096),
            code: None,
            heading: None,
            image: None,
            table: TableContext::default(),
            used_ids: HashMap::new(),
        }
    }

    /// Render soft line breaks as `<br>`.
    #[must_use]
    pub fn with_hardwrap(mut self) -> Self {
        self.hardwrap = true;
        self
    }

    /// Render an event stream and return the HTML.
    pub fn render<'a, I>(&mut self, events: I) -> String
    where
        I: Iterator<Item = Event<'a>>,
    {
        for event in events {
            self.process_event(event);
        }
        std::mem::take(&mut self.output)
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) | Event::InlineHtml(html) => self.output.push_str(&html),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => self.hard_break(),
            Event::Rule => self.output.push_str("<hr>"),
            Event::TaskListMarker(_)
            | Event::FootnoteReference(_)
            | Event::InlineMath(_)
            | Event::DisplayMath(_) => {
                // Not supported
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {
                if self.code.is_none() {
                    self.output.push_str("<p>");
                }
            }
            Tag::Heading { level, .. } => {
                self.heading = Some(HeadingBuffer {
                    level: heading_level_to_num(level),
                    text: String::new(),
                    html: String::new(),
                });
            }
            Tag::BlockQuote(_) => self.output.push_str("<blockquote>"),
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(ref info) => {
                        info.split_whitespace().next().map(str::to_owned)
                    }
                    CodeBlockKind::Indented => None,
                };
                self.code = Some(CodeBuffer {
                    lang,
                    text: String::new(),
                });
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => write!(self.output, r#"<ol start="{n}">"#).unwrap(),
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::Table(alignments) => {
                self.table = TableContext {
                    in_head: false,
                    alignments,
                    cell: 0,
                };
                self.output.push_str("<table>");
            }
            Tag::TableHead => {
                self.table.in_head = true;
                self.table.cell = 0;
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.cell = 0;
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.alignment_style();
                let tag = if self.table.in_head { "th" } else { "td" };
                write!(self.output, "<{tag}{align}>").unwrap();
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Link { dest_url, .. } => {
                let link = format!(r#"<a href="{}">"#, escape_html(&dest_url));
                self.push_inline(&link);
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                self.image = Some(ImageBuffer {
                    src: dest_url.to_string(),
                    title: title.to_string(),
                    alt: String::new(),
                });
            }
            Tag::FootnoteDefinition(_)
            | Tag::HtmlBlock
            | Tag::MetadataBlock(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::Superscript
            | Tag::Subscript => {}
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                if self.code.is_none() {
                    self.output.push_str("</p>");
                }
            }
            TagEnd::Heading(_) => {
                if let Some(heading) = self.heading.take() {
                    let id = self.unique_id(&heading.text);
                    self.hooks.heading(
                        &heading.html,
                        heading.level,
                        Some(&id),
                        &mut self.output,
                    );
                }
            }
            TagEnd::BlockQuote(_) => self.output.push_str("</blockquote>"),
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    self.hooks
                        .code(&code.text, code.lang.as_deref(), false, &mut self.output);
                }
            }
            TagEnd::List(ordered) => {
                self.output
                    .push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::Table => self.output.push_str("</tbody></table>"),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.in_head = false;
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output
                    .push_str(if self.table.in_head { "</th>" } else { "</td>" });
                self.table.cell += 1;
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Link => self.push_inline("</a>"),
            TagEnd::Image => {
                if let Some(image) = self.image.take() {
                    let title_attr = if image.title.is_empty() {
                        String::new()
                    } else {
                        format!(r#" title="{}""#, escape_html(&image.title))
                    };
                    write!(
                        self.output,
                        r#"<img src="{}"{title_attr} alt="{}">"#,
                        escape_html(&image.src),
                        escape_html(&image.alt)
                    )
                    .unwrap();
                }
            }
            TagEnd::FootnoteDefinition
            | TagEnd::HtmlBlock
            | TagEnd::MetadataBlock(_)
            | TagEnd::DefinitionList
            | TagEnd::DefinitionListTitle
            | TagEnd::DefinitionListDefinition
            | TagEnd::Superscript
            | TagEnd::Subscript => {}
        }
    }

    fn text(&mut self, text: &str) {
        // Priority: code > image > heading > normal text
        if let Some(code) = &mut self.code {
            code.text.push_str(text);
        } else if let Some(image) = &mut self.image {
            image.alt.push_str(text);
        } else if let Some(heading) = &mut self.heading {
            heading.text.push_str(text);
            heading.html.push_str(&escape_html(text));
        } else {
            self.output.push_str(&escape_html(text));
        }
    }

    fn inline_code(&mut self, code: &str) {
        if let Some(heading) = &mut self.heading {
            heading.text.push_str(code);
            write!(heading.html, "<code>{}</code>", escape_html(code)).unwrap();
        } else {
            write!(self.output, "<code>{}</code>", escape_html(code)).unwrap();
        }
    }

    fn soft_break(&mut self) {
        if let Some(code) = &mut self.code {
            code.text.push('\n');
            return;
        }
        let br = if self.hardwrap { "<br>" } else { "\n" };
        if let Some(heading) = &mut self.heading {
            heading.text.push(' ');
            heading.html.push_str(br);
        } else {
            self.output.push_str(br);
        }
    }

    fn hard_break(&mut self) {
        if let Some(heading) = &mut self.heading {
            heading.text.push(' ');
            heading.html.push_str("<br>");
        } else {
            self.output.push_str("<br>");
        }
    }

    /// Push inline markup to the current sink (heading buffer or output).
    fn push_inline(&mut self, content: &str) {
        if let Some(heading) = &mut self.heading {
            heading.html.push_str(content);
        } else {
            self.output.push_str(content);
        }
    }

    /// Slug for a heading, unique within this document.
    fn unique_id(&mut self, text: &str) -> String {
        let base = slugify(text);
        let count = self.used_ids.entry(base.clone()).or_default();
        let id = match *count {
            0 => base,
            n => format!("{base}-{n}"),
        };
        *count += 1;
        id
    }
}

/// Convert heading level enum to number (1-6).
fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Convert text to a URL-safe slug.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true; // Prevents leading dash
    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }
    if result.ends_with('-') {
        result.pop();
    }
    result
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#39;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use pulldown_cmark::{Options, Parser};

    fn render(markdown: &str) -> String {
        let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH;
        let parser = Parser::new_ext(markdown, options);
        HtmlRenderer::new(DefaultHooks).render(parser)
    }

    fn render_hardwrap(markdown: &str) -> String {
        let parser = Parser::new(markdown);
        HtmlRenderer::new(DefaultHooks).with_hardwrap().render(parser)
    }

    #[test]
    fn test_basic_paragraph() {
        assert_eq!(render("Hello, world!"), "<p>Hello, world!</p>");
    }

    #[test]
    fn test_heading_with_id() {
        assert_eq!(
            render("## Section Title"),
            r#"<h2 id="section-title">Section Title</h2>"#
        );
    }

    #[test]
    fn test_duplicate_heading_ids() {
        let html = render("## FAQ\n\n## FAQ\n\n## FAQ");
        assert!(html.contains(r#"id="faq""#));
        assert!(html.contains(r#"id="faq-1""#));
        assert!(html.contains(r#"id="faq-2""#));
    }

    #[test]
    fn test_heading_with_inline_code() {
        assert_eq!(
            render("## Install `npm`"),
            r#"<h2 id="install-npm">Install <code>npm</code></h2>"#
        );
    }

    #[test]
    fn test_code_block_fenced() {
        let html = render("```rust\nfn main() {}\n```");
        assert_eq!(
            html,
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>"
        );
    }

    #[test]
    fn test_code_block_escapes_content() {
        let html = render("```\n<b>&</b>\n```");
        assert_eq!(html, "<pre><code>&lt;b&gt;&amp;&lt;/b&gt;\n</code></pre>");
    }

    #[test]
    fn test_emphasis_and_strong() {
        let html = render("*italic* and **bold**");
        assert!(html.contains("<em>italic</em>"));
        assert!(html.contains("<strong>bold</strong>"));
    }

    #[test]
    fn test_strikethrough() {
        assert!(render("~~gone~~").contains("<s>gone</s>"));
    }

    #[test]
    fn test_lists() {
        let html = render("- a\n- b");
        assert!(html.contains("<ul><li>a</li><li>b</li></ul>"));

        let html = render("1. a\n2. b");
        assert!(html.contains("<ol><li>a</li><li>b</li></ol>"));
    }

    #[test]
    fn test_blockquote() {
        let html = render("> Note");
        assert!(html.starts_with("<blockquote>"));
        assert!(html.ends_with("</blockquote>"));
    }

    #[test]
    fn test_link() {
        assert_eq!(
            render("[text](https://example.com)"),
            r#"<p><a href="https://example.com">text</a></p>"#
        );
    }

    #[test]
    fn test_autolink() {
        assert_eq!(
            render("<https://example.com>"),
            r#"<p><a href="https://example.com">https://example.com</a></p>"#
        );
    }

    #[test]
    fn test_image() {
        assert_eq!(
            render("![Alt](image.png)"),
            r#"<p><img src="image.png" alt="Alt"></p>"#
        );
    }

    #[test]
    fn test_table() {
        let html = render("| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table><thead><tr><th>A</th><th>B</th></tr></thead>"));
        assert!(html.contains("<tbody><tr><td>1</td><td>2</td></tr></tbody></table>"));
    }

    #[test]
    fn test_soft_break_default() {
        assert_eq!(render("one\ntwo"), "<p>one\ntwo</p>");
    }

    #[test]
    fn test_soft_break_hardwrap() {
        assert_eq!(render_hardwrap("one\ntwo"), "<p>one<br>two</p>");
    }

    #[test]
    fn test_raw_html_passthrough() {
        let html = render("before\n\n<div class=\"x\">raw</div>\n\nafter");
        assert!(html.contains("<div class=\"x\">raw</div>"));
    }

    #[test]
    fn test_text_is_escaped() {
        assert_eq!(render("a < b & c"), "<p>a &lt; b &amp; c</p>");
    }

    #[test]
    fn test_apostrophe_entity() {
        assert_eq!(render("it's"), "<p>it&#39;s</p>");
    }

    #[test]
    fn test_custom_heading_hook() {
        struct BareHeadings;
        impl RenderHooks for BareHeadings {
            fn heading(&mut self, html: &str, level: u8, _id: Option<&str>, out: &mut String) {
                default_heading(html, level, None, out);
            }
        }

        let parser = Parser::new("# Title");
        let html = HtmlRenderer::new(BareHeadings).render(parser);
        assert_eq!(html, "<h1>Title</h1>");
    }

    #[test]
    fn test_custom_code_hook_decorates_default() {
        struct ClassedCode;
        impl RenderHooks for ClassedCode {
            fn code(&mut self, code: &str, lang: Option<&str>, escaped: bool, out: &mut String) {
                let mut block = String::new();
                default_code_block(code, lang, escaped, &mut block);
                out.push_str(&block.replacen("<pre>", r#"<pre class="wide">"#, 1));
            }
        }

        let parser = Parser::new("```\nx\n```");
        let html = HtmlRenderer::new(ClassedCode).render(parser);
        assert_eq!(html, "<pre class=\"wide\"><code>x\n</code></pre>");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("snake_case"), "snake-case");
        assert_eq!(slugify("  Spaces  "), "spaces");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html(r#""quoted""#), "&quot;quoted&quot;");
        assert_eq!(escape_html("it's"), "it&#39;s");
    }
}
