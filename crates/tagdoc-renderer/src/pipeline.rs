//! Parser selection and the documentation rendering pipeline.
//!
//! [`get_parser`] turns a [`MarkdownConfig`] into a [`MarkdownParser`], the
//! render function the rest of the generator calls per documentation
//! comment. Configuration problems never fail the run: an unrecognized
//! parser disables Markdown rendering (the factory returns `None` and the
//! caller passes text through verbatim), an unusable highlighter only
//! disables highlighting.

use pulldown_cmark::{Options, Parser};
use tagdoc_config::{HighlightSetting, MarkdownConfig};

use crate::escape;
use crate::highlight::Highlighter;
use crate::html::{HtmlRenderer, RenderHooks, default_code_block, default_heading};
use crate::registry::{HighlighterKind, ParserKind};

/// Engine options for the marked-compatible parser.
fn engine_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH
}

/// Build the render function for the configured parser.
///
/// Returns `None` when the parser name does not resolve; the failure is
/// reported through the logging collaborator and rendering stays disabled
/// for the run.
#[must_use]
pub fn get_parser(config: &MarkdownConfig) -> Option<MarkdownParser> {
    match ParserKind::resolve(&config.parser) {
        Some(ParserKind::Marked) => Some(marked_parser(config)),
        None => {
            tracing::error!(
                parser = %config.parser,
                "unrecognized Markdown parser, Markdown rendering is disabled"
            );
            None
        }
    }
}

fn marked_parser(config: &MarkdownConfig) -> MarkdownParser {
    MarkdownParser {
        hardwrap: config.hardwrap,
        id_in_headings: config.id_in_headings,
        highlighter: resolve_highlighter(&config.highlight),
    }
}

/// Resolve and load the configured highlighter, or disable highlighting.
fn resolve_highlighter(setting: &HighlightSetting) -> Option<Highlighter> {
    let kind = match setting {
        HighlightSetting::Enabled(false) => return None,
        HighlightSetting::Enabled(true) => HighlighterKind::HighlightJs,
        HighlightSetting::Backend(name) => {
            let Some(kind) = HighlighterKind::resolve(name) else {
                tracing::error!(
                    highlighter = %name,
                    "unrecognized highlighter, code blocks will not be highlighted"
                );
                return None;
            };
            kind
        }
    };
    match Highlighter::load(kind) {
        Ok(highlighter) => Some(highlighter),
        Err(err) => {
            tracing::error!(
                backend = kind.canonical_name(),
                error = %err,
                "failed to load highlighter, code blocks will not be highlighted"
            );
            None
        }
    }
}

/// The configured render function.
///
/// Stateless with respect to call-to-call input; the parser, highlighter,
/// and rendering options are fixed at construction time.
pub struct MarkdownParser {
    hardwrap: bool,
    id_in_headings: bool,
    highlighter: Option<Highlighter>,
}

impl MarkdownParser {
    /// Render one documentation comment to HTML.
    ///
    /// Steps run in fixed order. The pre-escapes must precede the engine so
    /// their markers survive as Markdown escapes; the unescapes must follow
    /// it because the entities they reverse only exist in engine output.
    #[must_use]
    pub fn render(&self, source: &str) -> String {
        let source = escape::escape_underscores_in_inline_tags(source);
        let source = escape::escape_urls(&source);

        let events = Parser::new_ext(&source, engine_options());
        let hooks = DocHooks {
            id_in_headings: self.id_in_headings,
            highlighter: self.highlighter.as_ref(),
        };
        let mut renderer = HtmlRenderer::new(hooks);
        if self.hardwrap {
            renderer = renderer.with_hardwrap();
        }
        let html = renderer.render(events);

        let html = escape::unescape_apostrophes(html.trim_end());
        let html = escape::unescape_urls(&html);
        escape::unescape_quotes_in_inline_tags(&html).into_owned()
    }
}

/// Hooks applying the documentation output conventions.
///
/// Headings drop their anchor id unless configured otherwise, and code
/// blocks decorate the engine-default rendering with the `source` class the
/// documentation stylesheets target.
struct DocHooks<'a> {
    id_in_headings: bool,
    highlighter: Option<&'a Highlighter>,
}

impl DocHooks<'_> {
    fn highlighted(&self, code: &str, lang: Option<&str>) -> Option<String> {
        let highlighter = self.highlighter?;
        match highlighter.highlight(code, lang) {
            Ok(html) => Some(html),
            Err(err) => {
                tracing::error!(error = %err, "code block left unhighlighted");
                None
            }
        }
    }
}

impl RenderHooks for DocHooks<'_> {
    fn heading(&mut self, html: &str, level: u8, id: Option<&str>, out: &mut String) {
        let id = if self.id_in_headings { id } else { None };
        default_heading(html, level, id, out);
    }

    fn code(&mut self, code: &str, lang: Option<&str>, escaped: bool, out: &mut String) {
        let mut block = String::new();
        match self.highlighted(code, lang) {
            Some(html) => default_code_block(&html, lang, true, &mut block),
            None => default_code_block(code, lang, escaped, &mut block),
        }
        out.push_str(&block.replacen("<pre>", r#"<pre class="source">"#, 1));
    }
}
