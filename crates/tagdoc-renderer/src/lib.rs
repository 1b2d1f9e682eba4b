//! Markdown rendering for documentation comments.
//!
//! Documentation prose carries inline `{@...}` cross-reference tags, literal
//! URLs, and quoted link paths that plain Markdown processing would corrupt
//! through emphasis, autolinking, or entity encoding. This crate selects a
//! Markdown engine from configuration and wraps it in the escape/unescape
//! pipeline that keeps that syntax intact.
//!
//! # Architecture
//!
//! - [`ParserKind`] / [`HighlighterKind`]: resolve user-facing parser and
//!   highlighter names, including deprecated aliases, to canonical
//!   implementations.
//! - [`get_parser`]: the factory. Takes the loaded configuration and returns
//!   a [`MarkdownParser`], or `None` when the configured parser is unknown
//!   (the caller then passes text through unrendered).
//! - [`HtmlRenderer`]: event-loop renderer over pulldown-cmark with
//!   overridable [`RenderHooks`] for headings and code blocks.
//! - [`Highlighter`]: optional syntax highlighting, in-process or through a
//!   `pygmentize` subprocess.
//!
//! # Example
//!
//! ```
//! use tagdoc_config::MarkdownConfig;
//! use tagdoc_renderer::get_parser;
//!
//! let parser = get_parser(&MarkdownConfig::default()).expect("default parser is known");
//! let html = parser.render("See {@link module_name} for details.");
//! assert!(html.contains("{@link module_name}"));
//! ```

mod escape;
mod highlight;
mod html;
mod pipeline;
mod registry;

pub use escape::escape_code;
pub use highlight::{
    HighlightError, HighlightJob, Highlighter, PygmentizeHighlighter, SyntectHighlighter,
};
pub use html::{
    DefaultHooks, HtmlRenderer, RenderHooks, default_code_block, default_heading, escape_html,
    slugify,
};
pub use pipeline::{MarkdownParser, get_parser};
pub use registry::{HighlighterKind, ParserKind};
