//! Escape and unescape transforms that protect documentation syntax.
//!
//! Documentation comments carry inline `{@...}` tags, literal URLs, and
//! quoted link paths that a Markdown engine would otherwise mangle through
//! emphasis, autolink, or entity encoding. The pre-escape transforms run on
//! the Markdown source; the matching unescape transforms run on the HTML
//! output. Order matters and is owned by the pipeline, not by this module.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

/// An inline documentation tag: `{@` up to the next `}` on the same line.
static INLINE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{@[^}\r\n]+\}").expect("invalid inline tag regex"));

static URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(https?)://").expect("invalid url regex"));

static ESCAPED_URL_SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(https?):\\/\\/").expect("invalid escaped url regex"));

/// Backslash-escape underscores inside inline documentation tags.
///
/// Only underscores that are not already backslash-escaped are touched, and
/// only within `{@...}` spans. Text outside tags is left alone.
pub fn escape_underscores_in_inline_tags(source: &str) -> Cow<'_, str> {
    INLINE_TAG.replace_all(source, |caps: &Captures<'_>| {
        let tag = &caps[0];
        let mut out = String::with_capacity(tag.len() + 4);
        let mut after_backslash = false;
        for c in tag.chars() {
            if c == '_' && !after_backslash {
                out.push('\\');
            }
            after_backslash = c == '\\';
            out.push(c);
        }
        out
    })
}

/// Backslash-escape the slashes of literal `http://` and `https://` schemes.
pub fn escape_urls(source: &str) -> Cow<'_, str> {
    URL_SCHEME.replace_all(source, r"${1}:\/\/")
}

/// Reverse [`escape_urls`].
pub fn unescape_urls(html: &str) -> Cow<'_, str> {
    ESCAPED_URL_SCHEME.replace_all(html, "${1}://")
}

/// Replace the apostrophe entity the engine emits with a literal apostrophe.
///
/// Applied to the whole output. The only `&#39;` sequences present at this
/// point originate from source apostrophes encoded during rendering, so the
/// global replacement restores them all. A document whose prose literally
/// spells out the entity text is altered too; that behavior is kept as is.
pub fn unescape_apostrophes(html: &str) -> String {
    html.replace("&#39;", "'")
}

/// Replace the double-quote entity with a literal quote inside `{@...}` spans.
///
/// Quote encoding cannot be prevented up front; the entity only exists after
/// Markdown processing, so this runs on the HTML output.
pub fn unescape_quotes_in_inline_tags(html: &str) -> Cow<'_, str> {
    INLINE_TAG.replace_all(html, |caps: &Captures<'_>| caps[0].replace("&quot;", "\""))
}

/// Escape text destined to appear verbatim inside an HTML code block.
///
/// Replacement passes run in fixed order and do not overlap. `&` is left
/// alone so already-encoded entities in the sample survive.
#[must_use]
pub fn escape_code(code: &str) -> String {
    code.replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
