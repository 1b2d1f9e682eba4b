//! Name resolution for Markdown parsers and highlighter backends.
//!
//! User-facing names, including deprecated aliases, resolve to canonical
//! implementations. Resolution is case-sensitive and exact-match only.
//! Unknown names resolve to `None`; the caller decides how to report that.

/// Canonical Markdown parser.
///
/// Only one engine is implemented. The `evilstreak` and `gfm` names are
/// deprecated aliases kept so old configurations keep working.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParserKind {
    /// The marked-compatible engine.
    Marked,
}

impl ParserKind {
    /// Resolve a user-facing parser name to a canonical parser.
    #[must_use]
    pub fn resolve(name: &str) -> Option<Self> {
        match name {
            "evilstreak" | "gfm" | "marked" => Some(Self::Marked),
            _ => None,
        }
    }
}

/// Canonical highlighter backend.
///
/// The `highlight.js` lineage of names is served by the in-process syntect
/// backend; the `pygmentize` names by an out-of-process `pygmentize` call.
/// Both name families are retained for configuration compatibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HighlighterKind {
    /// In-process highlighting, synchronous.
    HighlightJs,
    /// Out-of-process highlighting through the `pygmentize` command.
    Pygmentize,
}

impl HighlighterKind {
    /// Resolve a user-facing highlighter name to a canonical backend.
    #[must_use]
    pub fn resolve(name: &str) -> Option<Self> {
        match name {
            "hljs" | "highlight.js" | "highlightjs" => Some(Self::HighlightJs),
            "pygmentize-bundled" | "pygmentize" => Some(Self::Pygmentize),
            _ => None,
        }
    }

    /// The canonical backend name, as it appears in configuration.
    #[must_use]
    pub fn canonical_name(self) -> &'static str {
        match self {
            Self::HighlightJs => "highlight.js",
            Self::Pygmentize => "pygmentize",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_aliases_resolve_to_marked() {
        assert_eq!(ParserKind::resolve("marked"), Some(ParserKind::Marked));
        assert_eq!(ParserKind::resolve("gfm"), Some(ParserKind::Marked));
        assert_eq!(ParserKind::resolve("evilstreak"), Some(ParserKind::Marked));
    }

    #[test]
    fn test_parser_unknown_name() {
        assert_eq!(ParserKind::resolve("bogus"), None);
        assert_eq!(ParserKind::resolve(""), None);
    }

    #[test]
    fn test_parser_resolution_is_case_sensitive() {
        assert_eq!(ParserKind::resolve("Marked"), None);
        assert_eq!(ParserKind::resolve("GFM"), None);
    }

    #[test]
    fn test_parser_resolution_is_exact_match() {
        assert_eq!(ParserKind::resolve(" marked"), None);
        assert_eq!(ParserKind::resolve("marked "), None);
    }

    #[test]
    fn test_highlighter_hljs_aliases() {
        assert_eq!(
            HighlighterKind::resolve("hljs"),
            Some(HighlighterKind::HighlightJs)
        );
        assert_eq!(
            HighlighterKind::resolve("highlight.js"),
            Some(HighlighterKind::HighlightJs)
        );
        assert_eq!(
            HighlighterKind::resolve("highlightjs"),
            Some(HighlighterKind::HighlightJs)
        );
    }

    #[test]
    fn test_highlighter_pygmentize_aliases() {
        assert_eq!(
            HighlighterKind::resolve("pygmentize"),
            Some(HighlighterKind::Pygmentize)
        );
        assert_eq!(
            HighlighterKind::resolve("pygmentize-bundled"),
            Some(HighlighterKind::Pygmentize)
        );
    }

    #[test]
    fn test_highlighter_unknown_name() {
        assert_eq!(HighlighterKind::resolve("rouge"), None);
        assert_eq!(HighlighterKind::resolve("Hljs"), None);
    }

    #[test]
    fn test_canonical_names_resolve_to_themselves() {
        for kind in [HighlighterKind::HighlightJs, HighlighterKind::Pygmentize] {
            assert_eq!(HighlighterKind::resolve(kind.canonical_name()), Some(kind));
        }
    }
}
