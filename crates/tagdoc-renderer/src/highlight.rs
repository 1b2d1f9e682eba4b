//! Syntax highlighting backends for fenced code blocks.
//!
//! Two backends exist. The in-process one produces its result directly; the
//! out-of-process one runs `pygmentize` on a worker thread and delivers its
//! result through a one-shot channel. [`HighlightJob`] unifies the two
//! shapes so the rendering pipeline is written once against one contract.
//!
//! Every failure here is non-fatal: the caller logs and falls back to the
//! unhighlighted code text.

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::thread;

use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::registry::HighlighterKind;

/// Command used by the out-of-process backend.
const PYGMENTIZE_COMMAND: &str = "pygmentize";

/// Highlighting failure.
#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    /// The backend could not be loaded at construction time.
    #[error("highlighter {backend} unavailable: {message}")]
    Unavailable {
        /// Command or backend that failed to load.
        backend: String,
        /// Underlying cause.
        message: String,
    },
    /// A single highlight invocation failed.
    #[error("highlighting {language} failed: {message}")]
    Invocation {
        /// Language token the invocation was asked to highlight.
        language: String,
        /// Underlying cause.
        message: String,
    },
    /// The worker delivering a deferred result went away without reporting.
    #[error("highlight worker disconnected")]
    WorkerDisconnected,
}

/// A highlight invocation in progress.
///
/// `Direct` carries a result computed synchronously. `Deferred` carries the
/// receiving end of a one-shot channel whose sender fires exactly once per
/// code block. No timeout is applied; a hung worker stalls [`wait`](Self::wait).
pub enum HighlightJob {
    /// Result available immediately.
    Direct(Result<String, HighlightError>),
    /// Result delivered by a worker thread.
    Deferred(mpsc::Receiver<Result<String, HighlightError>>),
}

impl HighlightJob {
    /// Resolve the job to its result.
    pub fn wait(self) -> Result<String, HighlightError> {
        match self {
            Self::Direct(result) => result,
            Self::Deferred(rx) => rx
                .recv()
                .unwrap_or(Err(HighlightError::WorkerDisconnected)),
        }
    }
}

/// A loaded highlighter backend.
pub enum Highlighter {
    /// In-process syntect highlighting.
    HighlightJs(SyntectHighlighter),
    /// Out-of-process `pygmentize` highlighting.
    Pygmentize(PygmentizeHighlighter),
}

impl Highlighter {
    /// Load the backend for a resolved canonical kind.
    ///
    /// # Errors
    ///
    /// Returns [`HighlightError::Unavailable`] when the backend cannot be
    /// loaded, for example when the `pygmentize` command is missing.
    pub fn load(kind: HighlighterKind) -> Result<Self, HighlightError> {
        match kind {
            HighlighterKind::HighlightJs => Ok(Self::HighlightJs(SyntectHighlighter::new())),
            HighlighterKind::Pygmentize => Ok(Self::Pygmentize(PygmentizeHighlighter::load(
                PYGMENTIZE_COMMAND,
            )?)),
        }
    }

    /// Start highlighting one code block.
    #[must_use]
    pub fn start(&self, code: &str, lang: Option<&str>) -> HighlightJob {
        match self {
            Self::HighlightJs(backend) => HighlightJob::Direct(backend.highlight(code, lang)),
            Self::Pygmentize(backend) => HighlightJob::Deferred(backend.start(code, lang)),
        }
    }

    /// Highlight one code block and wait for the result.
    pub fn highlight(&self, code: &str, lang: Option<&str>) -> Result<String, HighlightError> {
        self.start(code, lang).wait()
    }
}

/// In-process highlighter over syntect's default syntax set.
///
/// Emits class-annotated `<span>` markup without a `<pre>` wrapper; the code
/// block hook owns the wrapping.
pub struct SyntectHighlighter {
    syntax_set: SyntaxSet,
}

impl SyntectHighlighter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
        }
    }

    fn find_syntax(&self, token: &str) -> Option<&SyntaxReference> {
        let lowercase = token.to_ascii_lowercase();
        self.syntax_set
            .find_syntax_by_token(&lowercase)
            .or_else(|| self.syntax_set.find_syntax_by_extension(&lowercase))
    }

    fn highlight(&self, code: &str, lang: Option<&str>) -> Result<String, HighlightError> {
        let token = lang.unwrap_or("text");
        let syntax = self
            .find_syntax(token)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        let mut source = code.to_owned();
        if !source.ends_with('\n') {
            source.push('\n');
        }

        let mut generator = ClassedHTMLGenerator::new_with_class_style(
            syntax,
            &self.syntax_set,
            ClassStyle::Spaced,
        );
        for line in LinesWithEndings::from(source.as_str()) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .map_err(|err| HighlightError::Invocation {
                    language: token.to_owned(),
                    message: err.to_string(),
                })?;
        }
        Ok(generator.finalize())
    }
}

impl Default for SyntectHighlighter {
    fn default() -> Self {
        Self::new()
    }
}

/// Out-of-process highlighter shelling out to `pygmentize`.
#[derive(Debug)]
pub struct PygmentizeHighlighter {
    command: String,
}

impl PygmentizeHighlighter {
    /// Probe the command and keep it for later invocations.
    ///
    /// # Errors
    ///
    /// Returns [`HighlightError::Unavailable`] when the command cannot be
    /// spawned or reports a failing status.
    pub fn load(command: &str) -> Result<Self, HighlightError> {
        let unavailable = |message: String| HighlightError::Unavailable {
            backend: command.to_owned(),
            message,
        };
        let status = Command::new(command)
            .arg("-V")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|err| unavailable(err.to_string()))?;
        if !status.success() {
            return Err(unavailable(format!("probe exited with {status}")));
        }
        Ok(Self {
            command: command.to_owned(),
        })
    }

    /// Start one invocation on a worker thread.
    ///
    /// The returned receiver gets exactly one message: the highlighted HTML
    /// or the invocation error.
    fn start(&self, code: &str, lang: Option<&str>) -> mpsc::Receiver<Result<String, HighlightError>> {
        let (tx, rx) = mpsc::channel();
        let command = self.command.clone();
        let code = code.to_owned();
        let lang = lang.map(str::to_owned);
        thread::spawn(move || {
            // Receiver may have been dropped; nothing to do then.
            let _ = tx.send(run_pygmentize(&command, &code, lang.as_deref()));
        });
        rx
    }
}

fn run_pygmentize(
    command: &str,
    code: &str,
    lang: Option<&str>,
) -> Result<String, HighlightError> {
    let language = lang.unwrap_or("text").to_owned();
    let invocation = |message: String| HighlightError::Invocation {
        language: language.clone(),
        message,
    };

    let mut cmd = Command::new(command);
    cmd.args(["-f", "html", "-O", "nowrap"]);
    match lang {
        Some(lang) => {
            cmd.args(["-l", lang]);
        }
        None => {
            // Let pygmentize guess the lexer.
            cmd.arg("-g");
        }
    }

    let mut child = cmd
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| invocation(err.to_string()))?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(code.as_bytes())
            .map_err(|err| invocation(err.to_string()))?;
    }

    let output = child
        .wait_with_output()
        .map_err(|err| invocation(err.to_string()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(invocation(format!(
            "exited with {}: {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .trim_end()
        .to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_syntect_highlights_known_language() {
        let backend = SyntectHighlighter::new();
        let html = backend.highlight("fn main() {}", Some("rust")).unwrap();
        assert!(html.contains("<span"));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_syntect_unknown_language_falls_back_to_plain() {
        let backend = SyntectHighlighter::new();
        let html = backend.highlight("plain words", Some("no-such-lang")).unwrap();
        assert!(html.contains("plain words"));
    }

    #[test]
    fn test_syntect_escapes_html_in_code() {
        let backend = SyntectHighlighter::new();
        let html = backend.highlight("<b>&</b>", None).unwrap();
        assert!(!html.contains("<b>"));
        assert!(html.contains("&lt;"));
    }

    #[test]
    fn test_direct_job_resolves_immediately() {
        let job = HighlightJob::Direct(Ok("done".to_owned()));
        assert_eq!(job.wait().unwrap(), "done");
    }

    #[test]
    fn test_deferred_job_delivers_one_result() {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            tx.send(Ok("<span>x</span>".to_owned())).unwrap();
        });
        let job = HighlightJob::Deferred(rx);
        assert_eq!(job.wait().unwrap(), "<span>x</span>");
    }

    #[test]
    fn test_deferred_job_worker_gone() {
        let (tx, rx) = mpsc::channel::<Result<String, HighlightError>>();
        drop(tx);
        let err = HighlightJob::Deferred(rx).wait().unwrap_err();
        assert!(matches!(err, HighlightError::WorkerDisconnected));
    }

    #[test]
    fn test_pygmentize_missing_command_is_unavailable() {
        let err = PygmentizeHighlighter::load("tagdoc-no-such-binary").unwrap_err();
        assert!(matches!(err, HighlightError::Unavailable { .. }));
    }

    #[test]
    fn test_load_highlightjs_always_succeeds() {
        assert!(Highlighter::load(HighlighterKind::HighlightJs).is_ok());
    }
}
