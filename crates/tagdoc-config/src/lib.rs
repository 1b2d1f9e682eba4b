//! Configuration management for tagdoc.
//!
//! Parses `tagdoc.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories. A missing config
//! file is not an error; defaults apply.
//!
//! The `[markdown]` section controls how documentation comments are turned
//! into HTML. Parser and highlighter names are deliberately NOT validated
//! here: unknown names must reach the renderer's registry, which reports
//! them and degrades gracefully instead of failing the whole run.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "tagdoc.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Markdown rendering configuration.
    pub markdown: MarkdownConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Markdown rendering configuration.
///
/// Read once at startup; immutable for the rest of the process.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarkdownConfig {
    /// Markdown parser name. Accepts the canonical name and legacy aliases.
    pub parser: String,
    /// Treat single line breaks as forced line breaks in output.
    pub hardwrap: bool,
    /// Emit anchor ids on headings.
    pub id_in_headings: bool,
    /// Syntax highlighting: `false`, `true`, or a backend name.
    pub highlight: HighlightSetting,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            parser: "marked".to_owned(),
            hardwrap: false,
            id_in_headings: false,
            highlight: HighlightSetting::default(),
        }
    }
}

/// The `markdown.highlight` value, which is either a boolean or a backend name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum HighlightSetting {
    /// `highlight = true` enables the default backend, `false` disables.
    Enabled(bool),
    /// `highlight = "pygmentize"` selects a backend by name.
    Backend(String),
}

impl Default for HighlightSetting {
    fn default() -> Self {
        Self::Enabled(false)
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

impl Config {
    /// Load configuration from file.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise,
    /// searches for `tagdoc.toml` in the current directory and parents,
    /// falling back to defaults when nothing is found.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicit `config_path` doesn't exist or if
    /// parsing fails.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)
        } else {
            Ok(Self::default())
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }
}
