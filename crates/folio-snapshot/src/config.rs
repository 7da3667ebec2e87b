//! Snapshot store configuration.
//!
//! Configuration is read from the project root:
//! 1. `folio.jsonc` or `folio.json` (first found)
//! 2. Environment overrides: `FOLIO_TRACKED_DIR`, `FOLIO_HISTORY_DIR`, `FOLIO_EXTENSION`
//!
//! Every field has a default, so a project without a config file works out
//! of the box. JSONC comments (`//` and `/* */`) are allowed.

use crate::error::{SnapshotError, SnapshotResult};
use crate::squash::SquashMode;
use folio_diff::{DiffOptions, DEFAULT_CONTEXT_LINES};
use folio_util::LogLevel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file names looked up in the project root, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["folio.jsonc", "folio.json"];

/// Configuration for snapshot storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SnapshotConfig {
    /// Directory of tracked documents, relative to the project root.
    pub tracked_dir: PathBuf,

    /// Directory holding snapshot storage, relative to the project root.
    pub history_dir: PathBuf,

    /// Extension of tracked files, without the leading dot.
    /// Empty or `*` tracks every file.
    pub extension: String,

    /// Lines of context around each change in rendered diffs.
    pub context_lines: usize,

    /// Whether to record git state on each snapshot.
    pub capture_git: bool,

    /// How squash treats the content of absorbed snapshots.
    pub squash_mode: SquashMode,

    /// Log level for callers that initialise logging from this config.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<LogLevel>,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            tracked_dir: PathBuf::from("docs"),
            history_dir: PathBuf::from(".folio").join("history"),
            extension: "md".to_string(),
            context_lines: DEFAULT_CONTEXT_LINES,
            capture_git: true,
            squash_mode: SquashMode::default(),
            log_level: None,
        }
    }
}

impl SnapshotConfig {
    /// Load configuration for a project.
    ///
    /// Returns the config and the file it was read from, if any.
    pub fn load(project_root: &Path) -> SnapshotResult<(Self, Option<PathBuf>)> {
        let mut config = Self::default();
        let mut source = None;

        for name in CONFIG_FILE_NAMES {
            let path = project_root.join(name);
            if path.is_file() {
                config = Self::load_file(&path)?;
                source = Some(path);
                break;
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok((config, source))
    }

    /// Load configuration from a file.
    pub fn load_file(path: &Path) -> SnapshotResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_jsonc(&content, &path.display().to_string())
    }

    /// Parse JSONC (JSON with comments).
    pub fn parse_jsonc(content: &str, source: &str) -> SnapshotResult<Self> {
        let stripped = strip_comments(content);
        let mut config: Self =
            serde_json::from_str(&stripped).map_err(|e| SnapshotError::Config {
                path: source.to_string(),
                message: e.to_string(),
            })?;
        config.extension = normalize_extension(&config.extension);
        Ok(config)
    }

    /// Apply `FOLIO_*` overrides from a variable lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(dir) = lookup("FOLIO_TRACKED_DIR").filter(|v| !v.is_empty()) {
            self.tracked_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("FOLIO_HISTORY_DIR").filter(|v| !v.is_empty()) {
            self.history_dir = PathBuf::from(dir);
        }
        if let Some(ext) = lookup("FOLIO_EXTENSION") {
            self.extension = normalize_extension(&ext);
        }
    }

    /// Absolute tracked directory for a project.
    pub fn tracked_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.tracked_dir)
    }

    /// Absolute history directory for a project.
    pub fn history_root(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.history_dir)
    }

    /// Diff options derived from this config.
    pub fn diff_options(&self) -> DiffOptions {
        DiffOptions::with_context(self.context_lines)
    }

    /// Whether a file with this path belongs to the tracked set.
    pub fn tracks(&self, path: &Path) -> bool {
        if self.extension.is_empty() || self.extension == "*" {
            return true;
        }
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.extension))
    }
}

fn normalize_extension(raw: &str) -> String {
    raw.trim().trim_start_matches('.').to_string()
}

/// Strip JSON comments, leaving string literals untouched.
fn strip_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    let mut in_string = false;
    let mut escape_next = false;

    while let Some(c) = chars.next() {
        if escape_next {
            result.push(c);
            escape_next = false;
            continue;
        }

        if in_string {
            if c == '\\' {
                escape_next = true;
            } else if c == '"' {
                in_string = false;
            }
            result.push(c);
            continue;
        }

        let next = chars.peek().copied();
        match (c, next) {
            ('"', _) => {
                in_string = true;
                result.push(c);
            }
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        result.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = ' ';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    // Keep line numbers stable for error messages
                    if c == '\n' {
                        result.push('\n');
                    }
                    prev = c;
                }
            }
            _ => result.push(c),
        }
    }

    result
}
