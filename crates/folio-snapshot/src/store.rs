//! Snapshot storage implementation.

use crate::config::SnapshotConfig;
use crate::error::{SnapshotError, SnapshotResult};
use crate::git::{self, GitInfo};
use crate::resolve::{resolve_file_content, resolve_full_snapshot};
use crate::snapshot::{next_version, position_of, Snapshot, SnapshotInfo, FILES_DIR};
use crate::timestamp::SnapshotDirName;
use chrono::{SubsecRound, Utc};
use folio_diff::{diff_snapshots_with, FileDiff};
use folio_util::path::{safe_join, to_slash};
use folio_util::TimingGuard;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Storage for document snapshots.
///
/// Each snapshot owns one directory under the history root:
/// ```text
/// <history_root>/
///   v1_20250114-093005/
///     metadata.json      # Snapshot descriptor
///     files/
///       <relative_path>  # Only files that changed since v0
///   v2_20250114-101200/
///     metadata.json
///     files/...
/// ```
///
/// The store keeps no state between calls; every operation re-reads the
/// history from disk. Callers must not run two mutating operations on the
/// same project at once.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    /// Root directory of the project.
    project_root: PathBuf,

    /// Configuration.
    config: SnapshotConfig,
}

impl SnapshotStore {
    /// Create a store over `project_root` with an explicit configuration.
    pub fn new(project_root: impl Into<PathBuf>, config: SnapshotConfig) -> Self {
        Self {
            project_root: project_root.into(),
            config,
        }
    }

    /// Open a store, loading `folio.json(c)` from the project root.
    pub fn open(project_root: impl Into<PathBuf>) -> SnapshotResult<Self> {
        let project_root = project_root.into();
        let (config, source) = SnapshotConfig::load(&project_root)?;
        if let Some(source) = source {
            debug!(config = %source.display(), "Loaded snapshot configuration");
        }
        Ok(Self::new(project_root, config))
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// Directory of tracked documents.
    pub fn tracked_root(&self) -> PathBuf {
        self.config.tracked_root(&self.project_root)
    }

    /// Directory holding snapshot storage.
    pub fn history_root(&self) -> PathBuf {
        self.config.history_root(&self.project_root)
    }

    /// Take a snapshot of the tracked directory.
    pub fn create(&self) -> SnapshotResult<SnapshotInfo> {
        self.create_with_note(None)
    }

    /// Take a snapshot with an initial note.
    ///
    /// Only files whose content differs from what the previous snapshot
    /// resolves to are copied. An empty tracked directory still produces a
    /// snapshot, with no files.
    pub fn create_with_note(&self, note: Option<&str>) -> SnapshotResult<SnapshotInfo> {
        let _timing = TimingGuard::snapshot("create");

        let history = self.list()?;
        let version = next_version(&history);
        let timestamp = Utc::now().trunc_subsecs(3);
        let git = self.capture_git();
        let working = self.read_working_copy()?;

        let history_root = self.history_root();
        fs::create_dir_all(&history_root)?;

        let staging = history_root.join(format!(".staging-v{version}"));
        if staging.exists() {
            fs::remove_dir_all(&staging)?;
        }

        let location = history_root.join(SnapshotDirName::new(version, timestamp).to_string());
        if location.exists() {
            return Err(SnapshotError::operation_failed(format!(
                "snapshot directory {} already exists",
                location.display()
            )));
        }

        let mut snapshot = Snapshot {
            version,
            timestamp,
            files: working.keys().cloned().collect(),
            changed_files: None,
            note: note.map(|n| n.to_string()),
            git,
            squashed_from: None,
            squashed_at: None,
            location: location.clone(),
        };

        let staged = self.stage_files(&history, &working, &staging);
        let (changed, unchanged) = match staged {
            Ok(split) => split,
            Err(e) => {
                let _ = fs::remove_dir_all(&staging);
                return Err(e);
            }
        };
        snapshot.changed_files = Some(changed.clone());

        // Metadata goes in last, then the directory becomes visible.
        if let Err(e) = snapshot
            .write_metadata(&staging)
            .and_then(|_| fs::rename(&staging, &location).map_err(SnapshotError::from))
        {
            let _ = fs::remove_dir_all(&staging);
            return Err(e);
        }

        info!(
            version,
            files = snapshot.files.len(),
            changed = changed.len(),
            "Created snapshot"
        );

        Ok(SnapshotInfo {
            snapshot,
            changed,
            unchanged,
        })
    }

    /// Copy changed files into `staging`, returning (changed, unchanged).
    fn stage_files(
        &self,
        history: &[Snapshot],
        working: &BTreeMap<String, String>,
        staging: &Path,
    ) -> SnapshotResult<(Vec<String>, Vec<String>)> {
        let files_dir = staging.join(FILES_DIR);
        fs::create_dir_all(&files_dir)?;

        let previous = history.len().checked_sub(1);
        let mut changed = Vec::new();
        let mut unchanged = Vec::new();

        for (path, content) in working {
            let prior = match previous {
                Some(index) => resolve_file_content(history, index, path)?,
                None => None,
            };

            if prior.as_deref() == Some(content.as_str()) {
                debug!(path = %path, "Unchanged, not copied");
                unchanged.push(path.clone());
                continue;
            }

            let dest = safe_join(&files_dir, path).ok_or_else(|| SnapshotError::invalid_path(path))?;
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&dest, content)?;
            debug!(path = %path, "Stored");
            changed.push(path.clone());
        }

        Ok((changed, unchanged))
    }

    fn capture_git(&self) -> Option<GitInfo> {
        if !self.config.capture_git {
            return None;
        }
        match git::capture(&self.project_root) {
            Ok(info) => info,
            Err(e) => {
                warn!(error = %e, "Failed to capture git state");
                None
            }
        }
    }

    /// List all snapshots, oldest version first.
    ///
    /// Directories whose names are not snapshot names are skipped. A
    /// snapshot with missing or malformed metadata is still listed.
    pub fn list(&self) -> SnapshotResult<Vec<Snapshot>> {
        let history_root = self.history_root();
        let entries = match fs::read_dir(&history_root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut history = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let name = entry.file_name();
            let Some(dir_name) = name.to_str().and_then(SnapshotDirName::parse) else {
                debug!(entry = ?name, "Skipping non-snapshot entry");
                continue;
            };
            history.push(Snapshot::load(&entry.path(), &dir_name));
        }

        history.sort_by(|a, b| {
            a.version
                .cmp(&b.version)
                .then_with(|| a.timestamp.cmp(&b.timestamp))
        });
        Ok(history)
    }

    /// Get a snapshot by version.
    pub fn get(&self, version: u32) -> SnapshotResult<Snapshot> {
        self.list()?
            .into_iter()
            .find(|s| s.version == version)
            .ok_or(SnapshotError::not_found(version))
    }

    /// Replace the note of a snapshot.
    pub fn set_note(&self, version: u32, note: Option<&str>) -> SnapshotResult<Snapshot> {
        let mut snapshot = self.get(version)?;
        snapshot.note = note.map(|n| n.to_string());
        snapshot.write_metadata(&snapshot.location)?;
        info!(version, "Updated snapshot note");
        Ok(snapshot)
    }

    /// Read the current tracked files as a path-to-content map.
    ///
    /// A missing tracked directory reads as empty. Files that are not valid
    /// UTF-8 are skipped with a warning.
    pub fn read_working_copy(&self) -> SnapshotResult<BTreeMap<String, String>> {
        let tracked_root = self.tracked_root();
        let history_root = self.history_root();
        let mut files = BTreeMap::new();

        if !tracked_root.is_dir() {
            return Ok(files);
        }

        let walker = WalkDir::new(&tracked_root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !e.path().starts_with(&history_root));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() || !self.config.tracks(entry.path()) {
                continue;
            }

            let Some(key) = entry
                .path()
                .strip_prefix(&tracked_root)
                .ok()
                .and_then(to_slash)
            else {
                warn!(path = %entry.path().display(), "Skipping file with unrepresentable path");
                continue;
            };

            match String::from_utf8(fs::read(entry.path())?) {
                Ok(content) => {
                    files.insert(key, content);
                }
                Err(_) => warn!(path = %key, "Skipping file that is not valid UTF-8"),
            }
        }

        Ok(files)
    }

    /// Resolve one file as of history position `from_index`.
    pub fn resolve_file_content(
        &self,
        history: &[Snapshot],
        from_index: usize,
        path: &str,
    ) -> SnapshotResult<Option<String>> {
        resolve_file_content(history, from_index, path)
    }

    /// Resolve every file of the snapshot at history position `index`.
    pub fn resolve_full_snapshot(
        &self,
        history: &[Snapshot],
        index: usize,
    ) -> SnapshotResult<BTreeMap<String, String>> {
        resolve_full_snapshot(history, index)
    }

    /// Resolve every file of a version by number.
    pub fn resolve_version(&self, version: u32) -> SnapshotResult<BTreeMap<String, String>> {
        let history = self.list()?;
        let index = position_of(&history, version).ok_or(SnapshotError::not_found(version))?;
        resolve_full_snapshot(&history, index)
    }

    /// Diff two versions.
    pub fn diff_versions(&self, from: u32, to: u32) -> SnapshotResult<Vec<FileDiff>> {
        let history = self.list()?;
        let from_index = position_of(&history, from).ok_or(SnapshotError::not_found(from))?;
        let to_index = position_of(&history, to).ok_or(SnapshotError::not_found(to))?;

        let old = resolve_full_snapshot(&history, from_index)?;
        let new = resolve_full_snapshot(&history, to_index)?;
        Ok(diff_snapshots_with(&old, &new, &self.config.diff_options()))
    }

    /// Diff a version against the working copy.
    pub fn diff_working(&self, version: u32) -> SnapshotResult<Vec<FileDiff>> {
        let old = self.resolve_version(version)?;
        let new = self.read_working_copy()?;
        Ok(diff_snapshots_with(&old, &new, &self.config.diff_options()))
    }
}
