//! Snapshot data structures and the on-disk metadata descriptor.

use crate::error::SnapshotResult;
use crate::git::GitInfo;
use crate::timestamp::{self, SnapshotDirName};
use chrono::{DateTime, Utc};
use folio_util::path::{safe_join, to_slash};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// Name of the metadata descriptor inside a snapshot directory.
pub const METADATA_FILE: &str = "metadata.json";

/// Sub-directory holding the physically stored files of a snapshot.
pub const FILES_DIR: &str = "files";

/// One recorded version of the tracked directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Version number, unique within a history.
    pub version: u32,

    /// When the snapshot was taken.
    #[serde(with = "crate::timestamp::rfc3339")]
    pub timestamp: DateTime<Utc>,

    /// Every tracked path that existed at this version.
    pub files: Vec<String>,

    /// Paths physically stored by this snapshot. `None` means every entry
    /// of `files` is stored (older histories).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changed_files: Option<Vec<String>>,

    /// Free-text annotation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,

    /// Git state when the snapshot was taken.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<GitInfo>,

    /// Versions folded into this one by a squash.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub squashed_from: Option<Vec<u32>>,

    /// When the squash happened.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::timestamp::rfc3339_option"
    )]
    pub squashed_at: Option<DateTime<Utc>>,

    /// Storage directory of this snapshot.
    #[serde(skip)]
    pub location: PathBuf,
}

/// Lenient view of `metadata.json`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StoredMetadata {
    version: Option<u32>,
    timestamp: Option<String>,
    files: Vec<String>,
    changed_files: Option<Vec<String>>,
    note: Option<String>,
    git: Option<GitInfo>,
    squashed_from: Option<Vec<u32>>,
    squashed_at: Option<String>,
}

impl Snapshot {
    /// Directory holding the physically stored files.
    pub fn files_dir(&self) -> PathBuf {
        self.location.join(FILES_DIR)
    }

    /// Path of the metadata descriptor.
    pub fn metadata_path(&self) -> PathBuf {
        self.location.join(METADATA_FILE)
    }

    /// Where `path` would be stored by this snapshot, if `path` is a valid
    /// relative key.
    pub fn stored_path(&self, path: &str) -> Option<PathBuf> {
        safe_join(&self.files_dir(), path)
    }

    /// Whether this snapshot physically holds a copy of `path`.
    pub fn stores(&self, path: &str) -> bool {
        self.stored_path(path).is_some_and(|p| p.is_file())
    }

    /// Whether `path` is part of this version's file listing.
    pub fn contains_file(&self, path: &str) -> bool {
        self.files.iter().any(|f| f == path)
    }

    /// Paths this snapshot declares as stored.
    pub fn declared_stored(&self) -> &[String] {
        self.changed_files.as_deref().unwrap_or(&self.files)
    }

    /// Load a snapshot from its storage directory.
    ///
    /// Never fails: a missing or unreadable descriptor is rebuilt from the
    /// directory name and the stored files.
    pub fn load(location: &Path, dir_name: &SnapshotDirName) -> Self {
        let metadata_path = location.join(METADATA_FILE);
        let stored = match std::fs::read_to_string(&metadata_path) {
            Ok(content) => match serde_json::from_str::<StoredMetadata>(&content) {
                Ok(stored) => Some(stored),
                Err(e) => {
                    warn!(path = %metadata_path.display(), error = %e, "Malformed snapshot metadata, rebuilding from directory");
                    None
                }
            },
            Err(e) => {
                warn!(path = %metadata_path.display(), error = %e, "Missing snapshot metadata, rebuilding from directory");
                None
            }
        };

        match stored {
            Some(stored) => Self::from_stored(stored, location, dir_name),
            None => Self::reconstruct(location, dir_name),
        }
    }

    fn from_stored(stored: StoredMetadata, location: &Path, dir_name: &SnapshotDirName) -> Self {
        if let Some(version) = stored.version.filter(|v| *v != dir_name.version) {
            warn!(
                location = %location.display(),
                metadata_version = version,
                directory_version = dir_name.version,
                "Snapshot metadata disagrees with directory name, using directory"
            );
        }

        let timestamp = stored
            .timestamp
            .as_deref()
            .and_then(timestamp::parse_lenient)
            .unwrap_or(dir_name.timestamp);

        Self {
            version: dir_name.version,
            timestamp,
            files: stored.files,
            changed_files: stored.changed_files,
            note: stored.note,
            git: stored.git,
            squashed_from: stored.squashed_from,
            squashed_at: stored.squashed_at.as_deref().and_then(timestamp::parse_lenient),
            location: location.to_path_buf(),
        }
    }

    fn reconstruct(location: &Path, dir_name: &SnapshotDirName) -> Self {
        let files = list_stored_files(&location.join(FILES_DIR)).unwrap_or_else(|e| {
            warn!(location = %location.display(), error = %e, "Failed to list stored files");
            Vec::new()
        });

        Self {
            version: dir_name.version,
            timestamp: dir_name.timestamp,
            files,
            changed_files: None,
            note: None,
            git: None,
            squashed_from: None,
            squashed_at: None,
            location: location.to_path_buf(),
        }
    }

    /// Write the metadata descriptor into `dir` through a temp file.
    pub fn write_metadata(&self, dir: &Path) -> SnapshotResult<()> {
        let path = dir.join(METADATA_FILE);
        let temp_path = dir.join(format!("{METADATA_FILE}.tmp"));
        let content = serde_json::to_string_pretty(self)?;

        std::fs::write(&temp_path, content)?;
        std::fs::rename(&temp_path, &path)?;
        Ok(())
    }
}

/// Relative slash keys of every file under `files_dir`, sorted.
pub fn list_stored_files(files_dir: &Path) -> SnapshotResult<Vec<String>> {
    if !files_dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(files_dir).follow_links(false) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let key = entry
            .path()
            .strip_prefix(files_dir)
            .ok()
            .and_then(to_slash);
        if let Some(key) = key {
            files.push(key);
        }
    }
    files.sort();
    Ok(files)
}

/// The version the next snapshot gets.
///
/// `count + 1` for a contiguous history; after a squash has removed
/// interior versions this still stays above every existing version.
pub fn next_version(history: &[Snapshot]) -> u32 {
    let count = u32::try_from(history.len()).unwrap_or(u32::MAX);
    let highest = history.iter().map(|s| s.version).max().unwrap_or(0);
    count.max(highest).saturating_add(1)
}

/// Position of `version` within a history.
pub fn position_of(history: &[Snapshot], version: u32) -> Option<usize> {
    history.iter().position(|s| s.version == version)
}

/// Result of creating a snapshot.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotInfo {
    pub snapshot: Snapshot,
    /// Paths stored because their content changed or was new.
    pub changed: Vec<String>,
    /// Paths recorded but not copied because they were unchanged.
    pub unchanged: Vec<String>,
}

impl SnapshotInfo {
    pub fn version(&self) -> u32 {
        self.snapshot.version
    }

    /// Whether nothing differed from the previous snapshot.
    pub fn is_noop(&self) -> bool {
        self.changed.is_empty()
    }
}
