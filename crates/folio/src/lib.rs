//! Versioned history for a directory of text documents.
//!
//! This is the entry point used by command-line tools, file watchers and
//! automation. Each function opens the project's store with its on-disk
//! configuration, so callers only deal in project roots and version numbers.
//!
//! ```no_run
//! use std::path::Path;
//!
//! # fn example() -> folio::SnapshotResult<()> {
//! let root = Path::new("/project/root");
//! folio::init_logging(root);
//!
//! let first = folio::create_snapshot(root)?;
//! // ... edit docs/ ...
//! let second = folio::create_snapshot(root)?;
//!
//! let diffs = folio::diff_versions(root, first.version(), second.version())?;
//! print!("{}", folio::render_unified(&diffs));
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

pub use folio_diff::{
    compute_diff, compute_diff_with, diff_file, diff_file_with, diff_snapshots, edit_script,
    render_unified, DiffLine, DiffOptions, DiffSummary, FileDiff, FileStatus, Hunk, LineKind,
};
pub use folio_snapshot::{
    resolve_file_content, resolve_full_snapshot, GitInfo, Snapshot, SnapshotConfig,
    SnapshotError, SnapshotInfo, SnapshotResult, SnapshotStore, SquashMode, SquashResult,
};
pub use folio_util::path::find_project_root;
pub use folio_util::{LogConfig, LogLevel};

/// Install a stderr subscriber at the level configured for `project_root`.
///
/// Falls back to `info` when the configuration cannot be read. Returns
/// `false` if a global subscriber was already installed.
pub fn init_logging(project_root: &Path) -> bool {
    let level = SnapshotConfig::load(project_root)
        .ok()
        .and_then(|(config, _)| config.log_level)
        .unwrap_or_default();
    folio_util::log::init(LogConfig::stderr(level))
}

/// Take a snapshot of the project's tracked directory.
pub fn create_snapshot(project_root: &Path) -> SnapshotResult<SnapshotInfo> {
    SnapshotStore::open(project_root)?.create()
}

/// All snapshots of the project, oldest version first.
pub fn list_snapshots(project_root: &Path) -> SnapshotResult<Vec<Snapshot>> {
    SnapshotStore::open(project_root)?.list()
}

/// Full content of the snapshot at position `index` of `history`.
pub fn resolve_snapshot(
    history: &[Snapshot],
    index: usize,
) -> SnapshotResult<BTreeMap<String, String>> {
    resolve_full_snapshot(history, index)
}

/// Compare two path-to-content maps with the default context window.
pub fn diff_files(
    old: &BTreeMap<String, String>,
    new: &BTreeMap<String, String>,
) -> Vec<FileDiff> {
    diff_snapshots(old, new)
}

/// Squash versions `from..=to` with the project's configured mode.
pub fn squash_range(project_root: &Path, from: u32, to: u32) -> SnapshotResult<SquashResult> {
    let result = SnapshotStore::open(project_root)?.squash(from, to)?;
    if !result.reverted_files.is_empty() {
        tracing::warn!(
            reverted = ?result.reverted_files,
            "Later snapshots now resolve to older content"
        );
    }
    Ok(result)
}

/// Compare two versions of the project.
pub fn diff_versions(project_root: &Path, from: u32, to: u32) -> SnapshotResult<Vec<FileDiff>> {
    SnapshotStore::open(project_root)?.diff_versions(from, to)
}

/// Compare a version with the current working copy.
pub fn diff_working(project_root: &Path, version: u32) -> SnapshotResult<Vec<FileDiff>> {
    SnapshotStore::open(project_root)?.diff_working(version)
}
