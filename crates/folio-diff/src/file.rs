//! Per-file and per-snapshot comparisons.

use crate::hunk::{compute_diff_with, Hunk};
use crate::lcs::{split_lines, DiffLine, LineKind};
use crate::DiffOptions;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// How a file differs between two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Added,
    Removed,
    Modified,
    Unchanged,
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Added => write!(f, "added"),
            FileStatus::Removed => write!(f, "removed"),
            FileStatus::Modified => write!(f, "modified"),
            FileStatus::Unchanged => write!(f, "unchanged"),
        }
    }
}

/// The diff of a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDiff {
    /// Relative path of the file.
    pub path: String,
    pub status: FileStatus,
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// Number of added lines across all hunks.
    pub fn additions(&self) -> usize {
        self.count(LineKind::Added)
    }

    /// Number of removed lines across all hunks.
    pub fn deletions(&self) -> usize {
        self.count(LineKind::Removed)
    }

    fn count(&self, kind: LineKind) -> usize {
        self.hunks
            .iter()
            .flat_map(|h| h.lines.iter())
            .filter(|l| l.kind == kind)
            .count()
    }
}

/// Aggregate statistics for a set of file diffs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub files_changed: usize,
    pub files_added: usize,
    pub files_removed: usize,
    pub additions: usize,
    pub deletions: usize,
}

impl DiffSummary {
    pub fn from_diffs(diffs: &[FileDiff]) -> Self {
        let mut summary = Self::default();
        for diff in diffs {
            match diff.status {
                FileStatus::Unchanged => continue,
                FileStatus::Added => summary.files_added += 1,
                FileStatus::Removed => summary.files_removed += 1,
                FileStatus::Modified => {}
            }
            summary.files_changed += 1;
            summary.additions += diff.additions();
            summary.deletions += diff.deletions();
        }
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.files_changed == 0
    }
}

/// A single hunk covering a whole file that exists on one side only.
fn whole_file_hunk(content: &str, kind: LineKind) -> Hunk {
    let lines: Vec<DiffLine> = split_lines(content)
        .into_iter()
        .map(|line| DiffLine::new(kind, line))
        .collect();
    let count = lines.len();

    match kind {
        LineKind::Added => Hunk {
            old_start: 0,
            old_count: 0,
            new_start: 1,
            new_count: count,
            lines,
        },
        _ => Hunk {
            old_start: 1,
            old_count: count,
            new_start: 0,
            new_count: 0,
            lines,
        },
    }
}

/// Classify and diff one file with the default context window.
pub fn diff_file(path: &str, old: Option<&str>, new: Option<&str>) -> FileDiff {
    diff_file_with(path, old, new, &DiffOptions::default())
}

/// Classify and diff one file.
///
/// A missing old side is `added`, a missing new side is `removed`; both
/// missing or equal content is `unchanged` with no hunks.
pub fn diff_file_with(
    path: &str,
    old: Option<&str>,
    new: Option<&str>,
    options: &DiffOptions,
) -> FileDiff {
    let (status, hunks) = match (old, new) {
        (None, None) => (FileStatus::Unchanged, Vec::new()),
        (None, Some(new)) => (FileStatus::Added, vec![whole_file_hunk(new, LineKind::Added)]),
        (Some(old), None) => (
            FileStatus::Removed,
            vec![whole_file_hunk(old, LineKind::Removed)],
        ),
        (Some(old), Some(new)) if old == new => (FileStatus::Unchanged, Vec::new()),
        (Some(old), Some(new)) => (FileStatus::Modified, compute_diff_with(old, new, options)),
    };

    FileDiff {
        path: path.to_string(),
        status,
        hunks,
    }
}

/// Diff two path-to-content maps with the default context window.
pub fn diff_snapshots(
    old_files: &BTreeMap<String, String>,
    new_files: &BTreeMap<String, String>,
) -> Vec<FileDiff> {
    diff_snapshots_with(old_files, new_files, &DiffOptions::default())
}

/// Diff two path-to-content maps.
///
/// Paths from both sides are visited in lexicographic order and unchanged
/// files are left out of the result.
pub fn diff_snapshots_with(
    old_files: &BTreeMap<String, String>,
    new_files: &BTreeMap<String, String>,
    options: &DiffOptions,
) -> Vec<FileDiff> {
    let paths: BTreeSet<&String> = old_files.keys().chain(new_files.keys()).collect();

    paths
        .into_iter()
        .map(|path| {
            diff_file_with(
                path,
                old_files.get(path).map(String::as_str),
                new_files.get(path).map(String::as_str),
                options,
            )
        })
        .filter(|diff| diff.status != FileStatus::Unchanged)
        .collect()
}
