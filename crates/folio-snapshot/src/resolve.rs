//! Backward delta-chain resolution.
//!
//! A snapshot only stores the files that changed since its predecessor, so
//! the content of a file at some version is the most recent stored copy at
//! or before that version. Resolution walks the history backward until it
//! finds one.

use crate::error::{SnapshotError, SnapshotResult};
use crate::snapshot::Snapshot;
use std::collections::BTreeMap;
use std::io::ErrorKind;
use tracing::warn;

/// Resolve the content of `path` as of history position `from_index`.
///
/// Positions are walked from `from_index` (inclusive, clamped to the last
/// snapshot) down to 0. Returns `Ok(None)` when no snapshot in that range
/// stores the file.
pub fn resolve_file_content(
    history: &[Snapshot],
    from_index: usize,
    path: &str,
) -> SnapshotResult<Option<String>> {
    let Some(last) = history.len().checked_sub(1) else {
        return Ok(None);
    };
    let start = from_index.min(last);

    for snapshot in history[..=start].iter().rev() {
        let stored = snapshot
            .stored_path(path)
            .ok_or_else(|| SnapshotError::invalid_path(path))?;
        if !stored.is_file() {
            continue;
        }

        match std::fs::read_to_string(&stored) {
            Ok(content) => return Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(None)
}

/// Resolve every file listed by the snapshot at `target_index`.
///
/// Files that cannot be resolved, including listed paths that are not
/// valid relative keys, are left out and logged; a shrinking result means
/// storage was damaged, not that the call failed.
pub fn resolve_full_snapshot(
    history: &[Snapshot],
    target_index: usize,
) -> SnapshotResult<BTreeMap<String, String>> {
    let target = history
        .get(target_index)
        .ok_or(SnapshotError::IndexOutOfRange {
            index: target_index,
            len: history.len(),
        })?;

    let mut files = BTreeMap::new();
    for path in &target.files {
        if target.stored_path(path).is_none() {
            warn!(
                version = target.version,
                path = %path,
                "Skipping invalid path in snapshot listing"
            );
            continue;
        }

        match resolve_file_content(history, target_index, path)? {
            Some(content) => {
                files.insert(path.clone(), content);
            }
            None => warn!(
                version = target.version,
                path = %path,
                "File listed by snapshot has no stored copy"
            ),
        }
    }

    Ok(files)
}
