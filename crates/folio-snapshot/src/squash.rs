//! Collapsing a range of versions into one.
//!
//! Live snapshot directories are never edited in place. Fold output is
//! assembled in a staging copy of the retained snapshot, and absorbed
//! snapshots are renamed to hidden names that `list` skips. Only once the
//! retained metadata is committed are the hidden directories deleted; any
//! earlier failure puts every directory back.

use crate::error::{SnapshotError, SnapshotResult};
use crate::resolve::resolve_file_content;
use crate::snapshot::{list_stored_files, Snapshot, FILES_DIR};
use crate::store::SnapshotStore;
use chrono::{SubsecRound, Utc};
use folio_util::path::safe_join;
use folio_util::TimingGuard;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How a squash treats content stored by the snapshots it removes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SquashMode {
    /// Keep the retained snapshot unchanged and delete the others.
    ///
    /// Content that only the removed snapshots stored is lost, so later
    /// versions that relied on it resolve to older content. Affected paths
    /// are reported in [`SquashResult::reverted_files`].
    #[default]
    Lossy,

    /// Move the newest in-range content into the retained snapshot first.
    ///
    /// The retained version then reads as the last version of the range,
    /// and every later version resolves exactly as before.
    Fold,
}

/// Outcome of a squash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SquashResult {
    /// Version that absorbed the range.
    pub retained: u32,
    /// Versions whose storage was deleted.
    pub removed_versions: Vec<u32>,
    pub mode: SquashMode,
    /// `(version, path)` pairs that now resolve differently than before.
    pub reverted_files: Vec<(u32, String)>,
    /// Paths written into the retained snapshot (fold only).
    pub materialized_files: Vec<String>,
}

impl SnapshotStore {
    /// Squash versions `from..=to` using the configured mode.
    pub fn squash(&self, from: u32, to: u32) -> SnapshotResult<SquashResult> {
        self.squash_with_mode(from, to, self.config().squash_mode)
    }

    /// Squash versions `from..=to` into the lowest version in the range.
    ///
    /// The range is validated before anything is touched, and a failure
    /// part way leaves the history as it was.
    pub fn squash_with_mode(
        &self,
        from: u32,
        to: u32,
        mode: SquashMode,
    ) -> SnapshotResult<SquashResult> {
        let _timing = TimingGuard::snapshot("squash");

        if from >= to {
            return Err(SnapshotError::invalid_range(
                from,
                to,
                "start must be lower than end",
            ));
        }

        let history = self.list()?;
        let in_range: Vec<usize> = history
            .iter()
            .enumerate()
            .filter(|(_, s)| (from..=to).contains(&s.version))
            .map(|(i, _)| i)
            .collect();

        let (first, last) = match (in_range.first(), in_range.last()) {
            (Some(&first), Some(&last)) if in_range.len() >= 2 => (first, last),
            _ => {
                return Err(SnapshotError::invalid_range(
                    from,
                    to,
                    format!("{} snapshot(s) in range, need at least 2", in_range.len()),
                ))
            }
        };

        let range = SquashRange {
            history: &history,
            first,
            last,
        };
        let mut retained = history[first].clone();
        let staging = hidden_sibling(&retained, "staging");

        let outcome = range.apply(&mut retained, mode, &staging);
        if outcome.is_err() && staging.exists() {
            if let Err(e) = fs::remove_dir_all(&staging) {
                warn!(path = %staging.display(), error = %e, "Failed to remove squash staging directory");
            }
        }
        let (materialized_files, reverted_files) = outcome?;

        let removed_versions: Vec<u32> = range.absorbed().iter().map(|s| s.version).collect();
        info!(
            retained = retained.version,
            removed = removed_versions.len(),
            mode = ?mode,
            "Squashed snapshots"
        );

        Ok(SquashResult {
            retained: retained.version,
            removed_versions,
            mode,
            reverted_files,
            materialized_files,
        })
    }
}

/// History positions `first..=last` of a validated squash.
struct SquashRange<'a> {
    history: &'a [Snapshot],
    first: usize,
    last: usize,
}

impl SquashRange<'_> {
    fn absorbed(&self) -> &[Snapshot] {
        &self.history[self.first + 1..=self.last]
    }

    /// Prepare, commit, then clean up. Returns the materialized paths and
    /// the reverted `(version, path)` pairs.
    fn apply(
        &self,
        retained: &mut Snapshot,
        mode: SquashMode,
        staging: &Path,
    ) -> SnapshotResult<(Vec<String>, Vec<(u32, String)>)> {
        let materialized = match mode {
            SquashMode::Lossy => Vec::new(),
            SquashMode::Fold => self.fold_into(retained, staging)?,
        };

        let survivors: Vec<Snapshot> = self
            .history
            .iter()
            .enumerate()
            .filter(|(i, _)| *i <= self.first || *i > self.last)
            .map(|(i, s)| {
                if i != self.first {
                    return s.clone();
                }
                let mut view = retained.clone();
                if mode == SquashMode::Fold {
                    view.location = staging.to_path_buf();
                }
                view
            })
            .collect();
        let reverted = self.reverted_in(&survivors)?;
        if mode == SquashMode::Lossy && !reverted.is_empty() {
            warn!(
                retained = retained.version,
                reverted = reverted.len(),
                "Squash dropped content that later versions relied on"
            );
        }

        let hidden = hide(self.absorbed())?;

        let mut provenance: BTreeSet<u32> = retained
            .squashed_from
            .take()
            .unwrap_or_default()
            .into_iter()
            .collect();
        provenance.insert(retained.version);
        provenance.extend(self.absorbed().iter().map(|s| s.version));
        retained.squashed_from = Some(provenance.into_iter().collect());
        retained.squashed_at = Some(Utc::now().trunc_subsecs(3));

        let committed = match mode {
            SquashMode::Lossy => retained.write_metadata(&retained.location),
            SquashMode::Fold => retained
                .write_metadata(staging)
                .and_then(|_| swap_in(staging, retained)),
        };
        if let Err(e) = committed {
            restore(&hidden);
            return Err(e);
        }

        for (_, hidden_path) in &hidden {
            match fs::remove_dir_all(hidden_path) {
                Ok(()) => debug!(path = %hidden_path.display(), "Removed squashed snapshot"),
                Err(e) => warn!(
                    path = %hidden_path.display(),
                    error = %e,
                    "Failed to remove squashed snapshot, it is no longer listed"
                ),
            }
        }

        Ok((materialized, reverted))
    }

    /// Assemble the retained snapshot's new storage in `staging`.
    ///
    /// The staged copy holds the content of the range's last version plus
    /// any older copy a later version still reads. Returns the paths whose
    /// content was brought forward from the absorbed snapshots.
    fn fold_into(&self, retained: &mut Snapshot, staging: &Path) -> SnapshotResult<Vec<String>> {
        if staging.exists() {
            fs::remove_dir_all(staging)?;
        }
        let files_dir = staging.join(FILES_DIR);
        fs::create_dir_all(&files_dir)?;

        let listing = &self.history[self.last].files;
        let keep = |path: &str| listing.iter().any(|f| f == path) || self.read_later(path);

        let mut stored = BTreeSet::new();
        for path in list_stored_files(&retained.files_dir())? {
            if !keep(path.as_str()) {
                debug!(version = retained.version, path = %path, "Dropping copy no version reads");
                continue;
            }
            let source = retained
                .stored_path(&path)
                .ok_or_else(|| SnapshotError::invalid_path(&path))?;
            write_stored(&files_dir, &path, &fs::read(source)?)?;
            stored.insert(path);
        }

        let mut candidates = BTreeSet::new();
        for snapshot in self.absorbed() {
            candidates.extend(list_stored_files(&snapshot.files_dir())?);
        }

        let mut materialized = Vec::new();
        for path in candidates {
            if !keep(path.as_str()) {
                continue;
            }
            let Some(content) = resolve_file_content(self.history, self.last, &path)? else {
                continue;
            };
            let before = resolve_file_content(self.history, self.first, &path)?;
            if before.as_deref() == Some(content.as_str()) {
                continue;
            }

            write_stored(&files_dir, &path, content.as_bytes())?;
            stored.insert(path.clone());
            materialized.push(path);
        }

        retained.files = listing.clone();
        retained.changed_files = Some(stored.into_iter().collect());
        Ok(materialized)
    }

    /// Whether a version after the range reads `path` through the
    /// retained snapshot.
    fn read_later(&self, path: &str) -> bool {
        for snapshot in &self.history[self.last + 1..] {
            if snapshot.stores(path) {
                return false;
            }
            if snapshot.contains_file(path) {
                return true;
            }
        }
        false
    }

    /// Compare every version after the range in the current history and in
    /// `survivors`.
    fn reverted_in(&self, survivors: &[Snapshot]) -> SnapshotResult<Vec<(u32, String)>> {
        let mut reverted = Vec::new();
        for (offset, snapshot) in self.history[self.last + 1..].iter().enumerate() {
            let old_index = self.last + 1 + offset;
            let new_index = self.first + 1 + offset;
            for path in &snapshot.files {
                let before = resolve_file_content(self.history, old_index, path)?;
                let after = resolve_file_content(survivors, new_index, path)?;
                if before != after {
                    reverted.push((snapshot.version, path.clone()));
                }
            }
        }
        Ok(reverted)
    }
}

/// `.<kind>-v<version>` next to a snapshot directory.
fn hidden_sibling(snapshot: &Snapshot, kind: &str) -> PathBuf {
    snapshot
        .location
        .with_file_name(format!(".{kind}-v{}", snapshot.version))
}

fn write_stored(files_dir: &Path, path: &str, content: &[u8]) -> SnapshotResult<()> {
    let dest = safe_join(files_dir, path).ok_or_else(|| SnapshotError::invalid_path(path))?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&dest, content)?;
    Ok(())
}

/// Rename absorbed snapshots out of the listing. On failure the ones
/// already moved are put back.
fn hide(absorbed: &[Snapshot]) -> SnapshotResult<Vec<(PathBuf, PathBuf)>> {
    let mut hidden = Vec::with_capacity(absorbed.len());
    for snapshot in absorbed {
        let target = hidden_sibling(snapshot, "squashed");
        if let Err(e) = fs::rename(&snapshot.location, &target) {
            restore(&hidden);
            return Err(e.into());
        }
        hidden.push((snapshot.location.clone(), target));
    }
    Ok(hidden)
}

fn restore(hidden: &[(PathBuf, PathBuf)]) {
    for (original, target) in hidden.iter().rev() {
        if let Err(e) = fs::rename(target, original) {
            warn!(
                path = %original.display(),
                error = %e,
                "Failed to restore snapshot directory after aborted squash"
            );
        }
    }
}

/// Replace the retained snapshot's directory with the staged one.
fn swap_in(staging: &Path, retained: &Snapshot) -> SnapshotResult<()> {
    let replaced = hidden_sibling(retained, "replaced");
    fs::rename(&retained.location, &replaced)?;

    if let Err(e) = fs::rename(staging, &retained.location) {
        if let Err(undo) = fs::rename(&replaced, &retained.location) {
            warn!(
                path = %retained.location.display(),
                error = %undo,
                "Failed to restore retained snapshot after aborted squash"
            );
        }
        return Err(e.into());
    }

    if let Err(e) = fs::remove_dir_all(&replaced) {
        warn!(path = %replaced.display(), error = %e, "Failed to remove replaced snapshot copy");
    }
    Ok(())
}
