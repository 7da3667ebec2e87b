//! Line-level diff engine for folio.
//!
//! Given two text blobs, this crate produces an ordered, hunked edit script:
//! - [`edit_script`] computes the flat list of context/added/removed lines
//!   from a longest-common-subsequence table
//! - [`compute_diff`] groups that script into hunks with surrounding context
//! - [`diff_file`] and [`diff_snapshots`] classify whole files and file sets
//! - [`render_unified`] prints the result in unified diff format
//!
//! Everything here is pure: no I/O, no errors on any string input.
//!
//! # Example
//!
//! ```
//! use folio_diff::{compute_diff, LineKind};
//!
//! let hunks = compute_diff("a\nb\nc\n", "a\nx\nc\n");
//! assert_eq!(hunks.len(), 1);
//!
//! let kinds: Vec<LineKind> = hunks[0].lines.iter().map(|l| l.kind).collect();
//! assert_eq!(
//!     kinds,
//!     vec![LineKind::Context, LineKind::Removed, LineKind::Added, LineKind::Context]
//! );
//! ```

mod file;
mod hunk;
mod lcs;
mod render;

pub use file::{
    diff_file, diff_file_with, diff_snapshots, diff_snapshots_with, DiffSummary, FileDiff,
    FileStatus,
};
pub use hunk::{compute_diff, compute_diff_with, group_hunks, Hunk};
pub use lcs::{edit_script, split_lines, DiffLine, LineKind};
pub use render::render_unified;

/// Default number of context lines around each change.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Options controlling hunk assembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffOptions {
    /// Lines of unchanged context kept before and after each change.
    pub context_lines: usize,
}

impl Default for DiffOptions {
    fn default() -> Self {
        Self {
            context_lines: DEFAULT_CONTEXT_LINES,
        }
    }
}

impl DiffOptions {
    /// Options with the given context window.
    pub fn with_context(context_lines: usize) -> Self {
        Self { context_lines }
    }
}
