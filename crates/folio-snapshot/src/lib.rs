//! Snapshot history for a directory of text documents.
//!
//! This crate provides versioning that enables:
//! - Point-in-time snapshots storing only changed files
//! - Reconstructing any version by walking the delta chain backward
//! - Diffs between versions, or between a version and the working copy
//! - Squashing a range of versions into one
//!
//! # Example
//!
//! ```no_run
//! use folio_snapshot::SnapshotStore;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SnapshotStore::open("/project/root")?;
//!
//! // Record the current state of the tracked directory
//! let info = store.create_with_note(Some("Before rewrite"))?;
//!
//! // ... edit the documents ...
//!
//! // Compare against the working copy
//! for diff in store.diff_working(info.version())? {
//!     println!("{}", diff.to_unified());
//! }
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod git;
mod resolve;
mod snapshot;
mod squash;
mod store;
pub mod timestamp;

pub use config::{SnapshotConfig, CONFIG_FILE_NAMES};
pub use error::{SnapshotError, SnapshotResult};
pub use git::GitInfo;
pub use resolve::{resolve_file_content, resolve_full_snapshot};
pub use snapshot::{next_version, position_of, Snapshot, SnapshotInfo, FILES_DIR, METADATA_FILE};
pub use squash::{SquashMode, SquashResult};
pub use store::SnapshotStore;
pub use timestamp::SnapshotDirName;
