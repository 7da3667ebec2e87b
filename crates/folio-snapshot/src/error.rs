//! Snapshot error types.

use thiserror::Error;

/// Result type for snapshot operations.
pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Errors that can occur during snapshot operations.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// No snapshot carries the requested version number.
    #[error("Snapshot not found: version {0}")]
    NotFound(u32),

    /// A history position outside the listed snapshots.
    #[error("History index {index} out of range ({len} snapshots)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Squash range rejected before anything was touched.
    #[error("Invalid squash range v{from}..v{to}: {reason}")]
    InvalidRange { from: u32, to: u32, reason: String },

    /// A relative file path that would escape its storage location.
    #[error("Invalid file path: {0}")]
    InvalidPath(String),

    /// Configuration file could not be parsed.
    #[error("Invalid configuration in {path}: {message}")]
    Config { path: String, message: String },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Directory traversal error.
    #[error("Directory walk error: {0}")]
    Walk(#[from] walkdir::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Operation failed.
    #[error("Snapshot operation failed: {0}")]
    OperationFailed(String),
}

impl SnapshotError {
    /// Create a not found error.
    pub fn not_found(version: u32) -> Self {
        Self::NotFound(version)
    }

    /// Create an invalid range error.
    pub fn invalid_range(from: u32, to: u32, reason: impl Into<String>) -> Self {
        Self::InvalidRange {
            from,
            to,
            reason: reason.into(),
        }
    }

    /// Create an invalid path error.
    pub fn invalid_path(path: impl Into<String>) -> Self {
        Self::InvalidPath(path.into())
    }

    /// Create an operation failed error.
    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::OperationFailed(message.into())
    }
}
