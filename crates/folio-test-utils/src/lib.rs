//! Testing utilities and fixtures for folio.
//!
//! - **Fixtures**: temporary projects with a tracked documents directory
//! - **Assertions**: helpers with readable failure output
//!
//! # Example Usage
//!
//! ```rust
//! use folio_test_utils::TestProject;
//!
//! let project = TestProject::new()
//!     .with_doc("intro.md", "# Intro\n")
//!     .with_config(r#"{"captureGit": false}"#)
//!     .build();
//!
//! assert!(project.path().join("docs/intro.md").exists());
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::assert_strings_equal;
pub use fixtures::{BuiltTestProject, TestProject};
