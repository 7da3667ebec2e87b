//! Test fixtures for creating reproducible document projects.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Default tracked directory used by [`TestProject::with_doc`].
pub const DOCS_DIR: &str = "docs";

/// A temporary test project with configurable file structure.
///
/// The backing directory is removed when the built project is dropped.
///
/// # Example
///
/// ```rust
/// use folio_test_utils::fixtures::TestProject;
///
/// let project = TestProject::new()
///     .with_doc("guide/setup.md", "Install it.\n")
///     .with_dir("docs/empty")
///     .build();
///
/// assert!(project.path().join("docs/guide/setup.md").exists());
/// ```
pub struct TestProject {
    temp_dir: TempDir,
    /// Files to create (path relative to root -> contents).
    files: BTreeMap<PathBuf, String>,
    dirs: Vec<PathBuf>,
}

impl TestProject {
    /// Create a new test project builder.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
            files: BTreeMap::new(),
            dirs: Vec::new(),
        }
    }

    /// Add a file relative to the project root.
    pub fn with_file(mut self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        self.files
            .insert(path.as_ref().to_path_buf(), contents.into());
        self
    }

    /// Add a document under the default tracked directory.
    pub fn with_doc(self, path: impl AsRef<Path>, contents: impl Into<String>) -> Self {
        let path = Path::new(DOCS_DIR).join(path);
        self.with_file(path, contents)
    }

    /// Add an empty directory to the project.
    pub fn with_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.dirs.push(path.as_ref().to_path_buf());
        self
    }

    /// Add a `folio.json` configuration file.
    pub fn with_config(self, config: &str) -> Self {
        self.with_file("folio.json", config)
    }

    /// Build the project, creating all files and directories.
    pub fn build(self) -> BuiltTestProject {
        let root = self.temp_dir.path();

        for dir in &self.dirs {
            let full_path = root.join(dir);
            fs::create_dir_all(&full_path).unwrap_or_else(|e| {
                panic!("Failed to create directory {}: {}", full_path.display(), e)
            });
        }

        for (path, contents) in &self.files {
            let full_path = root.join(path);
            write_with_parents(&full_path, contents);
        }

        BuiltTestProject {
            temp_dir: self.temp_dir,
        }
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// A built test project with files created on disk.
pub struct BuiltTestProject {
    temp_dir: TempDir,
}

impl BuiltTestProject {
    /// Get the path to the project root.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Default tracked directory of this project.
    pub fn docs_dir(&self) -> PathBuf {
        self.path().join(DOCS_DIR)
    }

    /// Read a file from the project.
    pub fn read_file(&self, path: impl AsRef<Path>) -> String {
        let full_path = self.path().join(path.as_ref());
        fs::read_to_string(&full_path)
            .unwrap_or_else(|e| panic!("Failed to read file {}: {}", full_path.display(), e))
    }

    /// Check if a file exists in the project.
    pub fn file_exists(&self, path: impl AsRef<Path>) -> bool {
        self.path().join(path.as_ref()).exists()
    }

    /// Write a file, creating parent directories.
    pub fn write_file(&self, path: impl AsRef<Path>, contents: impl AsRef<str>) {
        write_with_parents(&self.path().join(path.as_ref()), contents.as_ref());
    }

    /// Write a document under the default tracked directory.
    pub fn write_doc(&self, path: impl AsRef<Path>, contents: impl AsRef<str>) {
        self.write_file(Path::new(DOCS_DIR).join(path), contents);
    }

    /// Delete a file from the project.
    pub fn delete_file(&self, path: impl AsRef<Path>) {
        let full_path = self.path().join(path.as_ref());
        fs::remove_file(&full_path)
            .unwrap_or_else(|e| panic!("Failed to delete file {}: {}", full_path.display(), e));
    }
}

fn write_with_parents(full_path: &Path, contents: &str) {
    if let Some(parent) = full_path.parent() {
        fs::create_dir_all(parent).unwrap_or_else(|e| {
            panic!(
                "Failed to create parent directory for {}: {}",
                full_path.display(),
                e
            )
        });
    }
    fs::write(full_path, contents)
        .unwrap_or_else(|e| panic!("Failed to write file {}: {}", full_path.display(), e));
}

/// Common document contents.
pub mod content {
    /// A markdown document with numbered lines, handy for hunk tests.
    pub fn numbered(count: usize) -> String {
        (1..=count).map(|n| format!("line {n}\n")).collect()
    }
}
