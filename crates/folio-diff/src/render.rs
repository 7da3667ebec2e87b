//! Unified diff rendering.

use crate::file::{FileDiff, FileStatus};
use std::fmt::Write;

impl FileDiff {
    /// Render this file diff in unified format.
    ///
    /// Unchanged files render as an empty string.
    pub fn to_unified(&self) -> String {
        if self.status == FileStatus::Unchanged {
            return String::new();
        }

        let old_label = match self.status {
            FileStatus::Added => "/dev/null".to_string(),
            _ => format!("a/{}", self.path),
        };
        let new_label = match self.status {
            FileStatus::Removed => "/dev/null".to_string(),
            _ => format!("b/{}", self.path),
        };

        let mut output = String::new();
        let _ = writeln!(output, "--- {old_label}");
        let _ = writeln!(output, "+++ {new_label}");

        for hunk in &self.hunks {
            let _ = writeln!(output, "{}", hunk.header());
            for line in &hunk.lines {
                output.push(line.kind.prefix());
                output.push_str(&line.content);
                output.push('\n');
            }
        }

        output
    }
}

/// Render several file diffs one after another.
pub fn render_unified(diffs: &[FileDiff]) -> String {
    diffs.iter().map(FileDiff::to_unified).collect()
}

#[cfg(test)]
mod tests {
    use crate::{diff_file, render_unified};

    #[test]
    fn test_render_modified() {
        let diff = diff_file("notes/a.md", Some("a\nb\nc\n"), Some("a\nx\nc\n"));
        assert_eq!(
            diff.to_unified(),
            "--- a/notes/a.md\n+++ b/notes/a.md\n@@ -1,3 +1,3 @@\n a\n-b\n+x\n c\n"
        );
    }

    #[test]
    fn test_render_added_and_removed() {
        let added = diff_file("new.md", None, Some("hello\n"));
        let removed = diff_file("old.md", Some("bye\n"), None);
        let output = render_unified(&[added, removed]);

        assert_eq!(
            output,
            "--- /dev/null\n+++ b/new.md\n@@ -0,0 +1,1 @@\n+hello\n\
             --- a/old.md\n+++ /dev/null\n@@ -1,1 +0,0 @@\n-bye\n"
        );
    }

    #[test]
    fn test_render_unchanged_is_empty() {
        let diff = diff_file("same.md", Some("x\n"), Some("x\n"));
        assert!(diff.to_unified().is_empty());
        assert!(render_unified(&[]).is_empty());
    }
}
