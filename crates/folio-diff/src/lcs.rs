//! LCS table construction and backtracking.

use serde::{Deserialize, Serialize};

/// Role of a line in an edit script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    /// Present on both sides.
    Context,
    /// Present only in the new text.
    Added,
    /// Present only in the old text.
    Removed,
}

impl LineKind {
    /// Unified diff prefix character.
    pub fn prefix(&self) -> char {
        match self {
            LineKind::Context => ' ',
            LineKind::Added => '+',
            LineKind::Removed => '-',
        }
    }

    /// Whether the line exists on the old side.
    pub fn in_old(&self) -> bool {
        matches!(self, LineKind::Context | LineKind::Removed)
    }

    /// Whether the line exists on the new side.
    pub fn in_new(&self) -> bool {
        matches!(self, LineKind::Context | LineKind::Added)
    }
}

/// A single line of an edit script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffLine {
    pub kind: LineKind,
    /// Line text without its terminating newline.
    pub content: String,
}

impl DiffLine {
    pub fn new(kind: LineKind, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
        }
    }

    pub fn is_change(&self) -> bool {
        self.kind != LineKind::Context
    }
}

/// Split text into lines.
///
/// Exactly one trailing empty element produced by a final newline is
/// dropped, so `"a\n"` and `"a"` both yield `["a"]` and `""` yields nothing.
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text.split('\n').collect();
    if lines.last() == Some(&"") {
        lines.pop();
    }
    lines
}

/// Row-major `(n + 1) x (m + 1)` table of LCS lengths.
struct LcsTable {
    width: usize,
    cells: Vec<u32>,
}

impl LcsTable {
    fn build(old: &[&str], new: &[&str]) -> Self {
        let width = new.len() + 1;
        let mut cells = vec![0u32; (old.len() + 1) * width];

        for i in 1..=old.len() {
            for j in 1..=new.len() {
                cells[i * width + j] = if old[i - 1] == new[j - 1] {
                    cells[(i - 1) * width + (j - 1)] + 1
                } else {
                    cells[(i - 1) * width + j].max(cells[i * width + (j - 1)])
                };
            }
        }

        Self { width, cells }
    }

    fn get(&self, i: usize, j: usize) -> u32 {
        self.cells[i * self.width + j]
    }
}

/// Compute the flat edit script turning `old` into `new`.
///
/// When the table scores tie, the insertion branch is taken first while
/// backtracking, which places removals before additions in forward order.
pub fn edit_script(old: &str, new: &str) -> Vec<DiffLine> {
    let old_lines = split_lines(old);
    let new_lines = split_lines(new);
    let table = LcsTable::build(&old_lines, &new_lines);

    let mut script = Vec::with_capacity(old_lines.len() + new_lines.len());
    let (mut i, mut j) = (old_lines.len(), new_lines.len());

    while i > 0 || j > 0 {
        if i > 0 && j > 0 && old_lines[i - 1] == new_lines[j - 1] {
            script.push(DiffLine::new(LineKind::Context, old_lines[i - 1]));
            i -= 1;
            j -= 1;
        } else if j > 0 && (i == 0 || table.get(i, j - 1) >= table.get(i - 1, j)) {
            script.push(DiffLine::new(LineKind::Added, new_lines[j - 1]));
            j -= 1;
        } else {
            script.push(DiffLine::new(LineKind::Removed, old_lines[i - 1]));
            i -= 1;
        }
    }

    script.reverse();
    script
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar::{ChangeTag, TextDiff};

    fn kinds(script: &[DiffLine]) -> Vec<LineKind> {
        script.iter().map(|l| l.kind).collect()
    }

    #[test]
    fn test_split_lines_drops_one_trailing_empty() {
        assert_eq!(split_lines("a\nb\n"), vec!["a", "b"]);
        assert_eq!(split_lines("a\nb"), vec!["a", "b"]);
        assert_eq!(split_lines("a\n\n"), vec!["a", ""]);
        assert!(split_lines("").is_empty());
        assert_eq!(split_lines("\n"), Vec::<&str>::new());
    }

    #[test]
    fn test_identical_text_is_all_context() {
        let script = edit_script("one\ntwo\n", "one\ntwo\n");
        assert_eq!(kinds(&script), vec![LineKind::Context, LineKind::Context]);
    }

    #[test]
    fn test_trailing_newline_difference_is_ignored() {
        let script = edit_script("one\ntwo", "one\ntwo\n");
        assert!(script.iter().all(|l| !l.is_change()));
    }

    #[test]
    fn test_replacement_orders_removal_before_addition() {
        let script = edit_script("a\nb\nc\n", "a\nx\nc\n");
        assert_eq!(
            script,
            vec![
                DiffLine::new(LineKind::Context, "a"),
                DiffLine::new(LineKind::Removed, "b"),
                DiffLine::new(LineKind::Added, "x"),
                DiffLine::new(LineKind::Context, "c"),
            ]
        );
    }

    #[test]
    fn test_empty_sides() {
        let script = edit_script("", "a\nb\n");
        assert_eq!(kinds(&script), vec![LineKind::Added, LineKind::Added]);

        let script = edit_script("a\nb\n", "");
        assert_eq!(kinds(&script), vec![LineKind::Removed, LineKind::Removed]);

        assert!(edit_script("", "").is_empty());
    }

    #[test]
    fn test_tie_prefers_insertion_while_backtracking() {
        // "a" vs "b": both branches score zero, so backtracking takes the
        // insertion of "b" first and the forward order is "-a" then "+b".
        let script = edit_script("a\n", "b\n");
        assert_eq!(
            script,
            vec![
                DiffLine::new(LineKind::Removed, "a"),
                DiffLine::new(LineKind::Added, "b"),
            ]
        );
    }

    #[test]
    fn test_script_reconstructs_both_sides() {
        let old = "title\nintro\nbody one\nbody two\noutro\n";
        let new = "title\nbody one\nnew middle\nbody two\noutro\nappendix\n";
        let script = edit_script(old, new);

        let old_side: Vec<&str> = script
            .iter()
            .filter(|l| l.kind.in_old())
            .map(|l| l.content.as_str())
            .collect();
        let new_side: Vec<&str> = script
            .iter()
            .filter(|l| l.kind.in_new())
            .map(|l| l.content.as_str())
            .collect();

        assert_eq!(old_side, split_lines(old));
        assert_eq!(new_side, split_lines(new));
    }

    #[test]
    fn test_context_count_matches_similar_lcs() {
        let cases = [
            ("a\nb\nc\nd\n", "b\nc\nx\nd\n"),
            ("one\ntwo\nthree\n", "zero\none\nthree\nfour\n"),
            ("x\ny\nx\ny\nx\n", "y\nx\ny\n"),
            ("same\nsame\nsame\n", "same\nother\nsame\n"),
        ];

        for (old, new) in cases {
            let ours = edit_script(old, new)
                .iter()
                .filter(|l| l.kind == LineKind::Context)
                .count();
            let reference = TextDiff::from_lines(old, new)
                .iter_all_changes()
                .filter(|c| c.tag() == ChangeTag::Equal)
                .count();
            assert_eq!(ours, reference, "LCS length mismatch for {old:?} -> {new:?}");
        }
    }
}
