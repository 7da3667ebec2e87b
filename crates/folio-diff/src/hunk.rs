//! Hunk assembly.

use crate::lcs::{edit_script, DiffLine};
use crate::DiffOptions;
use serde::{Deserialize, Serialize};

/// A contiguous block of changed lines with surrounding context.
///
/// Start positions are 1-based line numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hunk {
    pub old_start: usize,
    pub old_count: usize,
    pub new_start: usize,
    pub new_count: usize,
    pub lines: Vec<DiffLine>,
}

impl Hunk {
    /// Unified diff header, e.g. `@@ -1,3 +1,4 @@`.
    pub fn header(&self) -> String {
        format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_count, self.new_start, self.new_count
        )
    }

    /// Build a hunk from a slice of the edit script.
    ///
    /// `old_before` and `new_before` are the number of old-side and
    /// new-side lines that precede the slice.
    fn from_slice(lines: &[DiffLine], old_before: usize, new_before: usize) -> Self {
        Self {
            old_start: old_before + 1,
            old_count: lines.iter().filter(|l| l.kind.in_old()).count(),
            new_start: new_before + 1,
            new_count: lines.iter().filter(|l| l.kind.in_new()).count(),
            lines: lines.to_vec(),
        }
    }
}

/// Group a flat edit script into hunks.
///
/// Each change is surrounded by up to `context_lines` lines of context on
/// either side. Neighbouring windows that overlap or touch are merged.
pub fn group_hunks(script: &[DiffLine], context_lines: usize) -> Vec<Hunk> {
    let mut ranges: Vec<(usize, usize)> = Vec::new();
    let last = match script.len().checked_sub(1) {
        Some(last) => last,
        None => return Vec::new(),
    };

    for index in script
        .iter()
        .enumerate()
        .filter(|(_, line)| line.is_change())
        .map(|(index, _)| index)
    {
        let start = index.saturating_sub(context_lines);
        let end = index.saturating_add(context_lines).min(last);

        match ranges.last_mut() {
            Some(current) if start <= current.1 + 1 => current.1 = end,
            _ => ranges.push((start, end)),
        }
    }

    let mut hunks = Vec::with_capacity(ranges.len());
    let (mut old_before, mut new_before, mut cursor) = (0, 0, 0);

    for (start, end) in ranges {
        for line in &script[cursor..start] {
            old_before += usize::from(line.kind.in_old());
            new_before += usize::from(line.kind.in_new());
        }
        let hunk = Hunk::from_slice(&script[start..=end], old_before, new_before);
        old_before += hunk.old_count;
        new_before += hunk.new_count;
        cursor = end + 1;
        hunks.push(hunk);
    }

    hunks
}

/// Diff two texts with the default context window.
pub fn compute_diff(old: &str, new: &str) -> Vec<Hunk> {
    compute_diff_with(old, new, &DiffOptions::default())
}

/// Diff two texts with explicit options.
pub fn compute_diff_with(old: &str, new: &str, options: &DiffOptions) -> Vec<Hunk> {
    group_hunks(&edit_script(old, new), options.context_lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lcs::LineKind;
    use folio_test_utils::fixtures::content::numbered;

    #[test]
    fn test_identical_texts_produce_no_hunks() {
        let text = numbered(20);
        assert!(compute_diff(&text, &text).is_empty());
        assert!(compute_diff("", "").is_empty());
    }

    #[test]
    fn test_single_replacement() {
        let hunks = compute_diff("a\nb\nc\n", "a\nx\nc\n");
        assert_eq!(hunks.len(), 1);

        let hunk = &hunks[0];
        assert_eq!(
            hunk.lines,
            vec![
                DiffLine::new(LineKind::Context, "a"),
                DiffLine::new(LineKind::Removed, "b"),
                DiffLine::new(LineKind::Added, "x"),
                DiffLine::new(LineKind::Context, "c"),
            ]
        );
        assert_eq!((hunk.old_start, hunk.old_count), (1, 3));
        assert_eq!((hunk.new_start, hunk.new_count), (1, 3));
        assert_eq!(hunk.header(), "@@ -1,3 +1,3 @@");
    }

    #[test]
    fn test_context_window_is_trimmed() {
        let old = numbered(20);
        let new = old.replace("line 10\n", "line ten\n");
        let hunks = compute_diff(&old, &new);

        assert_eq!(hunks.len(), 1);
        let hunk = &hunks[0];
        assert_eq!(hunk.lines.len(), 8);
        assert_eq!(hunk.lines.first().unwrap().content, "line 7");
        assert_eq!(hunk.lines.last().unwrap().content, "line 13");
        assert_eq!((hunk.old_start, hunk.old_count), (7, 7));
        assert_eq!((hunk.new_start, hunk.new_count), (7, 7));
    }

    #[test]
    fn test_distant_changes_split_into_hunks() {
        let old = numbered(30);
        let new = old
            .replace("line 5\n", "line five\n")
            .replace("line 25\n", "line twenty-five\n");
        let hunks = compute_diff(&old, &new);

        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[0].old_start, 2);
        assert_eq!(hunks[1].old_start, 22);
        assert_eq!(hunks[1].new_start, 22);
    }

    #[test]
    fn test_touching_windows_merge() {
        // Changes at lines 5 and 12 with 3 lines of context: the first
        // window ends at line 8, the second starts at line 9.
        let old = numbered(20);
        let new = old
            .replace("line 5\n", "line five\n")
            .replace("line 12\n", "line twelve\n");
        let hunks = compute_diff(&old, &new);
        assert_eq!(hunks.len(), 1);

        // One more line apart and they separate.
        let new = old
            .replace("line 5\n", "line five\n")
            .replace("line 13\n", "line thirteen\n");
        assert_eq!(compute_diff(&old, &new).len(), 2);
    }

    #[test]
    fn test_zero_context() {
        let hunks = compute_diff_with("a\nb\nc\n", "a\nx\nc\n", &DiffOptions::with_context(0));
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].lines.len(), 2);
        assert_eq!((hunks[0].old_start, hunks[0].old_count), (2, 1));
        assert_eq!((hunks[0].new_start, hunks[0].new_count), (2, 1));
    }

    #[test]
    fn test_huge_context_covers_whole_file() {
        let hunks = compute_diff_with(
            "a\nb\nc\n",
            "a\nx\nc\n",
            &DiffOptions::with_context(usize::MAX),
        );
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].lines.len(), 4);
        assert_eq!(hunks[0].header(), "@@ -1,3 +1,3 @@");

        let old = numbered(30);
        let new = old
            .replace("line 2\n", "line two\n")
            .replace("line 29\n", "line twenty-nine\n");
        let hunks = compute_diff_with(&old, &new, &DiffOptions::with_context(usize::MAX));
        assert_eq!(hunks.len(), 1);
        assert_eq!((hunks[0].old_start, hunks[0].old_count), (1, 30));
    }

    #[test]
    fn test_offsets_account_for_earlier_hunks() {
        let old = numbered(30);
        let new = old
            .replace("line 3\n", "line 3\ninserted a\ninserted b\n")
            .replace("line 25\n", "");
        let hunks = compute_diff(&old, &new);

        assert_eq!(hunks.len(), 2);
        assert_eq!((hunks[0].old_start, hunks[0].old_count), (1, 6));
        assert_eq!((hunks[0].new_start, hunks[0].new_count), (1, 8));
        assert_eq!((hunks[1].old_start, hunks[1].old_count), (22, 7));
        assert_eq!((hunks[1].new_start, hunks[1].new_count), (24, 6));
    }

    #[test]
    fn test_every_change_lands_in_exactly_one_hunk() {
        let old = numbered(40);
        let new = old
            .replace("line 2\n", "")
            .replace("line 9\n", "line nine\n")
            .replace("line 17\n", "line 17\nextra\n")
            .replace("line 33\n", "line thirty-three\n");
        let script = edit_script(&old, &new);
        let hunks = compute_diff(&old, &new);

        let changes_in_script = script.iter().filter(|l| l.is_change()).count();
        let changes_in_hunks: usize = hunks
            .iter()
            .map(|h| h.lines.iter().filter(|l| l.is_change()).count())
            .sum();
        assert_eq!(changes_in_script, changes_in_hunks);

        for pair in hunks.windows(2) {
            assert!(pair[0].old_start + pair[0].old_count < pair[1].old_start);
        }
    }
}
