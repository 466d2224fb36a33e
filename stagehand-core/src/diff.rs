//! Diff lines, hunks, and the selective-line staging derivation.
//!
//! The central operation is [`Hunk::with_selected_lines`]: given a set of
//! indices into the hunk's line sequence, it derives a new hunk containing
//! every context line plus exactly the selected change lines, with the
//! old/new counts recomputed and the position anchors inherited unchanged.
//! The derived hunk serializes to a unified-diff fragment via
//! [`Hunk::patch_text`], which is the contract handed to the backend's
//! patch-apply operation.

use std::collections::BTreeSet;

/// The kind of a single diff line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Unchanged line present in both old and new file.
    Context,
    /// Line present only in the new file (`+`).
    Addition,
    /// Line present only in the old file (`-`).
    Deletion,
}

impl LineKind {
    /// Returns the single-character prefix used in unified diff output.
    pub fn prefix(self) -> char {
        match self {
            LineKind::Context => ' ',
            LineKind::Addition => '+',
            LineKind::Deletion => '-',
        }
    }
}

/// One line of a hunk, fully owned.
///
/// Invariant: a context line carries both line numbers, an addition carries
/// only the new number, a deletion only the old number. The constructors
/// below are the only way line numbers are paired with kinds, so the
/// invariant cannot be violated from outside this module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffLine {
    /// Line text without the diff prefix and without a trailing newline.
    pub content: String,
    /// Whether the line is context, an addition, or a deletion.
    pub kind: LineKind,
    /// Line number in the old file. `None` iff `kind` is `Addition`.
    pub old_lineno: Option<u32>,
    /// Line number in the new file. `None` iff `kind` is `Deletion`.
    pub new_lineno: Option<u32>,
}

impl DiffLine {
    /// Builds a context line carrying both old and new line numbers.
    pub fn context(content: impl Into<String>, old: u32, new: u32) -> Self {
        Self { content: content.into(), kind: LineKind::Context, old_lineno: Some(old), new_lineno: Some(new) }
    }

    /// Builds an addition line carrying only a new-file line number.
    pub fn addition(content: impl Into<String>, new: u32) -> Self {
        Self { content: content.into(), kind: LineKind::Addition, old_lineno: None, new_lineno: Some(new) }
    }

    /// Builds a deletion line carrying only an old-file line number.
    pub fn deletion(content: impl Into<String>, old: u32) -> Self {
        Self { content: content.into(), kind: LineKind::Deletion, old_lineno: Some(old), new_lineno: None }
    }

    /// Returns the line as it appears in a patch: prefix plus content.
    pub fn display(&self) -> String {
        format!("{}{}", self.kind.prefix(), self.content)
    }

    /// True for additions and deletions, false for context.
    pub fn is_change(&self) -> bool {
        self.kind != LineKind::Context
    }
}

/// Error returned when a selection refers to lines outside the hunk.
///
/// An out-of-range index is a caller bug, not a user-facing condition, so it
/// is reported loudly instead of being clamped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("selected line index {index} is out of range for a hunk of {len} lines")]
pub struct SelectionError {
    /// The offending index.
    pub index: usize,
    /// The hunk's line count at the time of the call.
    pub len: usize,
}

/// One `@@` block of a unified diff.
///
/// `old_count` always equals the number of context + deletion lines and
/// `new_count` the number of context + addition lines. The constructor
/// recomputes both, so a hand-assembled hunk cannot carry stale counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// First line of the hunk in the old file.
    pub old_start: u32,
    /// Number of old-file lines covered (context + deletions).
    pub old_count: u32,
    /// First line of the hunk in the new file.
    pub new_start: u32,
    /// Number of new-file lines covered (context + additions).
    pub new_count: u32,
    /// All lines of the hunk, in order.
    pub lines: Vec<DiffLine>,
    /// Raw header text from the backend, if any. Derived when absent.
    pub header: Option<String>,
}

impl Hunk {
    /// Builds a hunk from its position anchors and lines.
    ///
    /// The old/new counts are recomputed from `lines`; they are not taken on
    /// trust from the caller.
    pub fn new(old_start: u32, new_start: u32, lines: Vec<DiffLine>, header: Option<String>) -> Self {
        let (old_count, new_count) = Self::count_lines(&lines);
        Self { old_start, old_count, new_start, new_count, lines, header }
    }

    fn count_lines(lines: &[DiffLine]) -> (u32, u32) {
        let mut old = 0u32;
        let mut new = 0u32;
        for line in lines {
            match line.kind {
                LineKind::Context => {
                    old += 1;
                    new += 1;
                }
                LineKind::Deletion => old += 1,
                LineKind::Addition => new += 1,
            }
        }
        (old, new)
    }

    /// Returns the `@@` header line, preferring the backend-supplied text.
    pub fn header_line(&self) -> String {
        match &self.header {
            Some(h) if !h.is_empty() => h.trim_end().to_owned(),
            _ => format!(
                "@@ -{},{} +{},{} @@",
                self.old_start, self.old_count, self.new_start, self.new_count
            ),
        }
    }

    /// Number of addition lines.
    pub fn additions(&self) -> usize {
        self.lines.iter().filter(|l| l.kind == LineKind::Addition).count()
    }

    /// Number of deletion lines.
    pub fn deletions(&self) -> usize {
        self.lines.iter().filter(|l| l.kind == LineKind::Deletion).count()
    }

    /// Number of context lines.
    pub fn context_lines(&self) -> usize {
        self.lines.iter().filter(|l| l.kind == LineKind::Context).count()
    }

    /// Indices of all change (non-context) lines, in order.
    pub fn change_indices(&self) -> Vec<usize> {
        self.lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.is_change())
            .map(|(i, _)| i)
            .collect()
    }

    /// Derives a new hunk containing every context line plus the change lines
    /// whose indices appear in `selected`.
    ///
    /// The counts of the result are recomputed from the retained lines.
    /// `old_start`/`new_start` and the header text are inherited unchanged:
    /// the subset hunk is a patch fragment applied relative to the same base,
    /// not a replacement diff, so the anchors must not shift even though the
    /// line count shrinks.
    ///
    /// An empty selection yields a context-only hunk; whether that is worth
    /// staging is the caller's decision.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError`] if any index in `selected` is outside
    /// `0..self.lines.len()`. Out-of-range selections are rejected, never
    /// clamped.
    pub fn with_selected_lines(&self, selected: &BTreeSet<usize>) -> Result<Hunk, SelectionError> {
        if let Some(&index) = selected.iter().find(|&&i| i >= self.lines.len()) {
            return Err(SelectionError { index, len: self.lines.len() });
        }

        let lines: Vec<DiffLine> = self
            .lines
            .iter()
            .enumerate()
            .filter(|(i, line)| line.kind == LineKind::Context || selected.contains(i))
            .map(|(_, line)| line.clone())
            .collect();

        let (old_count, new_count) = Self::count_lines(&lines);
        Ok(Hunk {
            old_start: self.old_start,
            old_count,
            new_start: self.new_start,
            new_count,
            lines,
            header: self.header.clone(),
        })
    }

    /// Returns the complement of `selected` over this hunk's full index range.
    ///
    /// Unstaging exactly the selected lines is expressed as staging the
    /// complement, so the unstage path reuses [`Hunk::with_selected_lines`]
    /// with a pre-complemented set.
    pub fn complement_of(&self, selected: &BTreeSet<usize>) -> BTreeSet<usize> {
        (0..self.lines.len()).filter(|i| !selected.contains(i)).collect()
    }

    /// Derives the reverse hunk: additions become deletions and vice versa,
    /// and the old/new coordinates swap sides.
    ///
    /// Applying the reverse of a patch fragment to the index undoes the
    /// forward application, which is how unstaging against a real index is
    /// realized. The header is dropped so `header_line()` derives a fresh one
    /// from the swapped anchors.
    pub fn reversed(&self) -> Hunk {
        let lines = self
            .lines
            .iter()
            .map(|line| {
                let kind = match line.kind {
                    LineKind::Context => LineKind::Context,
                    LineKind::Addition => LineKind::Deletion,
                    LineKind::Deletion => LineKind::Addition,
                };
                DiffLine {
                    content: line.content.clone(),
                    kind,
                    old_lineno: line.new_lineno,
                    new_lineno: line.old_lineno,
                }
            })
            .collect();
        Hunk::new(self.new_start, self.old_start, lines, None)
    }

    /// Serializes this hunk as a unified-diff fragment for `path`.
    ///
    /// The output is a two-line file header (`--- a/<path>`, `+++ b/<path>`),
    /// the recomputed hunk header, then each line prefixed by space/`+`/`-`. This
    /// text is the contract handed to the backend's patch-apply operation;
    /// this crate never applies patches itself.
    pub fn patch_text(&self, path: &str) -> String {
        let mut patch = String::new();
        patch.push_str(&format!("--- a/{path}\n"));
        patch.push_str(&format!("+++ b/{path}\n"));
        // Always the derived header: an inherited header string may carry
        // counts from before a subset derivation, and the patch must state
        // the counts of the lines it actually contains.
        patch.push_str(&format!(
            "@@ -{},{} +{},{} @@",
            self.old_start, self.old_count, self.new_start, self.new_count
        ));
        patch.push('\n');
        for line in &self.lines {
            patch.push_str(&line.display());
            patch.push('\n');
        }
        patch
    }
}

/// All hunks of one changed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// Repository-relative path.
    pub path: String,
    /// Hunks in file order.
    pub hunks: Vec<Hunk>,
}

impl FileDiff {
    /// Total addition lines across all hunks.
    pub fn total_additions(&self) -> usize {
        self.hunks.iter().map(Hunk::additions).sum()
    }

    /// Total deletion lines across all hunks.
    pub fn total_deletions(&self) -> usize {
        self.hunks.iter().map(Hunk::deletions).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_hunk() -> Hunk {
        Hunk::new(
            1,
            1,
            vec![
                DiffLine::context("a", 1, 1),
                DiffLine::deletion("b", 2),
                DiffLine::addition("c", 2),
            ],
            None,
        )
    }

    #[test]
    fn counts_follow_line_kinds() {
        let hunk = sample_hunk();
        assert_eq!(hunk.old_count, 2, "context + deletion");
        assert_eq!(hunk.new_count, 2, "context + addition");
        assert_eq!(hunk.additions(), 1);
        assert_eq!(hunk.deletions(), 1);
        assert_eq!(hunk.context_lines(), 1);
    }

    #[test]
    fn header_derived_when_absent() {
        let hunk = sample_hunk();
        assert_eq!(hunk.header_line(), "@@ -1,2 +1,2 @@");
    }

    #[test]
    fn header_preferred_when_present() {
        let mut hunk = sample_hunk();
        hunk.header = Some("@@ -1,2 +1,2 @@ fn main()\n".to_owned());
        assert_eq!(hunk.header_line(), "@@ -1,2 +1,2 @@ fn main()");
    }

    #[test]
    fn selecting_only_the_deletion() {
        // Context "a", deletion "b", addition "c"; selecting
        // only the deletion keeps context + deletion on the old side and
        // context alone on the new side.
        let hunk = sample_hunk();
        let selected: BTreeSet<usize> = [1].into_iter().collect();
        let subset = hunk.with_selected_lines(&selected).unwrap();

        assert_eq!(subset.old_count, 2);
        assert_eq!(subset.new_count, 1);
        assert_eq!(subset.header_line(), "@@ -1,2 +1,1 @@");
        assert_eq!(subset.lines.len(), 2);
        assert_eq!(subset.lines[0].kind, LineKind::Context);
        assert_eq!(subset.lines[1].kind, LineKind::Deletion);
    }

    #[test]
    fn anchors_and_header_are_inherited() {
        let mut hunk = sample_hunk();
        hunk.old_start = 40;
        hunk.new_start = 41;
        hunk.header = Some("@@ -40,2 +41,2 @@".to_owned());
        let subset = hunk.with_selected_lines(&[2usize].into_iter().collect()).unwrap();
        assert_eq!(subset.old_start, 40);
        assert_eq!(subset.new_start, 41);
        assert_eq!(subset.header, hunk.header);
    }

    #[test]
    fn empty_selection_keeps_only_context() {
        let hunk = sample_hunk();
        let subset = hunk.with_selected_lines(&BTreeSet::new()).unwrap();
        assert_eq!(subset.lines.len(), 1);
        assert_eq!(subset.old_count, 1);
        assert_eq!(subset.new_count, 1);
    }

    #[test]
    fn out_of_range_selection_is_rejected() {
        let hunk = sample_hunk();
        let err = hunk.with_selected_lines(&[7usize].into_iter().collect()).unwrap_err();
        assert_eq!(err, SelectionError { index: 7, len: 3 });
    }

    #[test]
    fn patch_text_layout() {
        let hunk = sample_hunk();
        let patch = hunk.patch_text("src/lib.rs");
        let expected = "--- a/src/lib.rs\n\
                        +++ b/src/lib.rs\n\
                        @@ -1,2 +1,2 @@\n \
                        a\n\
                        -b\n\
                        +c\n";
        assert_eq!(patch, expected);
    }

    #[test]
    fn reversed_swaps_sides() {
        let mut hunk = sample_hunk();
        hunk.old_start = 3;
        hunk.new_start = 5;
        let rev = hunk.reversed();

        assert_eq!(rev.old_start, 5);
        assert_eq!(rev.new_start, 3);
        assert_eq!(rev.lines[1].kind, LineKind::Addition);
        assert_eq!(rev.lines[2].kind, LineKind::Deletion);
        // Reversing twice restores the original apart from the dropped header.
        let back = rev.reversed();
        assert_eq!(back.lines, hunk.lines);
        assert_eq!(back.old_start, hunk.old_start);
    }

    #[test]
    fn file_diff_totals() {
        let diff = FileDiff { path: "a.txt".to_owned(), hunks: vec![sample_hunk(), sample_hunk()] };
        assert_eq!(diff.total_additions(), 2);
        assert_eq!(diff.total_deletions(), 2);
    }
}
