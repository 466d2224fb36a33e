//! Integration tests for the selective-line staging derivation.
//!
//! Exercises: subset derivation, patch-text round-trip, idempotence of
//! re-selecting the full remaining set, and the complement partition law.

use std::collections::BTreeSet;

use stagehand_core::{DiffLine, Hunk, LineKind};

/// A multi-change hunk: two deletions, two additions, three context lines.
fn mixed_hunk() -> Hunk {
    Hunk::new(
        10,
        10,
        vec![
            DiffLine::context("fn demo() {", 10, 10),
            DiffLine::deletion("    old_one();", 11),
            DiffLine::deletion("    old_two();", 12),
            DiffLine::addition("    new_one();", 11),
            DiffLine::addition("    new_two();", 12),
            DiffLine::context("    keep();", 13, 13),
            DiffLine::context("}", 14, 14),
        ],
        None,
    )
}

/// Parses the output of `Hunk::patch_text` back into prefix/content pairs.
///
/// Deliberately minimal: asserts the two-line file header and the `@@` line,
/// then splits each body line into its prefix character and content.
fn parse_patch(patch: &str, path: &str) -> Vec<(char, String)> {
    let mut lines = patch.lines();
    assert_eq!(lines.next(), Some(format!("--- a/{path}").as_str()));
    assert_eq!(lines.next(), Some(format!("+++ b/{path}").as_str()));
    let header = lines.next().expect("missing hunk header");
    assert!(header.starts_with("@@ -") && header.ends_with("@@"), "bad header: {header}");

    lines
        .map(|l| {
            let mut chars = l.chars();
            let prefix = chars.next().expect("empty body line");
            (prefix, chars.collect())
        })
        .collect()
}

#[test]
fn round_trip_preserves_selected_lines() {
    let hunk = mixed_hunk();
    let selected: BTreeSet<usize> = [1, 3].into_iter().collect();
    let subset = hunk.with_selected_lines(&selected).unwrap();
    let parsed = parse_patch(&subset.patch_text("src/demo.rs"), "src/demo.rs");

    // Retained lines are all context lines of the source plus exactly the
    // change lines at the selected indices, in source order.
    let expected: Vec<(char, String)> = hunk
        .lines
        .iter()
        .enumerate()
        .filter(|(i, l)| l.kind == LineKind::Context || selected.contains(i))
        .map(|(_, l)| (l.kind.prefix(), l.content.clone()))
        .collect();
    assert_eq!(parsed, expected);
}

#[test]
fn selecting_the_full_remaining_set_is_a_noop() {
    let hunk = mixed_hunk();
    let selected: BTreeSet<usize> = [2, 4].into_iter().collect();
    let reduced = hunk.with_selected_lines(&selected).unwrap();

    // Select every line of the already-reduced hunk.
    let everything: BTreeSet<usize> = (0..reduced.lines.len()).collect();
    let again = reduced.with_selected_lines(&everything).unwrap();

    assert_eq!(again, reduced);
}

#[test]
fn complement_partitions_the_change_lines() {
    let hunk = mixed_hunk();
    let selected: BTreeSet<usize> = [1, 4].into_iter().collect();
    let complement = hunk.complement_of(&selected);

    let picked = hunk.with_selected_lines(&selected).unwrap();
    let rest = hunk.with_selected_lines(&complement).unwrap();

    // Every change line of the source lands in exactly one of the two
    // derived hunks; context lines appear in both.
    let changes = |h: &Hunk| -> Vec<String> {
        h.lines.iter().filter(|l| l.is_change()).map(|l| l.display()).collect()
    };
    let mut partitioned = changes(&picked);
    partitioned.extend(changes(&rest));
    partitioned.sort();

    let mut all: Vec<String> =
        hunk.lines.iter().filter(|l| l.is_change()).map(|l| l.display()).collect();
    all.sort();

    assert_eq!(partitioned, all);
    assert_eq!(picked.context_lines(), hunk.context_lines());
    assert_eq!(rest.context_lines(), hunk.context_lines());
}

#[test]
fn counts_recomputed_for_each_subset() {
    let hunk = mixed_hunk();
    // Only the additions: old side is context-only.
    let additions: BTreeSet<usize> = [3, 4].into_iter().collect();
    let subset = hunk.with_selected_lines(&additions).unwrap();
    assert_eq!(subset.old_count, 3);
    assert_eq!(subset.new_count, 5);
    assert_eq!(subset.header_line(), "@@ -10,3 +10,5 @@");
}

#[test]
fn reverse_of_subset_matches_unstage_shape() {
    // Staging additions then reversing yields a patch that deletes exactly
    // those lines, which is the unstage application shape.
    let hunk = mixed_hunk();
    let additions: BTreeSet<usize> = [3, 4].into_iter().collect();
    let rev = hunk.with_selected_lines(&additions).unwrap().reversed();

    assert_eq!(rev.deletions(), 2);
    assert_eq!(rev.additions(), 0);
    assert_eq!(rev.old_count, 5);
    assert_eq!(rev.new_count, 3);
}
