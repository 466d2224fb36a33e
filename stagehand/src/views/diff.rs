//! Hunk-level diff view with line-selection staging.
//!
//! Two modes share the screen: hunk mode (j/k moves between hunks, s/u stage
//! or unstage the whole hunk) and line-selection mode (`v`), where a cursor
//! walks the change lines of the current hunk and Space toggles membership in
//! the selection before `s`/`u` applies just those lines.
//!
//! While selecting, printable keys bypass the leader sequencer so Space can
//! toggle lines; Escape leaves selection mode first, then the chord layer is
//! reachable again.

use std::collections::BTreeSet;
use std::io;

use stagehand_core::{FileDiff, Hunk, LineKind};

use crate::git::{GitHandle, GitReply};
use crate::highlight::{word_diff_segments, Highlighter, Segment};
use crate::keys::Key;
use crate::term::TerminalSession;
use crate::theme::Theme;
use crate::views::{draw_segments, ensure_visible, MessageKind, View, ViewEvent};

pub struct DiffView {
    /// HEAD↔index when true, index↔workdir otherwise.
    staged: bool,
    focus: Option<String>,
    files: Vec<FileDiff>,
    file_idx: usize,
    hunk_idx: usize,
    selecting: bool,
    /// Absolute index into the current hunk's `lines`, always on a change
    /// line while selecting.
    line_cursor: usize,
    selected: BTreeSet<usize>,
    scroll: usize,
    generation: u64,
    loading: bool,
}

impl DiffView {
    pub fn new(focus: Option<String>, staged: bool) -> Self {
        Self {
            staged,
            focus,
            files: Vec::new(),
            file_idx: 0,
            hunk_idx: 0,
            selecting: false,
            line_cursor: 0,
            selected: BTreeSet::new(),
            scroll: 0,
            generation: 0,
            loading: true,
        }
    }

    fn current_file(&self) -> Option<&FileDiff> {
        self.files.get(self.file_idx)
    }

    fn current_hunk(&self) -> Option<&Hunk> {
        self.current_file().and_then(|f| f.hunks.get(self.hunk_idx))
    }

    fn leave_selection(&mut self) {
        self.selecting = false;
        self.selected.clear();
    }

    fn move_hunk(&mut self, forward: bool) -> bool {
        let Some(file) = self.current_file() else { return false };
        if forward {
            if self.hunk_idx + 1 < file.hunks.len() {
                self.hunk_idx += 1;
                return true;
            }
        } else if self.hunk_idx > 0 {
            self.hunk_idx -= 1;
            return true;
        }
        false
    }

    fn move_file(&mut self, forward: bool) -> bool {
        let moved = if forward {
            if self.file_idx + 1 < self.files.len() {
                self.file_idx += 1;
                true
            } else {
                false
            }
        } else if self.file_idx > 0 {
            self.file_idx -= 1;
            true
        } else {
            false
        };
        if moved {
            self.hunk_idx = 0;
            self.leave_selection();
        }
        moved
    }

    fn move_line_cursor(&mut self, forward: bool) -> bool {
        let Some(hunk) = self.current_hunk() else { return false };
        let changes = hunk.change_indices();
        let Some(position) = changes.iter().position(|&i| i == self.line_cursor) else {
            return false;
        };
        let next = if forward { position + 1 } else { position.wrapping_sub(1) };
        match changes.get(next) {
            Some(&line) => {
                self.line_cursor = line;
                true
            }
            None => false,
        }
    }

    fn enter_selection(&mut self) -> ViewEvent {
        let Some(hunk) = self.current_hunk() else { return ViewEvent::None };
        let changes = hunk.change_indices();
        match changes.first() {
            Some(&first) => {
                self.selecting = true;
                self.selected.clear();
                self.line_cursor = first;
                ViewEvent::Redraw
            }
            None => ViewEvent::Message(MessageKind::Error, "Hunk has no change lines".to_owned()),
        }
    }

    fn toggle_line(&mut self) -> ViewEvent {
        if !self.selecting {
            return ViewEvent::None;
        }
        if self.selected.contains(&self.line_cursor) {
            self.selected.remove(&self.line_cursor);
        } else {
            self.selected.insert(self.line_cursor);
        }
        ViewEvent::Redraw
    }

    /// Applies the current hunk (or selection) to the index.
    ///
    /// `stage` is the forward direction; unstaging sends the reversed patch.
    fn apply_current(&mut self, git: &GitHandle, stage: bool) -> ViewEvent {
        if stage == self.staged {
            let text = if stage {
                "Already staged: press Tab for the unstaged diff"
            } else {
                "Not staged yet: press Tab for the staged diff"
            };
            return ViewEvent::Message(MessageKind::Error, text.to_owned());
        }
        let Some(file) = self.current_file() else { return ViewEvent::None };
        let path = file.path.clone();
        let Some(hunk) = file.hunks.get(self.hunk_idx) else { return ViewEvent::None };

        let subset = if self.selecting {
            if self.selected.is_empty() {
                return ViewEvent::Message(MessageKind::Error, "No lines selected".to_owned());
            }
            match hunk.with_selected_lines(&self.selected) {
                Ok(subset) => subset,
                Err(e) => return ViewEvent::Message(MessageKind::Error, e.to_string()),
            }
        } else {
            hunk.clone()
        };

        let patch =
            if stage { subset.patch_text(&path) } else { subset.reversed().patch_text(&path) };
        git.apply_patch(patch, true);
        self.leave_selection();
        ViewEvent::Redraw
    }

    fn stage_whole_file(&mut self, git: &GitHandle) -> ViewEvent {
        let Some(file) = self.current_file() else { return ViewEvent::None };
        if self.staged {
            git.unstage_path(file.path.clone());
        } else {
            git.stage_path(file.path.clone());
        }
        self.leave_selection();
        ViewEvent::Redraw
    }

    /// Builds the display lines for the current file and returns the display
    /// index the scroll window should keep visible.
    fn build_lines(&self, theme: &Theme) -> (Vec<Vec<Segment>>, usize) {
        let mut lines: Vec<Vec<Segment>> = Vec::new();
        let mut keep_visible = 0;
        let Some(file) = self.current_file() else { return (lines, keep_visible) };

        let file_label = format!(
            "{} ({} hunk{})",
            file.path,
            file.hunks.len(),
            if file.hunks.len() == 1 { "" } else { "s" }
        );
        lines.push(vec![Segment::bold(file_label, theme.section)]);

        for (h, hunk) in file.hunks.iter().enumerate() {
            let is_current = h == self.hunk_idx;
            let marker = if is_current { "\u{25b6} " } else { "  " };
            lines.push(vec![Segment::colored(
                format!("{marker}{}", hunk.header_line()),
                theme.hunk_header,
            )]);
            if is_current {
                keep_visible = lines.len() - 1;
            }

            if is_current && self.selecting {
                self.push_selection_lines(hunk, theme, &mut lines, &mut keep_visible);
            } else {
                push_highlighted_lines(hunk, &file.path, theme, &mut lines);
            }
        }
        (lines, keep_visible)
    }

    fn push_selection_lines(
        &self,
        hunk: &Hunk,
        theme: &Theme,
        lines: &mut Vec<Vec<Segment>>,
        keep_visible: &mut usize,
    ) {
        for (i, line) in hunk.lines.iter().enumerate() {
            let mut segments = Vec::new();
            if line.is_change() {
                let cursor = if i == self.line_cursor { '>' } else { ' ' };
                let mark = if self.selected.contains(&i) { '\u{25cf}' } else { ' ' };
                segments.push(Segment::colored(format!("{cursor}{mark} "), theme.selection));
                if i == self.line_cursor {
                    *keep_visible = lines.len();
                }
            } else {
                segments.push(Segment::plain("   "));
            }
            let color = match line.kind {
                LineKind::Addition => theme.added,
                LineKind::Deletion => theme.removed,
                LineKind::Context => theme.dim,
            };
            segments.push(Segment::colored(line.display(), color));
            lines.push(segments);
        }
    }
}

/// Renders a hunk with syntax highlighting and word-level emphasis on
/// adjacent deletion/addition pairs.
fn push_highlighted_lines(
    hunk: &Hunk,
    path: &str,
    theme: &Theme,
    lines: &mut Vec<Vec<Segment>>,
) {
    let mut highlighter = Highlighter::for_path(path);
    let mut pending_deletion: Option<(String, Vec<Segment>)> = None;

    let mut flush = |pending: &mut Option<(String, Vec<Segment>)>, lines: &mut Vec<Vec<Segment>>| {
        if let Some((_, segments)) = pending.take() {
            lines.push(segments);
        }
    };

    for line in &hunk.lines {
        match line.kind {
            LineKind::Deletion => {
                flush(&mut pending_deletion, lines);
                let mut segments = vec![Segment::colored("  - ", theme.removed)];
                segments.extend(highlighter.segments(&line.content));
                pending_deletion = Some((line.content.clone(), segments));
            }
            LineKind::Addition => {
                if let Some((old, _)) = pending_deletion.take() {
                    let (old_segments, new_segments) = word_diff_segments(&old, &line.content);
                    let mut old_line = vec![Segment::colored("  - ", theme.removed)];
                    old_line.extend(old_segments);
                    lines.push(old_line);
                    let mut new_line = vec![Segment::colored("  + ", theme.added)];
                    new_line.extend(new_segments);
                    lines.push(new_line);
                } else {
                    let mut segments = vec![Segment::colored("  + ", theme.added)];
                    segments.extend(highlighter.segments(&line.content));
                    lines.push(segments);
                }
            }
            LineKind::Context => {
                flush(&mut pending_deletion, lines);
                let mut segments = vec![Segment::colored("    ", theme.dim)];
                segments.extend(highlighter.segments(&line.content));
                lines.push(segments);
            }
        }
    }
    flush(&mut pending_deletion, lines);
}

impl View for DiffView {
    fn title(&self) -> &str {
        if self.staged {
            "Diff (staged)"
        } else {
            "Diff"
        }
    }

    fn on_enter(&mut self, git: &GitHandle) {
        self.loading = true;
        self.leave_selection();
        self.generation = git.request_diff(self.focus.clone(), self.staged);
    }

    fn wants_text_input(&self) -> bool {
        // Space must reach toggle_line while selecting.
        self.selecting
    }

    fn handle_key(&mut self, key: Key, git: &GitHandle) -> ViewEvent {
        match key {
            Key::Tab => {
                self.staged = !self.staged;
                self.hunk_idx = 0;
                self.on_enter(git);
                ViewEvent::Redraw
            }
            Key::Char('j') | Key::Down => {
                let moved = if self.selecting {
                    self.move_line_cursor(true)
                } else {
                    self.move_hunk(true)
                };
                if moved {
                    ViewEvent::Redraw
                } else {
                    ViewEvent::None
                }
            }
            Key::Char('k') | Key::Up => {
                let moved = if self.selecting {
                    self.move_line_cursor(false)
                } else {
                    self.move_hunk(false)
                };
                if moved {
                    ViewEvent::Redraw
                } else {
                    ViewEvent::None
                }
            }
            Key::Char('J') => {
                if self.move_file(true) {
                    ViewEvent::Redraw
                } else {
                    ViewEvent::None
                }
            }
            Key::Char('K') => {
                if self.move_file(false) {
                    ViewEvent::Redraw
                } else {
                    ViewEvent::None
                }
            }
            Key::Char('v') => self.enter_selection(),
            Key::Space => self.toggle_line(),
            Key::Char('s') => self.apply_current(git, true),
            Key::Char('u') => self.apply_current(git, false),
            Key::Char('S') | Key::Char('U') => self.stage_whole_file(git),
            Key::Char('r') => {
                self.on_enter(git);
                ViewEvent::Redraw
            }
            Key::Escape if self.selecting => {
                self.leave_selection();
                ViewEvent::Redraw
            }
            _ => ViewEvent::None,
        }
    }

    fn apply_reply(&mut self, reply: &GitReply, _git: &GitHandle) -> ViewEvent {
        match reply {
            GitReply::Diff { generation, staged, result }
                if *generation == self.generation && *staged == self.staged =>
            {
                self.loading = false;
                match result {
                    Ok(files) => {
                        self.files = files.clone();
                        self.file_idx = self.file_idx.min(self.files.len().saturating_sub(1));
                        let hunks = self.current_file().map_or(0, |f| f.hunks.len());
                        self.hunk_idx = self.hunk_idx.min(hunks.saturating_sub(1));
                        self.leave_selection();
                        ViewEvent::Redraw
                    }
                    Err(e) => ViewEvent::Message(MessageKind::Error, format!("Diff failed: {e}")),
                }
            }
            _ => ViewEvent::None,
        }
    }

    fn render(
        &mut self,
        term: &mut TerminalSession,
        theme: &Theme,
        rows: u16,
        cols: u16,
    ) -> io::Result<()> {
        let width = cols as usize;
        term.move_to(0, 0)?;
        term.set_fg(theme.title)?;
        term.set_bold()?;
        let mode = if self.staged { "staged" } else { "unstaged" };
        let heading = if self.selecting {
            format!("Diff \u{2014} {mode} \u{2014} select lines (Space toggle, s apply, Esc cancel)")
        } else {
            format!("Diff \u{2014} {mode} ({}/{} files)", (self.file_idx + 1).min(self.files.len()), self.files.len())
        };
        term.print(crate::views::truncate_chars(&heading, width))?;
        term.reset_style()?;
        term.clear_line()?;

        let (lines, keep_visible) = self.build_lines(theme);
        let visible = rows.saturating_sub(2) as usize;
        ensure_visible(&mut self.scroll, keep_visible, visible);

        for (row, idx) in (2..rows).zip(self.scroll..) {
            term.move_to(row, 0)?;
            if let Some(segments) = lines.get(idx) {
                draw_segments(term, segments, width)?;
            }
            term.clear_line()?;
        }

        if lines.is_empty() {
            term.move_to(2, 0)?;
            term.set_fg(theme.dim)?;
            let text = if self.loading {
                "Loading\u{2026}"
            } else if self.staged {
                "No staged changes"
            } else {
                "No unstaged changes"
            };
            term.print(text)?;
            term.reset_style()?;
            term.clear_line()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::GitRequest;
    use stagehand_core::DiffLine;

    fn handle() -> (GitHandle, crossbeam_channel::Receiver<GitRequest>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (GitHandle::new(tx), rx)
    }

    fn sample_file() -> FileDiff {
        let hunk = Hunk::new(
            3,
            3,
            vec![
                DiffLine::context("fn main() {", 3, 3),
                DiffLine::deletion("    old();", 4),
                DiffLine::addition("    new();", 4),
                DiffLine::addition("    extra();", 5),
                DiffLine::context("}", 5, 6),
            ],
            None,
        );
        FileDiff { path: "src/main.rs".to_owned(), hunks: vec![hunk] }
    }

    fn loaded_view(git: &GitHandle) -> DiffView {
        let mut view = DiffView::new(None, false);
        view.on_enter(git);
        let reply = GitReply::Diff {
            generation: view.generation,
            staged: false,
            result: Ok(vec![sample_file()]),
        };
        assert_eq!(view.apply_reply(&reply, git), ViewEvent::Redraw);
        view
    }

    #[test]
    fn selection_cursor_walks_change_lines_only() {
        let (git, _rx) = handle();
        let mut view = loaded_view(&git);
        view.handle_key(Key::Char('v'), &git);
        assert_eq!(view.line_cursor, 1);
        view.handle_key(Key::Char('j'), &git);
        assert_eq!(view.line_cursor, 2);
        view.handle_key(Key::Char('j'), &git);
        assert_eq!(view.line_cursor, 3);
        // Last change line: further movement stays put.
        assert_eq!(view.handle_key(Key::Char('j'), &git), ViewEvent::None);
        assert_eq!(view.line_cursor, 3);
    }

    #[test]
    fn staging_a_selection_sends_a_subset_patch() {
        let (git, rx) = handle();
        let mut view = loaded_view(&git);
        while rx.try_recv().is_ok() {}

        view.handle_key(Key::Char('v'), &git);
        view.handle_key(Key::Space, &git);
        view.handle_key(Key::Char('s'), &git);

        match rx.try_recv().unwrap() {
            GitRequest::ApplyPatch { patch, to_index } => {
                assert!(to_index);
                assert!(patch.contains("@@ -3,3 +3,2 @@"));
                assert!(patch.contains("-    old();"));
                assert!(!patch.contains("+    new();"));
            }
            other => panic!("unexpected request: {other:?}"),
        }
        assert!(!view.selecting);
    }

    #[test]
    fn staging_with_empty_selection_is_rejected() {
        let (git, rx) = handle();
        let mut view = loaded_view(&git);
        while rx.try_recv().is_ok() {}

        view.handle_key(Key::Char('v'), &git);
        let event = view.handle_key(Key::Char('s'), &git);
        assert!(matches!(event, ViewEvent::Message(MessageKind::Error, _)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn unstaging_in_staged_mode_sends_a_reversed_patch() {
        let (git, rx) = handle();
        let mut view = DiffView::new(None, true);
        view.on_enter(&git);
        let reply = GitReply::Diff {
            generation: view.generation,
            staged: true,
            result: Ok(vec![sample_file()]),
        };
        view.apply_reply(&reply, &git);
        while rx.try_recv().is_ok() {}

        view.handle_key(Key::Char('u'), &git);
        match rx.try_recv().unwrap() {
            GitRequest::ApplyPatch { patch, to_index } => {
                assert!(to_index);
                // Reversed: the addition becomes a deletion.
                assert!(patch.contains("-    new();"));
                assert!(patch.contains("+    old();"));
            }
            other => panic!("unexpected request: {other:?}"),
        }
    }

    #[test]
    fn stale_or_wrong_mode_replies_are_dropped() {
        let (git, _rx) = handle();
        let mut view = DiffView::new(None, false);
        view.on_enter(&git);
        let wrong_mode = GitReply::Diff {
            generation: view.generation,
            staged: true,
            result: Ok(vec![sample_file()]),
        };
        assert_eq!(view.apply_reply(&wrong_mode, &git), ViewEvent::None);
        assert!(view.files.is_empty());
    }
}
