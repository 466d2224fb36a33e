//! Working-tree status view.
//!
//! Files are grouped into a staged section and an unstaged section; a file
//! with both index and working-tree changes appears in both. The cursor
//! moves over file rows only, skipping section headers.

use std::io;

use stagehand_core::FileStatus;

use crate::git::{GitHandle, GitReply};
use crate::keys::Key;
use crate::term::TerminalSession;
use crate::theme::Theme;
use crate::views::{
    ensure_visible, truncate_chars, MessageKind, View, ViewEvent, ViewKind, ViewRequest,
};

/// One display row.
enum Row {
    Header(&'static str),
    /// Index into `files`, and whether this row sits in the staged section.
    File(usize, bool),
    Blank,
}

pub struct StatusView {
    files: Vec<FileStatus>,
    rows: Vec<Row>,
    /// Cursor as an index into `rows`; always on a `Row::File` when any exist.
    cursor: usize,
    scroll: usize,
    generation: u64,
    loading: bool,
}

impl StatusView {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            rows: Vec::new(),
            cursor: 0,
            scroll: 0,
            generation: 0,
            loading: true,
        }
    }

    fn rebuild_rows(&mut self) {
        let staged: Vec<usize> =
            (0..self.files.len()).filter(|&i| self.files[i].staged).collect();
        let unstaged: Vec<usize> =
            (0..self.files.len()).filter(|&i| self.files[i].can_stage() || self.files[i].conflicted).collect();

        let mut rows = Vec::new();
        if !staged.is_empty() {
            rows.push(Row::Header("Staged Changes"));
            rows.extend(staged.into_iter().map(|i| Row::File(i, true)));
            rows.push(Row::Blank);
        }
        if !unstaged.is_empty() {
            rows.push(Row::Header("Changes"));
            rows.extend(unstaged.into_iter().map(|i| Row::File(i, false)));
        }
        self.rows = rows;
        self.snap_cursor(0);
    }

    /// Moves the cursor to the nearest file row at or after `from`, falling
    /// back to the last file row.
    fn snap_cursor(&mut self, from: usize) {
        let forward = (from..self.rows.len()).find(|&i| matches!(self.rows[i], Row::File(..)));
        let backward = (0..self.rows.len().min(from + 1))
            .rev()
            .find(|&i| matches!(self.rows[i], Row::File(..)));
        self.cursor = forward.or(backward).unwrap_or(0);
    }

    fn move_cursor(&mut self, down: bool) -> bool {
        let positions: Vec<usize> = (0..self.rows.len())
            .filter(|&i| matches!(self.rows[i], Row::File(..)))
            .collect();
        let Some(current) = positions.iter().position(|&i| i == self.cursor) else {
            return false;
        };
        let next = if down { current + 1 } else { current.wrapping_sub(1) };
        match positions.get(next) {
            Some(&row) => {
                self.cursor = row;
                true
            }
            None => false,
        }
    }

    fn selected(&self) -> Option<(&FileStatus, bool)> {
        match self.rows.get(self.cursor) {
            Some(&Row::File(i, in_staged)) => Some((&self.files[i], in_staged)),
            _ => None,
        }
    }
}

impl View for StatusView {
    fn title(&self) -> &str {
        "Status"
    }

    fn on_enter(&mut self, git: &GitHandle) {
        self.loading = true;
        self.generation = git.request_status();
    }

    fn handle_key(&mut self, key: Key, git: &GitHandle) -> ViewEvent {
        match key {
            Key::Char('j') | Key::Down => {
                if self.move_cursor(true) {
                    ViewEvent::Redraw
                } else {
                    ViewEvent::None
                }
            }
            Key::Char('k') | Key::Up => {
                if self.move_cursor(false) {
                    ViewEvent::Redraw
                } else {
                    ViewEvent::None
                }
            }
            Key::Char('s') => match self.selected() {
                Some((file, _)) if file.can_stage() => {
                    git.stage_path(file.path.clone());
                    ViewEvent::Redraw
                }
                Some((file, _)) => {
                    ViewEvent::Message(MessageKind::Error, format!("Nothing to stage in {}", file.path))
                }
                None => ViewEvent::None,
            },
            Key::Char('u') => match self.selected() {
                Some((file, _)) if file.can_unstage() => {
                    git.unstage_path(file.path.clone());
                    ViewEvent::Redraw
                }
                Some((file, _)) => {
                    ViewEvent::Message(MessageKind::Error, format!("{} is not staged", file.path))
                }
                None => ViewEvent::None,
            },
            Key::Char('d') => match self.selected() {
                Some((file, false)) => {
                    git.discard(file.path.clone());
                    ViewEvent::Message(MessageKind::Info, format!("Discarding changes to {}", file.path))
                }
                Some((_, true)) => {
                    ViewEvent::Message(MessageKind::Error, "Unstage before discarding".to_owned())
                }
                None => ViewEvent::None,
            },
            Key::Char('r') => {
                self.on_enter(git);
                ViewEvent::Redraw
            }
            Key::Enter => match self.selected() {
                Some((file, in_staged)) => ViewEvent::Switch(ViewRequest {
                    kind: ViewKind::Diff,
                    focus: Some(file.path.clone()),
                    staged: in_staged,
                }),
                None => ViewEvent::None,
            },
            _ => ViewEvent::None,
        }
    }

    fn apply_reply(&mut self, reply: &GitReply, _git: &GitHandle) -> ViewEvent {
        match reply {
            GitReply::Status { generation, result } if *generation == self.generation => {
                self.loading = false;
                match result {
                    Ok(files) => {
                        let previous = self.cursor;
                        self.files = files.clone();
                        self.rebuild_rows();
                        self.snap_cursor(previous.min(self.rows.len().saturating_sub(1)));
                        ViewEvent::Redraw
                    }
                    Err(e) => ViewEvent::Message(MessageKind::Error, format!("Status failed: {e}")),
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
        term.print(truncate_chars("Repository Status", width))?;
        term.reset_style()?;
        term.clear_line()?;

        let visible = rows.saturating_sub(2) as usize;
        ensure_visible(&mut self.scroll, self.cursor, visible);

        for (line, row) in (2..rows).zip(self.scroll..) {
            term.move_to(line, 0)?;
            match self.rows.get(row) {
                Some(Row::Header(text)) => {
                    term.set_fg(theme.section)?;
                    term.set_bold()?;
                    term.print(truncate_chars(text, width))?;
                    term.reset_style()?;
                }
                Some(&Row::File(i, _)) => {
                    let file = &self.files[i];
                    let indicator = file.indicator();
                    let selected = row == self.cursor;
                    if selected {
                        term.set_bg(theme.cursor_bg)?;
                        term.set_fg(theme.cursor_fg)?;
                    } else {
                        term.set_fg(indicator_color(indicator, theme))?;
                    }
                    let text = format!("  {indicator} {}", file.path);
                    term.print(truncate_chars(&text, width))?;
                    term.reset_style()?;
                }
                Some(Row::Blank) | None => {}
            }
            term.clear_line()?;
        }

        if self.rows.is_empty() {
            term.move_to(2, 0)?;
            term.set_fg(theme.dim)?;
            let text = if self.loading { "Loading…" } else { "Working tree clean" };
            term.print(text)?;
            term.reset_style()?;
            term.clear_line()?;
        }
        Ok(())
    }
}

fn indicator_color(indicator: char, theme: &Theme) -> crossterm::style::Color {
    match indicator {
        'S' => theme.added,
        'M' => theme.modified,
        'D' | 'U' => theme.removed,
        '?' => theme.dim,
        _ => theme.modified,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::GitRequest;

    fn handle() -> (GitHandle, crossbeam_channel::Receiver<GitRequest>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (GitHandle::new(tx), rx)
    }

    fn file(path: &str, staged: bool, modified: bool) -> FileStatus {
        let mut f = FileStatus::new(path);
        f.staged = staged;
        f.modified = modified;
        f
    }

    fn loaded_view(git: &GitHandle, view: &mut StatusView, files: Vec<FileStatus>) {
        view.on_enter(git);
        let reply = GitReply::Status { generation: view.generation, result: Ok(files) };
        assert_eq!(view.apply_reply(&reply, git), ViewEvent::Redraw);
    }

    #[test]
    fn cursor_starts_on_the_first_file_row() {
        let (git, _rx) = handle();
        let mut view = StatusView::new();
        loaded_view(&git, &mut view, vec![file("a.rs", true, false), file("b.rs", false, true)]);
        assert!(matches!(view.rows[view.cursor], Row::File(..)));
    }

    #[test]
    fn stale_status_reply_is_dropped() {
        let (git, _rx) = handle();
        let mut view = StatusView::new();
        view.on_enter(&git);
        let stale = GitReply::Status { generation: view.generation - 1, result: Ok(vec![]) };
        assert_eq!(view.apply_reply(&stale, &git), ViewEvent::None);
        assert!(view.loading);
    }

    #[test]
    fn staging_sends_the_request_for_the_selected_path() {
        let (git, rx) = handle();
        let mut view = StatusView::new();
        loaded_view(&git, &mut view, vec![file("b.rs", false, true)]);
        while rx.try_recv().is_ok() {}

        view.handle_key(Key::Char('s'), &git);
        assert_eq!(rx.try_recv().unwrap(), GitRequest::StagePath("b.rs".to_owned()));
    }

    #[test]
    fn enter_switches_to_a_focused_diff() {
        let (git, _rx) = handle();
        let mut view = StatusView::new();
        loaded_view(&git, &mut view, vec![file("b.rs", false, true)]);
        match view.handle_key(Key::Enter, &git) {
            ViewEvent::Switch(request) => {
                assert_eq!(request.kind, ViewKind::Diff);
                assert_eq!(request.focus.as_deref(), Some("b.rs"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
