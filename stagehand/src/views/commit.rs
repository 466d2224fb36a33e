//! Commit message editor.
//!
//! A small modal editor: normal mode for navigation and history recall,
//! insert mode for typing. The terminal cursor is shown in insert mode at
//! the exact cell of the edit position, so the mapping between the message
//! buffer and screen rows is fixed: message line `n` renders on screen row
//! `MESSAGE_TOP + n`.

use std::io;

use stagehand_core::FileStatus;

use crate::git::{GitHandle, GitReply};
use crate::keys::Key;
use crate::term::TerminalSession;
use crate::theme::Theme;
use crate::views::{
    truncate_chars, MessageKind, View, ViewEvent, ViewKind, ViewRequest,
};

/// Screen row of the first message line.
const MESSAGE_TOP: u16 = 2;
/// Commits fetched for history recall.
const HISTORY_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Insert,
}

pub struct CommitView {
    lines: Vec<String>,
    row: usize,
    col: usize,
    mode: Mode,
    /// Recent commit subjects, newest first.
    history: Vec<String>,
    history_idx: Option<usize>,
    staged: Vec<FileStatus>,
    status_generation: u64,
    log_generation: u64,
    commit_generation: u64,
    committing: bool,
}

impl CommitView {
    pub fn new() -> Self {
        Self {
            lines: vec![String::new()],
            row: 0,
            col: 0,
            mode: Mode::Normal,
            history: Vec::new(),
            history_idx: None,
            staged: Vec::new(),
            status_generation: 0,
            log_generation: 0,
            commit_generation: 0,
            committing: false,
        }
    }

    fn message(&self) -> String {
        self.lines.join("\n").trim_end().to_owned()
    }

    fn clamp_col(&mut self) {
        self.col = self.col.min(self.lines[self.row].chars().count());
    }

    fn insert_char(&mut self, c: char) {
        let line = &mut self.lines[self.row];
        let byte = char_to_byte(line, self.col);
        line.insert(byte, c);
        self.col += 1;
    }

    fn insert_newline(&mut self) {
        let line = &mut self.lines[self.row];
        let byte = char_to_byte(line, self.col);
        let rest = line.split_off(byte);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
    }

    fn backspace(&mut self) {
        if self.col > 0 {
            let line = &mut self.lines[self.row];
            let byte = char_to_byte(line, self.col - 1);
            line.remove(byte);
            self.col -= 1;
        } else if self.row > 0 {
            let removed = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.lines[self.row].chars().count();
            self.lines[self.row].push_str(&removed);
        }
    }

    fn recall_history(&mut self, older: bool) -> ViewEvent {
        if self.history.is_empty() {
            return ViewEvent::Message(MessageKind::Error, "No commit history yet".to_owned());
        }
        let next = match (self.history_idx, older) {
            (None, true) => Some(0),
            (None, false) => return ViewEvent::None,
            (Some(i), true) => Some((i + 1).min(self.history.len() - 1)),
            (Some(0), false) => None,
            (Some(i), false) => Some(i - 1),
        };
        self.history_idx = next;
        self.lines = match next {
            Some(i) => vec![self.history[i].clone()],
            None => vec![String::new()],
        };
        self.row = 0;
        self.col = self.lines[0].chars().count();
        ViewEvent::Redraw
    }

    fn submit(&mut self, git: &GitHandle, amend: bool) -> ViewEvent {
        if self.committing {
            return ViewEvent::None;
        }
        let message = self.message();
        if message.is_empty() {
            return ViewEvent::Message(MessageKind::Error, "Commit message is empty".to_owned());
        }
        if self.staged.is_empty() && !amend {
            return ViewEvent::Message(MessageKind::Error, "Nothing staged to commit".to_owned());
        }
        self.committing = true;
        self.commit_generation = git.request_commit(message, amend);
        ViewEvent::Redraw
    }

    fn handle_insert_key(&mut self, key: Key, git: &GitHandle) -> ViewEvent {
        match key {
            Key::Escape => {
                self.mode = Mode::Normal;
                ViewEvent::Redraw
            }
            Key::Enter => {
                self.insert_newline();
                ViewEvent::Redraw
            }
            Key::Backspace => {
                self.backspace();
                ViewEvent::Redraw
            }
            Key::Space => {
                self.insert_char(' ');
                ViewEvent::Redraw
            }
            Key::Char(c) => {
                self.insert_char(c);
                ViewEvent::Redraw
            }
            Key::Ctrl('c') => self.submit(git, false),
            Key::Ctrl('a') => self.submit(git, true),
            key => self.handle_motion(key),
        }
    }

    fn handle_motion(&mut self, key: Key) -> ViewEvent {
        match key {
            Key::Left => {
                self.col = self.col.saturating_sub(1);
                ViewEvent::Redraw
            }
            Key::Right => {
                self.col += 1;
                self.clamp_col();
                ViewEvent::Redraw
            }
            Key::Up if self.row > 0 => {
                self.row -= 1;
                self.clamp_col();
                ViewEvent::Redraw
            }
            Key::Down if self.row + 1 < self.lines.len() => {
                self.row += 1;
                self.clamp_col();
                ViewEvent::Redraw
            }
            _ => ViewEvent::None,
        }
    }
}

/// Byte offset of the `col`-th character.
fn char_to_byte(line: &str, col: usize) -> usize {
    line.char_indices().nth(col).map_or(line.len(), |(i, _)| i)
}

impl View for CommitView {
    fn title(&self) -> &str {
        "Commit"
    }

    fn on_enter(&mut self, git: &GitHandle) {
        self.status_generation = git.request_status();
        self.log_generation = git.request_log(HISTORY_LIMIT);
    }

    fn wants_text_input(&self) -> bool {
        self.mode == Mode::Insert
    }

    fn cursor(&self) -> Option<(u16, u16)> {
        if self.mode == Mode::Insert {
            Some((MESSAGE_TOP + self.row as u16, self.col as u16))
        } else {
            None
        }
    }

    fn handle_key(&mut self, key: Key, git: &GitHandle) -> ViewEvent {
        if self.mode == Mode::Insert {
            return self.handle_insert_key(key, git);
        }
        match key {
            Key::Char('i') => {
                self.mode = Mode::Insert;
                ViewEvent::Redraw
            }
            Key::Char('h') => self.handle_motion(Key::Left),
            Key::Char('l') => self.handle_motion(Key::Right),
            Key::Char('j') => self.handle_motion(Key::Down),
            Key::Char('k') => self.handle_motion(Key::Up),
            Key::Ctrl('p') => self.recall_history(true),
            Key::Ctrl('n') => self.recall_history(false),
            Key::Ctrl('c') => self.submit(git, false),
            Key::Ctrl('a') => self.submit(git, true),
            key => self.handle_motion(key),
        }
    }

    fn apply_reply(&mut self, reply: &GitReply, _git: &GitHandle) -> ViewEvent {
        match reply {
            GitReply::Status { generation, result } if *generation == self.status_generation => {
                if let Ok(files) = result {
                    self.staged = files.iter().filter(|f| f.staged).cloned().collect();
                }
                ViewEvent::Redraw
            }
            GitReply::Log { generation, result } if *generation == self.log_generation => {
                if let Ok(commits) = result {
                    self.history = commits.iter().map(|c| c.summary.clone()).collect();
                }
                ViewEvent::None
            }
            GitReply::Committed { generation, amend, result }
                if *generation == self.commit_generation =>
            {
                self.committing = false;
                match result {
                    Ok(id) => {
                        self.lines = vec![String::new()];
                        self.row = 0;
                        self.col = 0;
                        self.history_idx = None;
                        self.mode = Mode::Normal;
                        let short = truncate_chars(id, 7);
                        let verb = if *amend { "Amended" } else { "Created" };
                        ViewEvent::SwitchMessage(
                            ViewRequest::to(ViewKind::Status),
                            MessageKind::Info,
                            format!("{verb} commit {short}"),
                        )
                    }
                    Err(e) => {
                        ViewEvent::Message(MessageKind::Error, format!("Commit failed: {e}"))
                    }
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
        term.print("Commit")?;
        term.reset_style()?;
        if self.mode == Mode::Insert {
            term.print("  ")?;
            term.set_fg(theme.mode_insert)?;
            term.print("-- INSERT --")?;
            term.reset_style()?;
        }
        term.clear_line()?;

        // Message buffer; rows MESSAGE_TOP..MESSAGE_TOP+lines.
        for (i, line) in self.lines.iter().enumerate() {
            let screen_row = MESSAGE_TOP + i as u16;
            if screen_row >= rows {
                break;
            }
            term.move_to(screen_row, 0)?;
            term.print(truncate_chars(line, width))?;
            term.clear_line()?;
        }

        let mut row = MESSAGE_TOP + self.lines.len() as u16 + 1;
        if row < rows {
            term.move_to(row, 0)?;
            term.set_fg(theme.section)?;
            term.set_bold()?;
            term.print(format!("Staged files ({})", self.staged.len()))?;
            term.reset_style()?;
            term.clear_line()?;
            row += 1;
        }
        for file in &self.staged {
            if row >= rows {
                break;
            }
            term.move_to(row, 0)?;
            term.set_fg(theme.added)?;
            term.print(truncate_chars(&format!("  S {}", file.path), width))?;
            term.reset_style()?;
            term.clear_line()?;
            row += 1;
        }

        for clear_row in row..rows {
            term.move_to(clear_row, 0)?;
            term.clear_line()?;
        }

        if row + 1 < rows {
            term.move_to(rows - 1, 0)?;
            term.set_fg(theme.dim)?;
            let hint = if self.mode == Mode::Insert {
                "Esc normal \u{2022} Ctrl-C commit \u{2022} Ctrl-A amend"
            } else {
                "i insert \u{2022} Ctrl-P/Ctrl-N history \u{2022} Ctrl-C commit \u{2022} Ctrl-A amend"
            };
            term.print(truncate_chars(hint, width))?;
            term.reset_style()?;
            term.clear_line()?;
        }
        Ok(())
    }
}
