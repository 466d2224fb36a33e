//! Keybinding overview.

use std::io;

use crate::git::{GitHandle, GitReply};
use crate::keys::Key;
use crate::leader::LeaderSequencer;
use crate::term::TerminalSession;
use crate::theme::Theme;
use crate::views::{truncate_chars, View, ViewEvent, ViewKind, ViewRequest};

const VIEW_KEYS: &[(&str, &[(&str, &str)])] = &[
    (
        "Status view",
        &[
            ("j / k", "Move between files"),
            ("s", "Stage file"),
            ("u", "Unstage file"),
            ("d", "Discard working-tree changes"),
            ("Enter", "Open diff for file"),
            ("r", "Refresh"),
        ],
    ),
    (
        "Diff view",
        &[
            ("j / k", "Next / previous hunk"),
            ("J / K", "Next / previous file"),
            ("Tab", "Toggle staged/unstaged"),
            ("s", "Stage hunk (or selected lines)"),
            ("u", "Unstage hunk (or selected lines)"),
            ("S / U", "Stage or unstage whole file"),
            ("v", "Select individual lines (Space toggles)"),
            ("Esc", "Leave line selection"),
        ],
    ),
    (
        "Commit view",
        &[
            ("i", "Insert mode"),
            ("Esc", "Back to normal mode"),
            ("Ctrl-P / Ctrl-N", "Older / newer message from history"),
            ("Ctrl-C", "Create commit"),
            ("Ctrl-A", "Amend previous commit"),
        ],
    ),
    ("Log view", &[("j / k", "Scroll"), ("r", "Refresh")]),
];

pub struct HelpView {
    scroll: usize,
    line_count: usize,
}

impl HelpView {
    pub fn new() -> Self {
        Self { scroll: 0, line_count: 0 }
    }
}

impl View for HelpView {
    fn title(&self) -> &str {
        "Help"
    }

    fn on_enter(&mut self, _git: &GitHandle) {}

    fn handle_key(&mut self, key: Key, _git: &GitHandle) -> ViewEvent {
        match key {
            Key::Char('j') | Key::Down if self.scroll + 1 < self.line_count => {
                self.scroll += 1;
                ViewEvent::Redraw
            }
            Key::Char('k') | Key::Up if self.scroll > 0 => {
                self.scroll -= 1;
                ViewEvent::Redraw
            }
            Key::Escape => ViewEvent::Switch(ViewRequest::to(ViewKind::Status)),
            _ => ViewEvent::None,
        }
    }

    fn apply_reply(&mut self, _reply: &GitReply, _git: &GitHandle) -> ViewEvent {
        ViewEvent::None
    }

    fn render(
        &mut self,
        term: &mut TerminalSession,
        theme: &Theme,
        rows: u16,
        cols: u16,
    ) -> io::Result<()> {
        let width = cols as usize;

        // (section header?, key, description)
        let mut entries: Vec<(bool, String, String)> = Vec::new();
        entries.push((true, "Leader commands".to_owned(), String::new()));
        for (chord, description) in LeaderSequencer::available_commands() {
            entries.push((false, chord, description.to_owned()));
        }
        for (section, keys) in VIEW_KEYS {
            entries.push((true, (*section).to_owned(), String::new()));
            for (key, description) in *keys {
                entries.push((false, (*key).to_owned(), (*description).to_owned()));
            }
        }
        self.line_count = entries.len();

        term.move_to(0, 0)?;
        term.set_fg(theme.title)?;
        term.set_bold()?;
        term.print("Help")?;
        term.reset_style()?;
        term.clear_line()?;

        let visible = rows.saturating_sub(2) as usize;
        self.scroll = self.scroll.min(self.line_count.saturating_sub(visible));

        for (row, idx) in (2..rows).zip(self.scroll..) {
            term.move_to(row, 0)?;
            if let Some((is_header, key, description)) = entries.get(idx) {
                if *is_header {
                    term.set_fg(theme.section)?;
                    term.set_bold()?;
                    term.print(truncate_chars(key, width))?;
                    term.reset_style()?;
                } else {
                    term.set_fg(theme.hint)?;
                    term.print(format!("  {key:<18}"))?;
                    term.reset_style()?;
                    term.print(truncate_chars(description, width.saturating_sub(20)))?;
                }
            }
            term.clear_line()?;
        }
        Ok(())
    }
}
