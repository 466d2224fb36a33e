//! Recent-commit list.

use std::io;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::git::{CommitSummary, GitHandle, GitReply};
use crate::keys::Key;
use crate::term::TerminalSession;
use crate::theme::Theme;
use crate::views::{ensure_visible, truncate_chars, MessageKind, View, ViewEvent};

pub struct LogView {
    limit: usize,
    commits: Vec<CommitSummary>,
    cursor: usize,
    scroll: usize,
    generation: u64,
    loading: bool,
}

impl LogView {
    pub fn new(limit: usize) -> Self {
        Self { limit, commits: Vec::new(), cursor: 0, scroll: 0, generation: 0, loading: true }
    }
}

impl View for LogView {
    fn title(&self) -> &str {
        "Log"
    }

    fn on_enter(&mut self, git: &GitHandle) {
        self.loading = true;
        self.generation = git.request_log(self.limit);
    }

    fn handle_key(&mut self, key: Key, git: &GitHandle) -> ViewEvent {
        match key {
            Key::Char('j') | Key::Down if self.cursor + 1 < self.commits.len() => {
                self.cursor += 1;
                ViewEvent::Redraw
            }
            Key::Char('k') | Key::Up if self.cursor > 0 => {
                self.cursor -= 1;
                ViewEvent::Redraw
            }
            Key::Char('r') => {
                self.on_enter(git);
                ViewEvent::Redraw
            }
            _ => ViewEvent::None,
        }
    }

    fn apply_reply(&mut self, reply: &GitReply, _git: &GitHandle) -> ViewEvent {
        match reply {
            GitReply::Log { generation, result } if *generation == self.generation => {
                self.loading = false;
                match result {
                    Ok(commits) => {
                        self.commits = commits.clone();
                        self.cursor = self.cursor.min(self.commits.len().saturating_sub(1));
                        ViewEvent::Redraw
                    }
                    Err(e) => ViewEvent::Message(MessageKind::Error, format!("Log failed: {e}")),
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
        term.print(format!("Log \u{2014} {} commits", self.commits.len()))?;
        term.reset_style()?;
        term.clear_line()?;

        let visible = rows.saturating_sub(2) as usize;
        ensure_visible(&mut self.scroll, self.cursor, visible);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_secs() as i64);

        for (row, idx) in (2..rows).zip(self.scroll..) {
            term.move_to(row, 0)?;
            if let Some(commit) = self.commits.get(idx) {
                if idx == self.cursor {
                    term.set_bg(theme.cursor_bg)?;
                    term.set_fg(theme.cursor_fg)?;
                } else {
                    term.set_fg(theme.modified)?;
                }
                term.print(&commit.id)?;
                if idx != self.cursor {
                    term.reset_style()?;
                }
                let rest = format!(
                    " {}  ({}, {})",
                    commit.summary,
                    commit.author,
                    relative_age(now - commit.time_secs)
                );
                term.print(truncate_chars(&rest, width.saturating_sub(commit.id.len())))?;
                term.reset_style()?;
            }
            term.clear_line()?;
        }

        if self.commits.is_empty() {
            term.move_to(2, 0)?;
            term.set_fg(theme.dim)?;
            let text = if self.loading { "Loading\u{2026}" } else { "No commits yet" };
            term.print(text)?;
            term.reset_style()?;
            term.clear_line()?;
        }
        Ok(())
    }
}

/// Coarse human-readable age ("3h ago").
fn relative_age(delta_secs: i64) -> String {
    let delta = delta_secs.max(0) as u64;
    match delta {
        0..60 => "just now".to_owned(),
        60..3600 => format!("{}m ago", delta / 60),
        3600..86_400 => format!("{}h ago", delta / 3600),
        86_400..2_592_000 => format!("{}d ago", delta / 86_400),
        _ => format!("{}mo ago", delta / 2_592_000),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn age_buckets_round_down() {
        assert_eq!(relative_age(30), "just now");
        assert_eq!(relative_age(90), "1m ago");
        assert_eq!(relative_age(7200), "2h ago");
        assert_eq!(relative_age(200_000), "2d ago");
        assert_eq!(relative_age(6_000_000), "2mo ago");
    }

    #[test]
    fn cursor_stops_at_the_ends() {
        let (tx, _rx) = crossbeam_channel::unbounded();
        let git = GitHandle::new(tx);
        let mut view = LogView::new(10);
        view.commits = vec![
            CommitSummary {
                id: "a".into(),
                summary: "one".into(),
                author: "x".into(),
                time_secs: 0,
            },
            CommitSummary {
                id: "b".into(),
                summary: "two".into(),
                author: "x".into(),
                time_secs: 0,
            },
        ];
        assert_eq!(view.handle_key(Key::Char('k'), &git), ViewEvent::None);
        assert_eq!(view.handle_key(Key::Char('j'), &git), ViewEvent::Redraw);
        assert_eq!(view.handle_key(Key::Char('j'), &git), ViewEvent::None);
    }
}
