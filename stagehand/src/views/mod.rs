//! The view layer: one module per full-screen view plus the shared contract.
//!
//! Views own their state and respond to keys and git replies by returning a
//! [`ViewEvent`]; the router translates events into redraws, view switches,
//! and status-bar messages. Views never write to the terminal outside their
//! `render` call and never talk to each other directly.

pub mod commit;
pub mod diff;
pub mod help;
pub mod log;
pub mod status;

use std::io;

use crate::git::{GitHandle, GitReply};
use crate::highlight::Segment;
use crate::keys::Key;
use crate::term::TerminalSession;
use crate::theme::Theme;

/// Identifies each full-screen view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Status,
    Diff,
    Commit,
    Log,
    Help,
}

/// A request to switch views, optionally focused on one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewRequest {
    pub kind: ViewKind,
    /// Restricts the target view to this path (status → diff on Enter).
    pub focus: Option<String>,
    /// Opens the diff view in staged mode (Enter on a staged-section row).
    pub staged: bool,
}

impl ViewRequest {
    pub fn to(kind: ViewKind) -> Self {
        Self { kind, focus: None, staged: false }
    }
}

/// Severity of a transient status-bar message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Info,
    Error,
}

/// What a view wants the router to do after handling input or a reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// Nothing changed; the key was not handled.
    None,
    /// View state changed; redraw the frame.
    Redraw,
    /// Show a transient message (implies a redraw).
    Message(MessageKind, String),
    /// Switch to another view.
    Switch(ViewRequest),
    /// Switch views and announce an outcome (commit success).
    SwitchMessage(ViewRequest, MessageKind, String),
}

/// Contract every full-screen view implements.
pub trait View {
    /// Short name shown in the status bar.
    fn title(&self) -> &str;

    /// Called when the view becomes active; issues its initial git queries.
    fn on_enter(&mut self, git: &GitHandle);

    /// Re-queries the backend after a mutation completed elsewhere.
    fn refresh(&mut self, git: &GitHandle) {
        self.on_enter(git);
    }

    /// Handles one key that the leader sequencer did not consume.
    fn handle_key(&mut self, key: Key, git: &GitHandle) -> ViewEvent;

    /// Applies a git reply; stale generations are dropped inside the view.
    fn apply_reply(&mut self, reply: &GitReply, git: &GitHandle) -> ViewEvent;

    /// Draws the view into rows `0..rows` (the status bar lives below).
    fn render(
        &mut self,
        term: &mut TerminalSession,
        theme: &Theme,
        rows: u16,
        cols: u16,
    ) -> io::Result<()>;

    /// While true, printable keys (including Space) bypass the leader
    /// sequencer and reach the view as text.
    fn wants_text_input(&self) -> bool {
        false
    }

    /// Terminal cursor position to show, if the view edits text.
    fn cursor(&self) -> Option<(u16, u16)> {
        None
    }
}

/// Scrolls a window so `cursor` stays visible within `visible` rows.
pub fn ensure_visible(scroll: &mut usize, cursor: usize, visible: usize) {
    if visible == 0 {
        return;
    }
    if cursor < *scroll {
        *scroll = cursor;
    } else if cursor >= *scroll + visible {
        *scroll = cursor + 1 - visible;
    }
}

/// Truncates to at most `width` characters.
///
/// Char-based rather than byte-based so multibyte content in diffs cannot
/// split a codepoint mid-sequence.
pub fn truncate_chars(text: &str, width: usize) -> String {
    text.chars().take(width).collect()
}

/// Writes one run of styled segments at the current cursor position,
/// truncated to `width` characters in total.
pub fn draw_segments(
    term: &mut TerminalSession,
    segments: &[Segment],
    width: usize,
) -> io::Result<()> {
    let mut remaining = width;
    for segment in segments {
        if remaining == 0 {
            break;
        }
        let text = truncate_chars(&segment.text, remaining);
        remaining -= text.chars().count();
        if let Some(fg) = segment.fg {
            term.set_fg(fg)?;
        }
        if segment.bold {
            term.set_bold()?;
        }
        term.print(&text)?;
        term.reset_style()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_follows_the_cursor_both_ways() {
        let mut scroll = 0;
        ensure_visible(&mut scroll, 12, 10);
        assert_eq!(scroll, 3);
        ensure_visible(&mut scroll, 3, 10);
        assert_eq!(scroll, 3);
        ensure_visible(&mut scroll, 1, 10);
        assert_eq!(scroll, 1);
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        assert_eq!(truncate_chars("héllo", 3), "hél");
        assert_eq!(truncate_chars("ok", 10), "ok");
    }
}
