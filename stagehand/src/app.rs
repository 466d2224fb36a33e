//! The view router and status bar.
//!
//! One view is active at a time. The router feeds keys through the leader
//! sequencer first (unless the active view is taking text input), forwards
//! the rest to the view, and owns the bottom status line: branch and
//! repository on the left, a leader hint or transient message in the middle,
//! the view title on the right.
//!
//! Keys consumed by the sequencer redraw only the status line; everything
//! the views do redraws the frame.

use std::io;
use std::time::{Duration, Instant};

use crate::git::{GitHandle, GitReply};
use crate::keys::Key;
use crate::leader::{LeaderCommand, LeaderEvent, LeaderSequencer};
use crate::term::TerminalSession;
use crate::theme::Theme;
use crate::views::commit::CommitView;
use crate::views::diff::DiffView;
use crate::views::help::HelpView;
use crate::views::log::LogView;
use crate::views::status::StatusView;
use crate::views::{truncate_chars, MessageKind, View, ViewEvent, ViewKind, ViewRequest};

/// Errors and confirmations clear themselves after this long.
const MESSAGE_TTL: Duration = Duration::from_secs(3);

/// What the event loop must do after the router handled something.
///
/// Ordered by how much work each demands, so two actions combine with `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RouterAction {
    None,
    /// Redraw only the status line.
    StatusLine,
    /// Redraw the whole frame.
    Full,
    Quit,
}

struct StatusMessage {
    text: String,
    kind: MessageKind,
    expires: Instant,
}

pub struct Router {
    view: Box<dyn View>,
    kind: ViewKind,
    leader: LeaderSequencer,
    theme: Theme,
    git: GitHandle,
    log_limit: usize,
    message: Option<StatusMessage>,
    hint: Option<String>,
    branch: String,
    repo: String,
}

impl Router {
    /// Starts on the status view and issues the initial branch/status
    /// queries.
    pub fn new(git: GitHandle, theme: Theme, leader_timeout: Duration, log_limit: usize) -> Self {
        let mut view = Box::new(StatusView::new());
        git.request_branch();
        view.on_enter(&git);
        Self {
            view,
            kind: ViewKind::Status,
            leader: LeaderSequencer::new(leader_timeout),
            theme,
            git,
            log_limit,
            message: None,
            hint: None,
            branch: String::new(),
            repo: String::new(),
        }
    }

    fn switch(&mut self, request: ViewRequest) {
        self.kind = request.kind;
        self.view = match request.kind {
            ViewKind::Status => Box::new(StatusView::new()),
            ViewKind::Diff => Box::new(DiffView::new(request.focus, request.staged)),
            ViewKind::Commit => Box::new(CommitView::new()),
            ViewKind::Log => Box::new(LogView::new(self.log_limit)),
            ViewKind::Help => Box::new(HelpView::new()),
        };
        self.view.on_enter(&self.git);
    }

    fn set_message(&mut self, kind: MessageKind, text: String, now: Instant) {
        self.message = Some(StatusMessage { text, kind, expires: now + MESSAGE_TTL });
    }

    /// Routes one key press.
    pub fn handle_key(&mut self, key: Key, now: Instant) -> RouterAction {
        if !self.view.wants_text_input() {
            if let Some(event) = self.leader.handle_key(key, now) {
                return self.apply_leader_event(event, now);
            }
        }
        let event = self.view.handle_key(key, &self.git);
        if event == ViewEvent::None && key == Key::Ctrl('c') {
            return RouterAction::Quit;
        }
        self.apply_view_event(event, now)
    }

    fn apply_leader_event(&mut self, event: LeaderEvent, now: Instant) -> RouterAction {
        match event {
            LeaderEvent::HintShown(hint) => {
                self.hint = Some(hint);
                RouterAction::StatusLine
            }
            LeaderEvent::HintHidden => {
                self.hint = None;
                RouterAction::StatusLine
            }
            LeaderEvent::Error(text) => {
                self.hint = None;
                self.set_message(MessageKind::Error, text, now);
                RouterAction::StatusLine
            }
            LeaderEvent::Command(command) => {
                self.hint = None;
                match command {
                    LeaderCommand::Quit => RouterAction::Quit,
                    LeaderCommand::ViewStatus => {
                        self.switch(ViewRequest::to(ViewKind::Status));
                        RouterAction::Full
                    }
                    LeaderCommand::ViewDiff => {
                        self.switch(ViewRequest::to(ViewKind::Diff));
                        RouterAction::Full
                    }
                    LeaderCommand::ViewCommit => {
                        self.switch(ViewRequest::to(ViewKind::Commit));
                        RouterAction::Full
                    }
                    LeaderCommand::ViewLog => {
                        self.switch(ViewRequest::to(ViewKind::Log));
                        RouterAction::Full
                    }
                    LeaderCommand::Help => {
                        self.switch(ViewRequest::to(ViewKind::Help));
                        RouterAction::Full
                    }
                }
            }
        }
    }

    fn apply_view_event(&mut self, event: ViewEvent, now: Instant) -> RouterAction {
        match event {
            ViewEvent::None => RouterAction::None,
            ViewEvent::Redraw => RouterAction::Full,
            ViewEvent::Message(kind, text) => {
                self.set_message(kind, text, now);
                RouterAction::Full
            }
            ViewEvent::Switch(request) => {
                self.switch(request);
                RouterAction::Full
            }
            ViewEvent::SwitchMessage(request, kind, text) => {
                self.set_message(kind, text, now);
                self.switch(request);
                RouterAction::Full
            }
        }
    }

    /// Routes one git reply.
    pub fn apply_reply(&mut self, reply: &GitReply, now: Instant) -> RouterAction {
        match reply {
            GitReply::Branch { branch, repo } => {
                self.branch = branch.clone();
                self.repo = repo.clone();
                RouterAction::StatusLine
            }
            GitReply::OpDone { op, result } => match result {
                Ok(()) => {
                    // Mutation landed; the refreshed query shows the outcome.
                    self.view.refresh(&self.git);
                    RouterAction::Full
                }
                Err(e) => {
                    self.set_message(MessageKind::Error, format!("{op} failed: {e}"), now);
                    RouterAction::Full
                }
            },
            reply => {
                let event = self.view.apply_reply(reply, &self.git);
                self.apply_view_event(event, now)
            }
        }
    }

    /// Fires time-based transitions: chord timeout and message expiry.
    pub fn poll(&mut self, now: Instant) -> RouterAction {
        let mut action = RouterAction::None;
        if let Some(event) = self.leader.poll_timeout(now) {
            action = action.max(self.apply_leader_event(event, now));
        }
        if self.message.as_ref().is_some_and(|m| now >= m.expires) {
            self.message = None;
            action = action.max(RouterAction::StatusLine);
        }
        action
    }

    /// Draws the whole frame: active view, status bar, cursor.
    pub fn render(&mut self, term: &mut TerminalSession) -> io::Result<()> {
        let (rows, cols) = term.size();
        if rows < 2 {
            return Ok(());
        }
        self.view.render(term, &self.theme, rows - 1, cols)?;
        self.draw_status_bar(term, rows, cols)?;
        self.place_cursor(term)?;
        term.flush()
    }

    /// Redraws only the bottom line (leader hints, message expiry).
    pub fn render_status_line(&mut self, term: &mut TerminalSession) -> io::Result<()> {
        let (rows, cols) = term.size();
        if rows < 2 {
            return Ok(());
        }
        self.draw_status_bar(term, rows, cols)?;
        self.place_cursor(term)?;
        term.flush()
    }

    fn place_cursor(&mut self, term: &mut TerminalSession) -> io::Result<()> {
        match self.view.cursor() {
            Some((row, col)) => {
                term.move_to(row, col)?;
                term.show_cursor()
            }
            None => term.hide_cursor(),
        }
    }

    fn draw_status_bar(
        &mut self,
        term: &mut TerminalSession,
        rows: u16,
        cols: u16,
    ) -> io::Result<()> {
        let width = cols as usize;
        term.move_to(rows - 1, 0)?;
        term.set_bg(self.theme.status_bar_bg)?;
        term.set_fg(self.theme.status_bar_fg)?;

        let left = if self.repo.is_empty() {
            " stagehand ".to_owned()
        } else {
            format!(" {} \u{2325} {} ", self.repo, self.branch)
        };
        let right = format!(" {} \u{2502} Space for commands ", self.view.title());

        let middle = if self.leader.is_awaiting() {
            let hint = self.hint.clone().unwrap_or_else(|| "Space".to_owned());
            (hint, self.theme.hint)
        } else if let Some(message) = &self.message {
            let color = match message.kind {
                MessageKind::Info => self.theme.info,
                MessageKind::Error => self.theme.error,
            };
            (message.text.clone(), color)
        } else {
            (String::new(), self.theme.status_bar_fg)
        };

        let left = truncate_chars(&left, width);
        term.print(&left)?;

        let used = left.chars().count() + right.chars().count();
        let middle_width = width.saturating_sub(used);
        let middle_text = truncate_chars(&middle.0, middle_width);
        let pad_left = middle_width.saturating_sub(middle_text.chars().count()) / 2;
        let pad_right = middle_width - pad_left - middle_text.chars().count();

        term.print(" ".repeat(pad_left))?;
        term.set_fg(middle.1)?;
        term.print(&middle_text)?;
        term.set_fg(self.theme.status_bar_fg)?;
        term.print(" ".repeat(pad_right))?;

        term.print(truncate_chars(&right, width.saturating_sub(left.chars().count())))?;
        term.reset_style()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::GitRequest;

    fn router() -> (Router, crossbeam_channel::Receiver<GitRequest>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let git = GitHandle::new(tx);
        let router = Router::new(git, Theme::dark(), Duration::from_secs(2), 50);
        (router, rx)
    }

    #[test]
    fn startup_queries_branch_and_status() {
        let (_router, rx) = router();
        assert_eq!(rx.try_recv().unwrap(), GitRequest::Branch);
        assert!(matches!(rx.try_recv().unwrap(), GitRequest::Status { .. }));
    }

    #[test]
    fn leader_chord_switches_views_with_a_full_redraw() {
        let (mut router, _rx) = router();
        let now = Instant::now();
        assert_eq!(router.handle_key(Key::Space, now), RouterAction::StatusLine);
        assert_eq!(router.handle_key(Key::Char('g'), now), RouterAction::StatusLine);
        assert_eq!(router.handle_key(Key::Char('l'), now), RouterAction::Full);
        assert_eq!(router.kind, ViewKind::Log);
    }

    #[test]
    fn leader_quit_exits() {
        let (mut router, _rx) = router();
        let now = Instant::now();
        router.handle_key(Key::Space, now);
        assert_eq!(router.handle_key(Key::Char('q'), now), RouterAction::Quit);
    }

    #[test]
    fn chord_timeout_produces_a_transient_error() {
        let (mut router, _rx) = router();
        let now = Instant::now();
        router.handle_key(Key::Space, now);
        router.handle_key(Key::Char('g'), now);
        let later = now + Duration::from_secs(3);
        assert_eq!(router.poll(later), RouterAction::StatusLine);
        assert!(router.message.as_ref().unwrap().text.contains("timeout"));

        // The message clears itself after its TTL.
        let much_later = later + Duration::from_secs(4);
        assert_eq!(router.poll(much_later), RouterAction::StatusLine);
        assert!(router.message.is_none());
    }

    #[test]
    fn ctrl_c_quits_when_the_view_ignores_it() {
        let (mut router, _rx) = router();
        assert_eq!(router.handle_key(Key::Ctrl('c'), Instant::now()), RouterAction::Quit);
    }

    #[test]
    fn failed_operation_surfaces_as_an_error_message() {
        let (mut router, _rx) = router();
        let reply = GitReply::OpDone {
            op: "stage",
            result: Err(crate::git::GitError("index locked".to_owned())),
        };
        assert_eq!(router.apply_reply(&reply, Instant::now()), RouterAction::Full);
        let message = router.message.as_ref().unwrap();
        assert_eq!(message.kind, MessageKind::Error);
        assert!(message.text.contains("index locked"));
    }
}
