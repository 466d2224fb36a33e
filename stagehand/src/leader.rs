//! The leader-key chord state machine.
//!
//! Space opens a chord; subsequent letters/digits accumulate in a buffer that
//! is matched as an exact string prefix against the sorted command table. The
//! sequencer owns its state exclusively and communicates by returning tagged
//! events, never by holding a callback into the application.
//!
//! Timeouts are not driven by a timer thread: the event loop passes the
//! current instant into [`LeaderSequencer::poll_timeout`] once per iteration
//! (the loop's ~100 ms heartbeat guarantees the deadline fires promptly even
//! with no further keystrokes).

use std::time::{Duration, Instant};

use crate::keys::Key;

/// Semantic commands reachable through the leader key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeaderCommand {
    ViewStatus,
    ViewCommit,
    ViewDiff,
    ViewLog,
    Help,
    Quit,
}

/// The command table, sorted by chord so prefix matching scans a sorted set.
const COMMANDS: &[(&str, LeaderCommand)] = &[
    ("gc", LeaderCommand::ViewCommit),
    ("gd", LeaderCommand::ViewDiff),
    ("gl", LeaderCommand::ViewLog),
    ("gs", LeaderCommand::ViewStatus),
    ("h", LeaderCommand::Help),
    ("q", LeaderCommand::Quit),
];

/// Events the sequencer emits toward the router.
///
/// Exactly one event accompanies every consumed key, so the caller can
/// re-render the hint line without guessing what changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaderEvent {
    /// A chord is in progress; show the accumulated prefix.
    HintShown(String),
    /// The chord ended without a command; hide the hint.
    HintHidden,
    /// The buffer matched a command exactly.
    Command(LeaderCommand),
    /// Unknown chord or chord timeout; surface transiently and reset.
    Error(String),
}

/// Sequencer state: no chord, or a chord with a buffer and a deadline.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LeaderState {
    Idle,
    Awaiting { buffer: String, deadline: Instant },
}

/// The timed chord-matching state machine between the key decoder and
/// command dispatch.
pub struct LeaderSequencer {
    state: LeaderState,
    timeout: Duration,
}

impl LeaderSequencer {
    /// Creates an idle sequencer with the given chord timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { state: LeaderState::Idle, timeout }
    }

    /// Feeds one key into the state machine at time `now`.
    ///
    /// Returns `Some(event)` when the key was consumed (every consumed key
    /// emits exactly one event) and `None` when the key falls through to the
    /// active view untouched.
    pub fn handle_key(&mut self, key: Key, now: Instant) -> Option<LeaderEvent> {
        match &self.state {
            LeaderState::Idle => {
                if key == Key::Space {
                    self.state = LeaderState::Awaiting {
                        buffer: String::new(),
                        deadline: now + self.timeout,
                    };
                    Some(LeaderEvent::HintShown(hint_text("")))
                } else {
                    None
                }
            }
            LeaderState::Awaiting { buffer, .. } => {
                if key == Key::Escape {
                    self.state = LeaderState::Idle;
                    return Some(LeaderEvent::HintHidden);
                }
                let ch = match key {
                    Key::Char(c) if c.is_ascii_alphanumeric() => c.to_ascii_lowercase(),
                    // Other keys inside a chord fall through unchanged.
                    _ => return None,
                };

                let mut buffer = buffer.clone();
                buffer.push(ch);

                if let Some(&(_, command)) = COMMANDS.iter().find(|(chord, _)| *chord == buffer) {
                    self.state = LeaderState::Idle;
                    return Some(LeaderEvent::Command(command));
                }
                if COMMANDS.iter().any(|(chord, _)| chord.starts_with(buffer.as_str())) {
                    let hint = hint_text(&buffer);
                    self.state = LeaderState::Awaiting { buffer, deadline: now + self.timeout };
                    return Some(LeaderEvent::HintShown(hint));
                }
                self.state = LeaderState::Idle;
                Some(LeaderEvent::Error(format!("Unknown command: {}", hint_text(&buffer))))
            }
        }
    }

    /// Fires the chord timeout if the deadline has passed.
    ///
    /// Called once per event-loop iteration. A timed-out chord with keys in
    /// the buffer is an error; one with an empty buffer just hides the hint.
    pub fn poll_timeout(&mut self, now: Instant) -> Option<LeaderEvent> {
        let LeaderState::Awaiting { buffer, deadline } = &self.state else {
            return None;
        };
        if now < *deadline {
            return None;
        }
        let event = if buffer.is_empty() {
            LeaderEvent::HintHidden
        } else {
            LeaderEvent::Error(format!("Command timeout: {}", hint_text(buffer)))
        };
        self.state = LeaderState::Idle;
        Some(event)
    }

    /// True while a chord is in progress.
    pub fn is_awaiting(&self) -> bool {
        matches!(self.state, LeaderState::Awaiting { .. })
    }

    /// Chord/description pairs for the help view, in table order.
    pub fn available_commands() -> Vec<(String, &'static str)> {
        COMMANDS
            .iter()
            .map(|(chord, command)| {
                let label = chord
                    .chars()
                    .fold(String::from("Space"), |acc, c| format!("{acc} \u{2192} {c}"));
                (label, describe(*command))
            })
            .collect()
    }
}

fn hint_text(buffer: &str) -> String {
    buffer
        .chars()
        .fold(String::from("Space"), |acc, c| format!("{acc} \u{2192} {c}"))
}

fn describe(command: LeaderCommand) -> &'static str {
    match command {
        LeaderCommand::ViewStatus => "Status view",
        LeaderCommand::ViewCommit => "Commit view",
        LeaderCommand::ViewDiff => "Diff view",
        LeaderCommand::ViewLog => "Log view",
        LeaderCommand::Help => "Help / keybinding overview",
        LeaderCommand::Quit => "Quit",
    }
}
