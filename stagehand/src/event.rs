//! Unified event bus.
//!
//! Keystrokes and git-worker results are normalised into one `AppEvent` enum
//! and sent over a tokio unbounded MPSC channel. The main loop receives from
//! this channel; nothing else mutates UI state.
//!
//! Input is read on a dedicated OS thread because the read blocks in raw
//! mode. The thread reads buffers of up to 3 bytes (a single key or one CSI
//! arrow sequence), decodes them with [`Key::decode`], and sends the result.
//! Undecodable buffers are dropped silently; they are noise, not errors.

use std::io::Read;
use std::time::Duration;

use tokio::sync::mpsc;

use crate::git::types::GitReply;
use crate::keys::Key;

/// All events the application can receive from any source.
#[derive(Debug)]
pub enum AppEvent {
    /// A decoded key press from the reader thread.
    Key(Key),
    /// Result from the git worker thread. Boxed to keep the variant small —
    /// a full diff payload can be large.
    Git(Box<GitReply>),
    /// Input reached end-of-file; treat as a quit request.
    Quit,
}

/// Sender and receiver ends of the event channel.
///
/// The sender is cloned into the reader thread and the git worker; the
/// receiver is owned by the main event loop.
pub struct EventHandler {
    pub tx: mpsc::UnboundedSender<AppEvent>,
    pub rx: mpsc::UnboundedReceiver<AppEvent>,
}

impl EventHandler {
    /// Creates a fresh unbounded channel pair.
    ///
    /// Unbounded is appropriate: producers are bounded by typing speed and
    /// one git reply per request, and the loop always keeps up.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }
}

impl Default for EventHandler {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawns the blocking stdin reader thread.
///
/// Runs until stdin reaches EOF (sends `Quit`) or the receiver is dropped.
/// A failed read is retried quietly after a short pause — a transient error
/// mid-session must not kill the input pipeline — and the terminal layer's
/// startup checks make a permanently broken stdin a startup failure instead.
pub fn spawn_input_thread(tx: mpsc::UnboundedSender<AppEvent>) {
    std::thread::spawn(move || {
        let mut stdin = std::io::stdin();
        let mut buf = [0u8; 3];
        loop {
            match stdin.read(&mut buf) {
                Ok(0) => {
                    let _ = tx.send(AppEvent::Quit);
                    break;
                }
                Ok(n) => {
                    if let Some(key) = Key::decode(&buf[..n]) {
                        if tx.send(AppEvent::Key(key)).is_err() {
                            break;
                        }
                    }
                }
                Err(_) => {
                    // Retry quietly; the pause keeps a persistent error (e.g.
                    // EBADF after a detached terminal) from spinning the CPU.
                    std::thread::sleep(Duration::from_millis(50));
                }
            }
        }
    });
}
