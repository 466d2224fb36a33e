//! stagehand — interactive git staging for the terminal.
//!
//! Entry point for the `stagehand` binary. Wires together the terminal
//! lifecycle (`term`), raw-byte key decoding (`keys`), the unified event bus
//! (`event`), the leader-key sequencer (`leader`), the view router (`app`),
//! and the background git worker (`git`).
//!
//! # Startup sequence (order matters)
//!
//! 1. Load config and resolve the theme — read-only, safe before terminal init.
//! 2. Discover the repository. A failure here prints to stderr and exits;
//!    once the alternate screen is up, stderr is invisible.
//! 3. `install_panic_hook()` — installed before raw mode so any later panic
//!    restores the terminal before the message prints.
//! 4. `register_exit_signals()` — returns the flag polled in the heartbeat.
//! 5. `TerminalSession::new()` — raw mode + alternate screen.
//! 6. Spawn the stdin reader thread and the git worker thread.
//!
//! The event loop exits only via `break`, so `restore_terminal()` at the
//! single exit point covers normal quit, EOF, signals, and draw errors. The
//! panic hook covers the panic path.

mod app;
mod config;
mod event;
mod git;
mod highlight;
mod keys;
mod leader;
mod term;
mod theme;
mod views;

use std::path::Path;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use crate::app::{Router, RouterAction};
use crate::config::Config;
use crate::event::{spawn_input_thread, AppEvent, EventHandler};
use crate::git::{worker, Git2Backend, GitHandle};
use crate::term::TerminalSession;
use crate::theme::Theme;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let demo = std::env::args().any(|arg| arg == "--demo");
    let config = Config::load();
    let theme = Theme::from_name(&config.theme);

    // Repository check happens before terminal init so the error is visible.
    let workdir = if demo {
        None
    } else {
        match Git2Backend::discover_workdir(Path::new(".")) {
            Ok(workdir) => Some(workdir),
            Err(e) => {
                eprintln!("stagehand: not a git repository: {e}");
                std::process::exit(1);
            }
        }
    };

    // Syntax definitions load in the hundreds of milliseconds; pay that here
    // rather than on the first diff.
    highlight::warm_up();

    term::install_panic_hook();
    let exit_flag = term::register_exit_signals()?;
    let mut session = TerminalSession::new()?;

    let handler = EventHandler::new();
    spawn_input_thread(handler.tx.clone());

    let (git_tx, git_rx) = crossbeam_channel::unbounded();
    match workdir {
        Some(workdir) => {
            worker::spawn_repo_worker(workdir, git_rx, handler.tx.clone());
        }
        None => {
            worker::spawn_demo_worker(git_rx, handler.tx.clone());
        }
    }

    let mut rx = handler.rx;
    let mut router = Router::new(
        GitHandle::new(git_tx),
        theme,
        config.leader_timeout(),
        config.log_limit,
    );

    let mut draw_error: Option<std::io::Error> = None;
    session.clear_screen()?;
    if let Err(e) = router.render(&mut session) {
        draw_error = Some(e);
    }

    // Event loop — exits only via `break`, never via `?`, so restoration
    // below is always reached.
    'event_loop: while draw_error.is_none() {
        let action = tokio::select! {
            // Heartbeat: fires chord timeouts and message expiry, and
            // guarantees the signal flag is polled even when no events arrive.
            _ = tokio::time::sleep(Duration::from_millis(100)) => {
                router.poll(Instant::now())
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(AppEvent::Key(key)) => router.handle_key(key, Instant::now()),
                    Some(AppEvent::Git(reply)) => router.apply_reply(&reply, Instant::now()),
                    Some(AppEvent::Quit) | None => break 'event_loop,
                }
            }
        };

        // Check the signal flag on every iteration, not just the heartbeat,
        // so quit latency stays at one event cycle.
        if exit_flag.load(Ordering::Relaxed) {
            break 'event_loop;
        }

        let result = match action {
            RouterAction::Quit => break 'event_loop,
            RouterAction::Full => router.render(&mut session),
            RouterAction::StatusLine => router.render_status_line(&mut session),
            RouterAction::None => Ok(()),
        };
        if let Err(e) = result {
            draw_error = Some(e);
            break 'event_loop;
        }
    }

    // Single exit point: restore the terminal, then report any draw error.
    term::restore_terminal()?;
    match draw_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
