//! Terminal lifecycle and scoped write primitives.
//!
//! The session owns raw mode and the alternate screen, and rendering code
//! goes through its queueing primitives so escape sequences land in one
//! buffered writer and reach the terminal in a single flush per frame.
//!
//! Restoration must happen on every exit path. The event loop exits only via
//! `break` and calls [`restore_terminal`] at its single exit point; the panic
//! hook covers panics; SIGINT/SIGTERM set a flag the loop polls, so signals
//! funnel into the same exit point instead of killing the process mid-frame.

use std::io::{stdout, BufWriter, Stdout, Write};
use std::panic;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::style::{Attribute, Color, SetAttribute, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, Clear, ClearType, EnterAlternateScreen,
    LeaveAlternateScreen,
};
use crossterm::{execute, queue};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::flag::register;

/// Exclusive access to the controlling terminal in raw mode.
pub struct TerminalSession {
    out: BufWriter<Stdout>,
}

impl TerminalSession {
    /// Enables raw mode, enters the alternate screen, and hides the cursor.
    ///
    /// # Errors
    ///
    /// Any failure to set terminal attributes here is a fatal startup error;
    /// the caller should print it and exit before drawing anything.
    pub fn new() -> std::io::Result<Self> {
        let mut out = BufWriter::new(stdout());
        enable_raw_mode()?;
        execute!(out, EnterAlternateScreen, Hide)?;
        Ok(Self { out })
    }

    /// Current terminal size as (rows, columns).
    ///
    /// Re-queried on every call — a resize can happen between frames, so the
    /// size is never cached. A mid-session query failure degrades to 80×24
    /// rather than interrupting the render.
    pub fn size(&self) -> (u16, u16) {
        match crossterm::terminal::size() {
            Ok((cols, rows)) => (rows, cols),
            Err(_) => (24, 80),
        }
    }

    /// Moves the cursor to 0-based (row, col).
    pub fn move_to(&mut self, row: u16, col: u16) -> std::io::Result<()> {
        queue!(self.out, MoveTo(col, row))
    }

    /// Clears the whole screen.
    pub fn clear_screen(&mut self) -> std::io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))
    }

    /// Clears from the cursor to the end of the current line.
    pub fn clear_line(&mut self) -> std::io::Result<()> {
        queue!(self.out, Clear(ClearType::UntilNewLine))
    }

    /// Writes literal (possibly pre-styled) text at the cursor.
    pub fn print(&mut self, text: impl std::fmt::Display) -> std::io::Result<()> {
        write!(self.out, "{text}")
    }

    /// Sets the foreground color for subsequent writes.
    pub fn set_fg(&mut self, color: Color) -> std::io::Result<()> {
        queue!(self.out, SetForegroundColor(color))
    }

    /// Sets the background color for subsequent writes.
    pub fn set_bg(&mut self, color: Color) -> std::io::Result<()> {
        queue!(self.out, SetBackgroundColor(color))
    }

    /// Renders subsequent writes in bold.
    pub fn set_bold(&mut self) -> std::io::Result<()> {
        queue!(self.out, SetAttribute(Attribute::Bold))
    }

    /// Resets colors and attributes to the terminal defaults.
    pub fn reset_style(&mut self) -> std::io::Result<()> {
        queue!(self.out, SetAttribute(Attribute::Reset), crossterm::style::ResetColor)
    }

    /// Makes the cursor visible (used by the commit editor in insert mode).
    pub fn show_cursor(&mut self) -> std::io::Result<()> {
        queue!(self.out, Show)
    }

    /// Hides the cursor again.
    pub fn hide_cursor(&mut self) -> std::io::Result<()> {
        queue!(self.out, Hide)
    }

    /// Flushes all queued output to the terminal in one write burst.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.out.flush()
    }
}

/// Restores the terminal to its pre-session state.
///
/// Idempotent and callable without the session: the panic hook has no access
/// to the `TerminalSession` value, so restoration works on the global handles.
pub fn restore_terminal() -> std::io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen, Show)?;
    Ok(())
}

/// Installs a panic hook that restores the terminal before the panic message
/// prints.
///
/// Must run before [`TerminalSession::new`]. Chains onto the previous hook so
/// the default printer still runs once the screen is usable again. Restore
/// errors are ignored here — best-effort cleanup inside a panic.
pub fn install_panic_hook() {
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = restore_terminal();
        original_hook(panic_info);
    }));
}

/// Registers SIGINT and SIGTERM handlers that set a shared flag.
///
/// The event loop polls the flag on its heartbeat and after every event, then
/// breaks out so terminal restoration runs at the loop's single exit point.
///
/// # Errors
///
/// Returns the OS error if either handler cannot be registered; treated as a
/// fatal initialisation failure by the caller.
pub fn register_exit_signals() -> std::io::Result<Arc<AtomicBool>> {
    let flag = Arc::new(AtomicBool::new(false));
    register(SIGINT, Arc::clone(&flag))?;
    register(SIGTERM, Arc::clone(&flag))?;
    Ok(flag)
}
