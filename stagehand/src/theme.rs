//! Color themes.
//!
//! A `Theme` holds named `crossterm::style::Color` fields covering every
//! surface stagehand draws. Two built-in themes:
//!
//! - `dark` — ANSI 16 colors, works on any terminal including 256-color SSH
//!   sessions with no truecolor support.
//! - `dracula` — Dracula palette in RGB; requires truecolor.

use crossterm::style::Color;

/// All color values used across the UI.
#[derive(Debug, Clone)]
pub struct Theme {
    /// View title line.
    pub title: Color,
    /// Cursor-row highlight background.
    pub cursor_bg: Color,
    /// Cursor-row highlight foreground.
    pub cursor_fg: Color,
    /// Section headers inside a view ("Staged Changes", hint boxes).
    pub section: Color,

    /// Added lines and staged indicators.
    pub added: Color,
    /// Removed lines, deleted files, errors.
    pub removed: Color,
    /// Modified-file indicator.
    pub modified: Color,
    /// Untracked-file indicator and context lines.
    pub dim: Color,
    /// Hunk header lines (`@@ ... @@`).
    pub hunk_header: Color,
    /// Marker column for selected lines in line-selection mode.
    pub selection: Color,

    /// Status bar background.
    pub status_bar_bg: Color,
    /// Status bar foreground.
    pub status_bar_fg: Color,
    /// Leader hint text in the status bar.
    pub hint: Color,
    /// Error text in the status bar.
    pub error: Color,
    /// Confirmation text in the status bar.
    pub info: Color,

    /// INSERT-mode indicator in the commit view.
    pub mode_insert: Color,
}

impl Theme {
    /// Built-in dark theme using ANSI 16 colors.
    ///
    /// Works everywhere; the default when no config is present.
    pub fn dark() -> Self {
        Self {
            title: Color::Cyan,
            cursor_bg: Color::DarkGrey,
            cursor_fg: Color::White,
            section: Color::Yellow,

            added: Color::Green,
            removed: Color::Red,
            modified: Color::Yellow,
            dim: Color::DarkGrey,
            hunk_header: Color::Cyan,
            selection: Color::Magenta,

            status_bar_bg: Color::DarkGrey,
            status_bar_fg: Color::White,
            hint: Color::Cyan,
            error: Color::Red,
            info: Color::Green,

            mode_insert: Color::Green,
        }
    }

    /// Dracula theme in RGB truecolor.
    ///
    /// Palette source: <https://draculatheme.com/contribute>.
    pub fn dracula() -> Self {
        let current = Color::Rgb { r: 68, g: 71, b: 90 }; // #44475a
        let foreground = Color::Rgb { r: 248, g: 248, b: 242 }; // #f8f8f2
        let comment = Color::Rgb { r: 98, g: 114, b: 164 }; // #6272a4
        let cyan = Color::Rgb { r: 139, g: 233, b: 253 }; // #8be9fd
        let green = Color::Rgb { r: 80, g: 250, b: 123 }; // #50fa7b
        let orange = Color::Rgb { r: 255, g: 184, b: 108 }; // #ffb86c
        let pink = Color::Rgb { r: 255, g: 121, b: 198 }; // #ff79c6
        let red = Color::Rgb { r: 255, g: 85, b: 85 }; // #ff5555
        let yellow = Color::Rgb { r: 241, g: 250, b: 140 }; // #f1fa8c

        Self {
            title: cyan,
            cursor_bg: current,
            cursor_fg: foreground,
            section: yellow,

            added: green,
            removed: red,
            modified: orange,
            dim: comment,
            hunk_header: cyan,
            selection: pink,

            status_bar_bg: current,
            status_bar_fg: foreground,
            hint: cyan,
            error: red,
            info: green,

            mode_insert: green,
        }
    }

    /// Resolves a theme name from config to a built-in theme.
    ///
    /// Unknown names fall back to `dark()` so a typo in config never
    /// prevents startup.
    pub fn from_name(name: &str) -> Self {
        match name {
            "dracula" => Self::dracula(),
            "dark" => Self::dark(),
            other => {
                eprintln!("stagehand: unknown theme '{other}', falling back to 'dark'");
                Self::dark()
            }
        }
    }
}
