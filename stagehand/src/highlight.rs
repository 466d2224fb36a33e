//! Syntax highlighting and word-level diff emphasis for the diff view.
//!
//! The renderer draws through raw crossterm commands, so highlighted text is
//! expressed as flat [`Segment`] runs (text + foreground + bold) rather than
//! any widget type. Syntect assets are process-wide statics, initialised
//! eagerly at startup to avoid first-diff latency.

use std::sync::LazyLock;

use crossterm::style::Color;
use similar::{ChangeTag, TextDiff};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};

static PS: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static TS: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

/// Forces the syntax and theme statics to load now.
pub fn warm_up() {
    let _ = PS.syntaxes().len();
    let _ = TS.themes.len();
}

/// One styled run of text on a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub fg: Option<Color>,
    pub bold: bool,
}

impl Segment {
    pub fn plain(text: impl Into<String>) -> Self {
        Self { text: text.into(), fg: None, bold: false }
    }

    pub fn colored(text: impl Into<String>, fg: Color) -> Self {
        Self { text: text.into(), fg: Some(fg), bold: false }
    }

    pub fn bold(text: impl Into<String>, fg: Color) -> Self {
        Self { text: text.into(), fg: Some(fg), bold: true }
    }
}

fn syntect_to_segment(style: syntect::highlighting::Style, content: &str) -> Segment {
    let c = style.foreground;
    let fg = if c.a > 0 { Some(Color::Rgb { r: c.r, g: c.g, b: c.b }) } else { None };
    Segment { text: content.to_owned(), fg, bold: style.font_style.contains(FontStyle::BOLD) }
}

fn syntax_for_path(path: &str) -> &'static SyntaxReference {
    let ext = path.rsplit('.').next().unwrap_or("txt");
    PS.find_syntax_by_extension(ext).unwrap_or_else(|| PS.find_syntax_plain_text())
}

/// Per-file syntect highlighter.
///
/// Highlighting state is line-order dependent; each rendered file (and each
/// hunk, since hunks skip lines) gets a fresh instance.
pub struct Highlighter {
    inner: Option<HighlightLines<'static>>,
}

impl Highlighter {
    pub fn for_path(path: &str) -> Self {
        let inner = TS
            .themes
            .get("base16-ocean.dark")
            .or_else(|| TS.themes.values().next())
            .map(|theme| HighlightLines::new(syntax_for_path(path), theme));
        Self { inner }
    }

    /// Highlights one line of code. Falls back to a single plain segment when
    /// no theme is available or highlighting fails.
    pub fn segments(&mut self, code: &str) -> Vec<Segment> {
        let Some(h) = self.inner.as_mut() else {
            return vec![Segment::plain(code)];
        };
        let ranges = h.highlight_line(code, &PS).unwrap_or_default();
        if ranges.is_empty() {
            return vec![Segment::plain(code)];
        }
        ranges.into_iter().map(|(style, text)| syntect_to_segment(style, text)).collect()
    }
}

/// Word-level emphasis for a paired deletion/addition line.
///
/// Returns parallel segment runs for the old and new lines: changed words
/// bold, unchanged words in the base red/green.
pub fn word_diff_segments(old_line: &str, new_line: &str) -> (Vec<Segment>, Vec<Segment>) {
    let diff = TextDiff::from_words(old_line, new_line);
    let mut old_segments = Vec::new();
    let mut new_segments = Vec::new();

    for op in diff.ops() {
        for change in diff.iter_inline_changes(op) {
            for (emphasized, value) in change.iter_strings_lossy() {
                let text = value.into_owned();
                match change.tag() {
                    ChangeTag::Delete => old_segments.push(if emphasized {
                        Segment::bold(text, Color::Red)
                    } else {
                        Segment::colored(text, Color::Red)
                    }),
                    ChangeTag::Insert => new_segments.push(if emphasized {
                        Segment::bold(text, Color::Green)
                    } else {
                        Segment::colored(text, Color::Green)
                    }),
                    ChangeTag::Equal => {
                        let segment = Segment::colored(text, Color::DarkGrey);
                        old_segments.push(segment.clone());
                        new_segments.push(segment);
                    }
                }
            }
        }
    }
    (old_segments, new_segments)
}
