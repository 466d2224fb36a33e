//! stagehand-core — the diff/hunk data model shared by the TUI and its tests.
//!
//! Everything in this crate is pure value data: a hunk is an immutable snapshot
//! produced by one backend query, and every transformation (selecting a subset
//! of change lines, reversing a patch) produces a *new* hunk rather than
//! mutating the original. No terminal, git, or I/O code lives here.

pub mod diff;
pub mod status;

pub use diff::{DiffLine, FileDiff, Hunk, LineKind, SelectionError};
pub use status::FileStatus;
