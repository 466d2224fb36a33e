//! Request/reply types for the git worker thread.
//!
//! Everything here is fully owned and `Send`: requests travel over a
//! crossbeam channel into the worker, replies come back through the event
//! bus. Query replies carry the generation number of the request that
//! produced them so a view can drop responses that a newer refresh has
//! already superseded.

use stagehand_core::{FileDiff, FileStatus};

/// Error from any backend operation, carried across threads as text.
///
/// `git2::Error` is not `Clone` and holds no structure the UI needs, so the
/// message is captured at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct GitError(pub String);

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        GitError(err.message().to_owned())
    }
}

/// One commit in the log view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSummary {
    /// Abbreviated commit id (7 hex chars).
    pub id: String,
    /// First line of the commit message.
    pub summary: String,
    /// Author name.
    pub author: String,
    /// Commit time as a Unix timestamp, for relative-age display.
    pub time_secs: i64,
}

/// Commands sent from the event loop to the git worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitRequest {
    /// Query the current branch and repository name.
    Branch,
    /// Query working-tree status.
    Status { generation: u64 },
    /// Query a diff; `staged` selects HEAD↔index instead of index↔workdir.
    Diff { generation: u64, path: Option<String>, staged: bool },
    /// Stage a whole path.
    StagePath(String),
    /// Unstage a whole path.
    UnstagePath(String),
    /// Apply a unified-diff fragment. `to_index` targets the index (staging);
    /// unstaging sends the reversed fragment, also to the index.
    ApplyPatch { patch: String, to_index: bool },
    /// Create (or amend) a commit from the index.
    Commit { generation: u64, message: String, amend: bool },
    /// Discard working-tree changes to a path.
    Discard(String),
    /// Query recent commits.
    Log { generation: u64, limit: usize },
}

/// Results sent from the worker back to the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GitReply {
    /// Branch and repository names for the status bar.
    Branch { branch: String, repo: String },
    Status { generation: u64, result: Result<Vec<FileStatus>, GitError> },
    Diff { generation: u64, staged: bool, result: Result<Vec<FileDiff>, GitError> },
    /// Commit outcome; carries the new commit id on success.
    Committed { generation: u64, amend: bool, result: Result<String, GitError> },
    Log { generation: u64, result: Result<Vec<CommitSummary>, GitError> },
    /// Outcome of a mutation (stage/unstage/apply/discard). `op` names the
    /// operation for error messages; success triggers a view refresh.
    OpDone { op: &'static str, result: Result<(), GitError> },
}
