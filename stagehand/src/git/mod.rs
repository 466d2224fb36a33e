pub mod backend;
pub mod mock;
pub mod types;
pub mod worker;

pub use backend::{Git2Backend, GitBackend};
pub use types::{CommitSummary, GitError, GitReply, GitRequest};

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::Sender;

/// UI-side handle to the git worker.
///
/// Wraps the request channel and owns the generation counter: every query
/// gets a fresh, strictly increasing generation, and the requesting view
/// remembers the number so it can drop replies that a newer request has
/// already superseded (replies can arrive out of order with key handling,
/// never with each other).
pub struct GitHandle {
    tx: Sender<GitRequest>,
    generation: AtomicU64,
}

impl GitHandle {
    pub fn new(tx: Sender<GitRequest>) -> Self {
        Self { tx, generation: AtomicU64::new(0) }
    }

    /// Sends a request; a disconnected worker is ignored here because the
    /// event loop notices the dead worker through the closed event bus.
    pub fn send(&self, request: GitRequest) {
        let _ = self.tx.send(request);
    }

    fn next_generation(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn request_branch(&self) {
        self.send(GitRequest::Branch);
    }

    /// Requests a status refresh; returns the generation to match against.
    pub fn request_status(&self) -> u64 {
        let generation = self.next_generation();
        self.send(GitRequest::Status { generation });
        generation
    }

    /// Requests a diff; returns the generation to match against.
    pub fn request_diff(&self, path: Option<String>, staged: bool) -> u64 {
        let generation = self.next_generation();
        self.send(GitRequest::Diff { generation, path, staged });
        generation
    }

    /// Requests a commit; returns the generation to match against.
    pub fn request_commit(&self, message: String, amend: bool) -> u64 {
        let generation = self.next_generation();
        self.send(GitRequest::Commit { generation, message, amend });
        generation
    }

    /// Requests the recent-commit list; returns the generation to match
    /// against.
    pub fn request_log(&self, limit: usize) -> u64 {
        let generation = self.next_generation();
        self.send(GitRequest::Log { generation, limit });
        generation
    }

    pub fn stage_path(&self, path: String) {
        self.send(GitRequest::StagePath(path));
    }

    pub fn unstage_path(&self, path: String) {
        self.send(GitRequest::UnstagePath(path));
    }

    pub fn apply_patch(&self, patch: String, to_index: bool) {
        self.send(GitRequest::ApplyPatch { patch, to_index });
    }

    pub fn discard(&self, path: String) {
        self.send(GitRequest::Discard(path));
    }
}
