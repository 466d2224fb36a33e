//! Background thread that owns the git backend.
//!
//! `git2::Repository` is not `Send`, so the backend is constructed inside the
//! worker thread and never leaves it. Requests arrive on a crossbeam channel;
//! replies are pushed onto the event bus so the event loop can interleave
//! them with key input.

use std::path::PathBuf;
use std::thread::{self, JoinHandle};

use crossbeam_channel::Receiver;
use tokio::sync::mpsc::UnboundedSender;

use crate::event::AppEvent;
use crate::git::backend::{Git2Backend, GitBackend};
use crate::git::mock::MockBackend;
use crate::git::types::{GitReply, GitRequest};

/// Executes one request against the backend.
fn handle_request<B: GitBackend>(backend: &B, request: GitRequest) -> GitReply {
    match request {
        GitRequest::Branch => GitReply::Branch {
            branch: backend.current_branch(),
            repo: backend.repo_name(),
        },
        GitRequest::Status { generation } => GitReply::Status {
            generation,
            result: backend.status(),
        },
        GitRequest::Diff { generation, path, staged } => GitReply::Diff {
            generation,
            staged,
            result: backend.diff(path.as_deref(), staged),
        },
        GitRequest::StagePath(path) => GitReply::OpDone {
            op: "stage",
            result: backend.stage_path(&path),
        },
        GitRequest::UnstagePath(path) => GitReply::OpDone {
            op: "unstage",
            result: backend.unstage_path(&path),
        },
        GitRequest::ApplyPatch { patch, to_index } => GitReply::OpDone {
            op: if to_index { "stage lines" } else { "apply patch" },
            result: backend.apply_patch(&patch, to_index),
        },
        GitRequest::Commit { generation, message, amend } => GitReply::Committed {
            generation,
            amend,
            result: backend.commit(&message, amend),
        },
        GitRequest::Discard(path) => GitReply::OpDone {
            op: "discard",
            result: backend.discard_changes(&path),
        },
        GitRequest::Log { generation, limit } => GitReply::Log {
            generation,
            result: backend.log(limit),
        },
    }
}

/// Drains requests until the channel closes or the event loop goes away.
fn worker_loop<B: GitBackend>(
    backend: B,
    requests: Receiver<GitRequest>,
    events: UnboundedSender<AppEvent>,
) {
    for request in requests {
        let reply = handle_request(&backend, request);
        if events.send(AppEvent::Git(Box::new(reply))).is_err() {
            break;
        }
    }
}

/// Spawns the worker over a real repository at `workdir`.
///
/// The repository is opened inside the thread. An open failure is reported
/// through the event bus as a failed operation and the thread exits.
pub fn spawn_repo_worker(
    workdir: PathBuf,
    requests: Receiver<GitRequest>,
    events: UnboundedSender<AppEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || match Git2Backend::open(&workdir) {
        Ok(backend) => worker_loop(backend, requests, events),
        Err(e) => {
            let _ = events.send(AppEvent::Git(Box::new(GitReply::OpDone {
                op: "open repository",
                result: Err(e),
            })));
        }
    })
}

/// Spawns the worker over the canned demo backend.
pub fn spawn_demo_worker(
    requests: Receiver<GitRequest>,
    events: UnboundedSender<AppEvent>,
) -> JoinHandle<()> {
    thread::spawn(move || worker_loop(MockBackend::new(), requests, events))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_one(request: GitRequest) -> GitReply {
        let backend = MockBackend::new();
        handle_request(&backend, request)
    }

    #[test]
    fn status_reply_echoes_generation() {
        match run_one(GitRequest::Status { generation: 7 }) {
            GitReply::Status { generation, result } => {
                assert_eq!(generation, 7);
                assert!(!result.unwrap().is_empty());
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn branch_reply_names_the_demo_repo() {
        match run_one(GitRequest::Branch) {
            GitReply::Branch { branch, repo } => {
                assert_eq!(branch, "main");
                assert_eq!(repo, "demo");
            }
            other => panic!("unexpected reply: {other:?}"),
        }
    }

    #[test]
    fn loop_replies_through_the_event_bus() {
        let (req_tx, req_rx) = crossbeam_channel::unbounded();
        let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel();

        req_tx.send(GitRequest::Status { generation: 1 }).unwrap();
        drop(req_tx);
        let handle = thread::spawn(move || worker_loop(MockBackend::new(), req_rx, event_tx));

        match event_rx.blocking_recv() {
            Some(AppEvent::Git(reply)) => {
                assert!(matches!(*reply, GitReply::Status { generation: 1, .. }));
            }
            other => panic!("unexpected event: {other:?}"),
        }
        handle.join().unwrap();
    }

    #[test]
    fn commit_moves_staged_files_into_the_log() {
        let backend = MockBackend::new();
        let id = backend.commit("demo commit", false).unwrap();
        assert_eq!(id.len(), 7);
        let log = backend.log(10).unwrap();
        assert_eq!(log[0].summary, "demo commit");
        assert!(backend.status().unwrap().iter().all(|f| !f.staged));
    }
}
