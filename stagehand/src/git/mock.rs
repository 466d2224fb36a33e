//! Canned backend for `--demo` mode and worker tests.
//!
//! Holds a small in-memory repository picture and mutates it in response to
//! stage/unstage/commit calls, so the UI can be driven end to end without a
//! real repository on disk.

use std::cell::RefCell;

use stagehand_core::{DiffLine, FileDiff, FileStatus, Hunk};

use crate::git::backend::GitBackend;
use crate::git::types::{CommitSummary, GitError};

pub struct MockBackend {
    files: RefCell<Vec<FileStatus>>,
    commits: RefCell<Vec<CommitSummary>>,
    next_commit: RefCell<u32>,
}

impl MockBackend {
    pub fn new() -> Self {
        let mut readme = FileStatus::new("README.md");
        readme.modified = true;
        let mut main = FileStatus::new("src/main.rs");
        main.staged = true;
        main.modified = true;
        let mut notes = FileStatus::new("notes.txt");
        notes.untracked = true;

        let commits = vec![
            CommitSummary {
                id: "a1b2c3d".to_owned(),
                summary: "Add line staging".to_owned(),
                author: "Demo Author".to_owned(),
                time_secs: 1_756_000_000,
            },
            CommitSummary {
                id: "e4f5a6b".to_owned(),
                summary: "Initial commit".to_owned(),
                author: "Demo Author".to_owned(),
                time_secs: 1_755_900_000,
            },
        ];

        Self {
            files: RefCell::new(vec![readme, main, notes]),
            commits: RefCell::new(commits),
            next_commit: RefCell::new(1),
        }
    }

    fn demo_hunk() -> Hunk {
        Hunk::new(
            1,
            1,
            vec![
                DiffLine::context("# stagehand", 1, 1),
                DiffLine::deletion("A staging client.", 2),
                DiffLine::addition("An interactive staging client.", 2),
                DiffLine::addition("Run it inside any repository.", 3),
                DiffLine::context("", 3, 4),
            ],
            None,
        )
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GitBackend for MockBackend {
    fn repo_name(&self) -> String {
        "demo".to_owned()
    }

    fn current_branch(&self) -> String {
        "main".to_owned()
    }

    fn status(&self) -> Result<Vec<FileStatus>, GitError> {
        Ok(self.files.borrow().clone())
    }

    fn diff(&self, path: Option<&str>, staged: bool) -> Result<Vec<FileDiff>, GitError> {
        let files = self.files.borrow();
        let diffs = files
            .iter()
            .filter(|f| if staged { f.staged } else { f.modified || f.untracked })
            .filter(|f| path.is_none_or(|p| p == f.path))
            .map(|f| FileDiff { path: f.path.clone(), hunks: vec![Self::demo_hunk()] })
            .collect();
        Ok(diffs)
    }

    fn stage_path(&self, path: &str) -> Result<(), GitError> {
        let mut files = self.files.borrow_mut();
        let file = files
            .iter_mut()
            .find(|f| f.path == path)
            .ok_or_else(|| GitError(format!("no such file: {path}")))?;
        file.staged = true;
        file.modified = false;
        file.untracked = false;
        file.deleted = false;
        Ok(())
    }

    fn unstage_path(&self, path: &str) -> Result<(), GitError> {
        let mut files = self.files.borrow_mut();
        let file = files
            .iter_mut()
            .find(|f| f.path == path)
            .ok_or_else(|| GitError(format!("no such file: {path}")))?;
        if file.staged {
            file.staged = false;
            file.modified = true;
        }
        Ok(())
    }

    fn apply_patch(&self, _patch: &str, _to_index: bool) -> Result<(), GitError> {
        Ok(())
    }

    fn commit(&self, message: &str, _amend: bool) -> Result<String, GitError> {
        let mut files = self.files.borrow_mut();
        if !files.iter().any(|f| f.staged) {
            return Err(GitError("nothing staged to commit".to_owned()));
        }
        files.retain(|f| !f.staged || f.modified);
        for file in files.iter_mut() {
            file.staged = false;
        }

        let mut next = self.next_commit.borrow_mut();
        let id = format!("{:07x}", 0x00d3_0000 + *next);
        *next += 1;
        self.commits.borrow_mut().insert(
            0,
            CommitSummary {
                id: id.clone(),
                summary: message.lines().next().unwrap_or("").to_owned(),
                author: "Demo Author".to_owned(),
                time_secs: 1_756_100_000,
            },
        );
        Ok(id)
    }

    fn discard_changes(&self, path: &str) -> Result<(), GitError> {
        let mut files = self.files.borrow_mut();
        files.retain(|f| f.path != path || f.staged);
        for file in files.iter_mut().filter(|f| f.path == path) {
            file.modified = false;
            file.untracked = false;
            file.deleted = false;
        }
        Ok(())
    }

    fn log(&self, limit: usize) -> Result<Vec<CommitSummary>, GitError> {
        Ok(self.commits.borrow().iter().take(limit).cloned().collect())
    }
}
