//! The git backend contract and its libgit2 implementation.
//!
//! Views and the hunk model consume the [`GitBackend`] trait; `Git2Backend`
//! is the real implementor and [`crate::git::mock::MockBackend`] is the
//! canned-data one used by `--demo` and the worker tests. Every method is
//! fallible and potentially slow, which is why all calls are routed through
//! the background worker thread rather than made from the event loop.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use git2::build::CheckoutBuilder;
use git2::{ApplyLocation, Commit, Diff, DiffOptions, Repository, StatusOptions};

use stagehand_core::{DiffLine, FileDiff, FileStatus, Hunk};

use crate::git::types::{CommitSummary, GitError};

/// Operations the UI needs from a version-control backend.
pub trait GitBackend {
    /// Human-readable repository name for the status bar.
    fn repo_name(&self) -> String;
    /// Current branch shorthand, or a placeholder on a detached/unborn HEAD.
    fn current_branch(&self) -> String;
    /// Working-tree status for every changed file.
    fn status(&self) -> Result<Vec<FileStatus>, GitError>;
    /// Hunks for changed files; `staged` selects HEAD↔index, otherwise
    /// index↔workdir. `path` restricts the diff to one file.
    fn diff(&self, path: Option<&str>, staged: bool) -> Result<Vec<FileDiff>, GitError>;
    /// Stages every change in `path`.
    fn stage_path(&self, path: &str) -> Result<(), GitError>;
    /// Removes `path`'s staged changes from the index.
    fn unstage_path(&self, path: &str) -> Result<(), GitError>;
    /// Applies a unified-diff fragment to the index (`to_index`) or the
    /// working tree. The fragment is the output of `Hunk::patch_text`.
    fn apply_patch(&self, patch: &str, to_index: bool) -> Result<(), GitError>;
    /// Creates a commit from the index; returns the new commit id.
    fn commit(&self, message: &str, amend: bool) -> Result<String, GitError>;
    /// Discards working-tree changes to `path`.
    fn discard_changes(&self, path: &str) -> Result<(), GitError>;
    /// Most recent commits, newest first.
    fn log(&self, limit: usize) -> Result<Vec<CommitSummary>, GitError>;
}

/// Backend over a real repository via libgit2.
pub struct Git2Backend {
    repo: Repository,
}

impl Git2Backend {
    /// Opens the repository at `path`.
    ///
    /// # Errors
    ///
    /// Returns `GitError` when `path` is not inside a git repository.
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = Repository::open(path)?;
        Ok(Self { repo })
    }

    /// Discovers the repository containing `path` (walking parents) and
    /// returns its working-directory root.
    ///
    /// Used at startup, before the terminal is initialised, so a missing
    /// repository is reported on stderr instead of inside the TUI.
    pub fn discover_workdir(path: &Path) -> Result<PathBuf, GitError> {
        let repo = Repository::discover(path)?;
        repo.workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| GitError("bare repository has no working tree".to_owned()))
    }

    fn head_commit(&self) -> Result<Option<Commit<'_>>, git2::Error> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_commit()?)),
            // Unborn HEAD (fresh repository, no commits yet).
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => Ok(None),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn build_diff(&self, path: Option<&str>, staged: bool) -> Result<Diff<'_>, git2::Error> {
        let mut opts = DiffOptions::new();
        if let Some(path) = path {
            opts.pathspec(path);
        }
        if staged {
            let head_tree = match self.head_commit()? {
                Some(commit) => Some(commit.tree()?),
                None => None,
            };
            self.repo.diff_tree_to_index(head_tree.as_ref(), None, Some(&mut opts))
        } else {
            // Untracked files have no index entry; include their content so
            // they show up as all-addition hunks.
            opts.include_untracked(true)
                .recurse_untracked_dirs(true)
                .show_untracked_content(true);
            self.repo.diff_index_to_workdir(None, Some(&mut opts))
        }
    }
}

/// Walks a git2 diff into owned `FileDiff` values.
///
/// The three callbacks share mutable access to the accumulator through a
/// `RefCell`; git2 invokes them sequentially on the calling thread, so the
/// single-writer invariant holds at runtime.
fn collect_file_diffs(diff: &Diff<'_>) -> Result<Vec<FileDiff>, GitError> {
    let files: RefCell<Vec<FileDiff>> = RefCell::new(Vec::new());

    diff.foreach(
        &mut |delta, _progress| {
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_else(|| "unknown".to_owned());
            files.borrow_mut().push(FileDiff { path, hunks: Vec::new() });
            true
        },
        None,
        Some(&mut |_delta, hunk| {
            let header = String::from_utf8_lossy(hunk.header()).into_owned();
            if let Some(file) = files.borrow_mut().last_mut() {
                file.hunks.push(Hunk::new(
                    hunk.old_start(),
                    hunk.new_start(),
                    Vec::new(),
                    Some(header),
                ));
            }
            true
        }),
        Some(&mut |_delta, _hunk, line| {
            let content =
                String::from_utf8_lossy(line.content()).trim_end_matches('\n').to_owned();
            let decoded = match line.origin() {
                ' ' => line.old_lineno().zip(line.new_lineno()).map(|(old, new)| {
                    DiffLine::context(content.clone(), old, new)
                }),
                '+' => line.new_lineno().map(|new| DiffLine::addition(content.clone(), new)),
                '-' => line.old_lineno().map(|old| DiffLine::deletion(content.clone(), old)),
                // EOF markers and file headers carry no hunk content.
                _ => None,
            };
            if let Some(diff_line) = decoded {
                let mut files = files.borrow_mut();
                if let Some(hunk) = files.last_mut().and_then(|f| f.hunks.last_mut()) {
                    hunk.lines.push(diff_line);
                }
            }
            true
        }),
    )?;

    // Counts were accumulated line by line; recompute them in one pass so the
    // hunk invariant holds even if the walk skipped marker lines.
    let mut files = files.into_inner();
    for file in &mut files {
        for hunk in &mut file.hunks {
            *hunk = Hunk::new(
                hunk.old_start,
                hunk.new_start,
                std::mem::take(&mut hunk.lines),
                hunk.header.take(),
            );
        }
    }
    Ok(files)
}

/// Prepends the `diff --git` line libgit2's patch parser expects.
///
/// `Hunk::patch_text` emits the two-line `---`/`+++` header per its contract;
/// the extra line is an implementation detail of the libgit2 apply path.
fn with_git_header(patch: &str) -> String {
    if patch.starts_with("diff --git") {
        return patch.to_owned();
    }
    let path = patch
        .lines()
        .next()
        .and_then(|l| l.strip_prefix("--- a/"))
        .unwrap_or("unknown");
    format!("diff --git a/{path} b/{path}\n{patch}")
}

impl GitBackend for Git2Backend {
    fn repo_name(&self) -> String {
        self.repo
            .workdir()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "repository".to_owned())
    }

    fn current_branch(&self) -> String {
        self.repo
            .head()
            .ok()
            .and_then(|h| h.shorthand().map(str::to_owned))
            .unwrap_or_else(|| "(no branch)".to_owned())
    }

    fn status(&self) -> Result<Vec<FileStatus>, GitError> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .renames_head_to_index(true);
        let statuses = self.repo.statuses(Some(&mut opts))?;

        let mut files = Vec::with_capacity(statuses.len());
        for entry in statuses.iter() {
            let s = entry.status();
            if s.is_ignored() {
                continue;
            }
            let mut file = FileStatus::new(entry.path().unwrap_or("unknown"));
            file.staged = s.is_index_new()
                || s.is_index_modified()
                || s.is_index_deleted()
                || s.is_index_renamed()
                || s.is_index_typechange();
            file.modified = s.is_wt_modified() || s.is_wt_typechange();
            file.untracked = s.is_wt_new();
            file.deleted = s.is_wt_deleted();
            file.renamed = s.is_wt_renamed() || s.is_index_renamed();
            file.conflicted = s.is_conflicted();
            files.push(file);
        }
        Ok(files)
    }

    fn diff(&self, path: Option<&str>, staged: bool) -> Result<Vec<FileDiff>, GitError> {
        let diff = self.build_diff(path, staged)?;
        collect_file_diffs(&diff)
    }

    fn stage_path(&self, path: &str) -> Result<(), GitError> {
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| GitError("bare repository has no working tree".to_owned()))?;
        let mut index = self.repo.index()?;
        if workdir.join(path).exists() {
            index.add_path(Path::new(path))?;
        } else {
            // Staging a deletion records the removal in the index.
            index.remove_path(Path::new(path))?;
        }
        index.write()?;
        Ok(())
    }

    fn unstage_path(&self, path: &str) -> Result<(), GitError> {
        let target = match self.head_commit()? {
            Some(commit) => Some(commit.into_object()),
            None => None,
        };
        self.repo.reset_default(target.as_ref(), [path])?;
        Ok(())
    }

    fn apply_patch(&self, patch: &str, to_index: bool) -> Result<(), GitError> {
        let full = with_git_header(patch);
        let diff = Diff::from_buffer(full.as_bytes())?;
        let location = if to_index { ApplyLocation::Index } else { ApplyLocation::WorkDir };
        self.repo.apply(&diff, location, None)?;
        Ok(())
    }

    fn commit(&self, message: &str, amend: bool) -> Result<String, GitError> {
        let mut index = self.repo.index()?;
        let tree_id = index.write_tree()?;
        let tree = self.repo.find_tree(tree_id)?;

        if amend {
            let head = self
                .head_commit()?
                .ok_or_else(|| GitError("no commit to amend".to_owned()))?;
            // An empty message must not replace the stored one; `None` tells
            // git2 to keep it.
            let message = if message.is_empty() { None } else { Some(message) };
            let id = head.amend(Some("HEAD"), None, None, None, message, Some(&tree))?;
            return Ok(id.to_string());
        }

        let signature = self.repo.signature()?;
        let parent = self.head_commit()?;
        let parents: Vec<&Commit<'_>> = parent.iter().collect();
        let id = self.repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        Ok(id.to_string())
    }

    fn discard_changes(&self, path: &str) -> Result<(), GitError> {
        let mut checkout = CheckoutBuilder::new();
        checkout.path(path).force();
        self.repo.checkout_head(Some(&mut checkout))?;
        Ok(())
    }

    fn log(&self, limit: usize) -> Result<Vec<CommitSummary>, GitError> {
        let mut walk = self.repo.revwalk()?;
        if walk.push_head().is_err() {
            // Unborn HEAD: nothing to list.
            return Ok(Vec::new());
        }
        let mut commits = Vec::new();
        for oid in walk.take(limit) {
            let oid = oid?;
            let commit = self.repo.find_commit(oid)?;
            commits.push(CommitSummary {
                id: oid.to_string()[..7].to_owned(),
                summary: commit.summary().unwrap_or("").to_owned(),
                author: commit.author().name().unwrap_or("unknown").to_owned(),
                time_secs: commit.time().seconds(),
            });
        }
        Ok(commits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stagehand_core::LineKind;
    use std::collections::BTreeSet;

    fn init_repo() -> (tempfile::TempDir, Git2Backend) {
        let dir = tempfile::tempdir().unwrap();
        let repo = Repository::init(dir.path()).unwrap();
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test Author").unwrap();
        config.set_str("user.email", "test@example.invalid").unwrap();
        drop(config);
        drop(repo);
        let backend = Git2Backend::open(dir.path()).unwrap();
        (dir, backend)
    }

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) {
        std::fs::write(dir.path().join(name), content).unwrap();
    }

    #[test]
    fn staging_and_committing_a_new_file() {
        let (dir, backend) = init_repo();
        write_file(&dir, "a.txt", "hello\n");

        let status = backend.status().unwrap();
        assert_eq!(status.len(), 1);
        assert!(status[0].untracked);
        assert_eq!(status[0].indicator(), '?');

        backend.stage_path("a.txt").unwrap();
        let status = backend.status().unwrap();
        assert!(status[0].staged);
        assert!(!status[0].untracked);

        let id = backend.commit("initial import", false).unwrap();
        assert_eq!(id.len(), 40);
        let log = backend.log(10).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].summary, "initial import");
        assert_eq!(log[0].author, "Test Author");
        assert!(backend.status().unwrap().is_empty());
    }

    #[test]
    fn amend_rewrites_the_last_commit() {
        let (dir, backend) = init_repo();
        write_file(&dir, "a.txt", "hello\n");
        backend.stage_path("a.txt").unwrap();
        backend.commit("first draft", false).unwrap();

        backend.commit("final wording", true).unwrap();
        let log = backend.log(10).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].summary, "final wording");
    }

    #[test]
    fn amend_with_empty_message_keeps_the_old_one() {
        let (dir, backend) = init_repo();
        write_file(&dir, "a.txt", "hello\n");
        backend.stage_path("a.txt").unwrap();
        backend.commit("original message", false).unwrap();

        write_file(&dir, "b.txt", "extra\n");
        backend.stage_path("b.txt").unwrap();
        backend.commit("", true).unwrap();

        let log = backend.log(10).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].summary, "original message");
        assert!(backend.status().unwrap().is_empty());
    }

    #[test]
    fn unstage_restores_the_modified_flag() {
        let (dir, backend) = init_repo();
        write_file(&dir, "a.txt", "hello\n");
        backend.stage_path("a.txt").unwrap();
        backend.commit("initial", false).unwrap();

        write_file(&dir, "a.txt", "hello\nworld\n");
        backend.stage_path("a.txt").unwrap();
        assert!(backend.status().unwrap()[0].staged);

        backend.unstage_path("a.txt").unwrap();
        let status = backend.status().unwrap();
        assert!(!status[0].staged);
        assert!(status[0].modified);
    }

    #[test]
    fn discard_reverts_the_working_tree() {
        let (dir, backend) = init_repo();
        write_file(&dir, "a.txt", "hello\n");
        backend.stage_path("a.txt").unwrap();
        backend.commit("initial", false).unwrap();

        write_file(&dir, "a.txt", "changed\n");
        assert!(!backend.status().unwrap().is_empty());
        backend.discard_changes("a.txt").unwrap();
        assert!(backend.status().unwrap().is_empty());
        let content = std::fs::read_to_string(dir.path().join("a.txt")).unwrap();
        assert_eq!(content, "hello\n");
    }

    #[test]
    fn diff_extraction_maps_hunk_lines() {
        let (dir, backend) = init_repo();
        write_file(&dir, "a.txt", "one\ntwo\nthree\n");
        backend.stage_path("a.txt").unwrap();
        backend.commit("initial", false).unwrap();

        write_file(&dir, "a.txt", "one\nTWO\nthree\n");
        let diffs = backend.diff(None, false).unwrap();
        assert_eq!(diffs.len(), 1);
        assert_eq!(diffs[0].path, "a.txt");
        let hunk = &diffs[0].hunks[0];
        assert_eq!(hunk.deletions(), 1);
        assert_eq!(hunk.additions(), 1);
        let deletion = hunk.lines.iter().find(|l| l.kind == LineKind::Deletion).unwrap();
        assert_eq!(deletion.content, "two");
        assert_eq!(deletion.old_lineno, Some(2));
    }

    #[test]
    fn partial_staging_applies_only_the_selected_lines() {
        let (dir, backend) = init_repo();
        write_file(&dir, "a.txt", "one\ntwo\nthree\n");
        backend.stage_path("a.txt").unwrap();
        backend.commit("initial", false).unwrap();

        write_file(&dir, "a.txt", "one\ntwo\nthree\nfour\nfive\n");
        let diffs = backend.diff(None, false).unwrap();
        let hunk = &diffs[0].hunks[0];

        // Two trailing additions: stage only "four".
        let selected: BTreeSet<usize> = hunk
            .lines
            .iter()
            .enumerate()
            .filter(|(_, l)| l.kind == LineKind::Addition && l.content == "four")
            .map(|(i, _)| i)
            .collect();
        assert_eq!(selected.len(), 1);
        let subset = hunk.with_selected_lines(&selected).unwrap();
        backend.apply_patch(&subset.patch_text("a.txt"), true).unwrap();

        let staged = backend.diff(None, true).unwrap();
        let staged_lines: Vec<&str> = staged[0]
            .hunks
            .iter()
            .flat_map(|h| &h.lines)
            .filter(|l| l.kind == LineKind::Addition)
            .map(|l| l.content.as_str())
            .collect();
        assert_eq!(staged_lines, vec!["four"]);

        // The other addition is still only in the working tree.
        let unstaged = backend.diff(None, false).unwrap();
        let has_five = unstaged[0]
            .hunks
            .iter()
            .flat_map(|h| &h.lines)
            .any(|l| l.kind == LineKind::Addition && l.content == "five");
        assert!(has_five);
    }
}
