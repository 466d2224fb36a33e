//! Per-file working-tree status flags.

/// Status flags for one file, exactly as reported by the backend.
///
/// The single-character indicator and the stage/unstage eligibility are
/// derived on demand from the flags, never stored redundantly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStatus {
    /// Repository-relative path.
    pub path: String,
    /// The file has changes recorded in the index.
    pub staged: bool,
    /// The working tree differs from the index.
    pub modified: bool,
    /// The file is not tracked.
    pub untracked: bool,
    /// The file was deleted in the working tree.
    pub deleted: bool,
    /// The file was renamed.
    pub renamed: bool,
    /// The file has merge conflicts.
    pub conflicted: bool,
}

impl FileStatus {
    /// Builds a status with all flags cleared.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            staged: false,
            modified: false,
            untracked: false,
            deleted: false,
            renamed: false,
            conflicted: false,
        }
    }

    /// Single-character indicator shown in the file list.
    ///
    /// Priority order matters: a conflicted file shows `U` even if it is
    /// also modified, and deletion outranks the staged flag.
    pub fn indicator(&self) -> char {
        if self.conflicted {
            'U'
        } else if self.deleted {
            'D'
        } else if self.renamed {
            'R'
        } else if self.staged {
            'S'
        } else if self.modified {
            'M'
        } else if self.untracked {
            '?'
        } else {
            ' '
        }
    }

    /// Whether the stage operation applies to this file.
    pub fn can_stage(&self) -> bool {
        !self.staged && (self.modified || self.untracked || self.deleted)
    }

    /// Whether the unstage operation applies to this file.
    pub fn can_unstage(&self) -> bool {
        self.staged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(path: &str) -> FileStatus {
        FileStatus::new(path)
    }

    #[test]
    fn staged_file_indicator_and_eligibility() {
        let mut s = status("a.rs");
        s.staged = true;
        assert_eq!(s.indicator(), 'S');
        assert!(s.can_unstage());
        assert!(!s.can_stage());
    }

    #[test]
    fn untracked_file_indicator_and_eligibility() {
        let mut s = status("new.rs");
        s.untracked = true;
        assert_eq!(s.indicator(), '?');
        assert!(s.can_stage());
        assert!(!s.can_unstage());
    }

    #[test]
    fn conflict_outranks_everything() {
        let mut s = status("war.rs");
        s.conflicted = true;
        s.modified = true;
        s.staged = true;
        assert_eq!(s.indicator(), 'U');
    }

    #[test]
    fn deleted_outranks_staged() {
        let mut s = status("gone.rs");
        s.deleted = true;
        s.staged = true;
        assert_eq!(s.indicator(), 'D');
    }

    #[test]
    fn clean_file_shows_blank() {
        let s = status("same.rs");
        assert_eq!(s.indicator(), ' ');
        assert!(!s.can_stage());
        assert!(!s.can_unstage());
    }
}
