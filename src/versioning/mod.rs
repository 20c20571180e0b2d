//! versioning
//!
//! Version-file driven history analysis.
//!
//! # Overview
//!
//! A repository carries a version file (`VERSION` by default) whose first
//! line is the current version and whose remaining lines are a changelog.
//! A commit that changes that first line relative to its first parent is a
//! *release commit*. Everything here answers questions relative to the last
//! release:
//!
//! - [`Versioner::mainline`]: which commits are on the line of development
//!   the version file follows ([`mainline`])
//! - [`Versioner::log_head`]: commit messages since the last release
//!   ([`changelog`])
//! - [`Versioner::changed_paths`]: files changed since the last release
//!   ([`changeset`])
//!
//! All walkers are breadth-first over a [`Frontier`] and read history only
//! through the [`History`] trait.
//!
//! # Example
//!
//! ```
//! use tagsmith::git::mock::MockHistory;
//! use tagsmith::versioning::Versioner;
//!
//! let mut history = MockHistory::new();
//! let a = history.add_commit(&[], "init", &[("VERSION", "v1.0.0\n")]);
//! history.add_commit(&[a], "release", &[("VERSION", "v1.1.0\n")]);
//!
//! let versioner = Versioner::new(history, "VERSION");
//! assert!(versioner.is_release().unwrap());
//! assert_eq!(versioner.head_version().unwrap().to_string(), "v1.1.0");
//! ```

pub mod changelog;
pub mod changeset;
pub mod frontier;
pub mod mainline;

pub use changeset::ChangeSet;
pub use frontier::Frontier;
pub use mainline::MainlineSet;

use similar::{ChangeTag, TextDiff};
use thiserror::Error;

use crate::core::types::Oid;
use crate::core::version::{Version, VersionParseError};
use crate::git::{Commit, GitError, History};

/// Errors from history analysis.
#[derive(Debug, Error)]
pub enum VersioningError {
    #[error(transparent)]
    Git(#[from] GitError),

    /// The version file exists but its first line holds no version.
    #[error("version file at {commit} is malformed: {source}")]
    MalformedVersion {
        commit: Oid,
        source: VersionParseError,
    },

    /// No commit on the walk was usable as a boundary.
    #[error("no release history found; is the version file committed?")]
    NoReleaseHistory,

    /// A merge commit cannot carry a release diff.
    #[error("head {0} is a merge commit; merge commits cannot be releases")]
    MergeHead(Oid),
}

/// Reads versions out of a history for one version file.
#[derive(Debug)]
pub struct Versioner<H> {
    history: H,
    path: String,
}

impl<H: History> Versioner<H> {
    /// Analyze `history` using the version file at `path`.
    pub fn new(history: H, path: impl Into<String>) -> Self {
        Self {
            history,
            path: path.into(),
        }
    }

    /// The underlying history.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Path of the version file inside the repository.
    pub fn path(&self) -> &str {
        &self.path
    }

    fn contents_at(&self, commit: &Commit) -> Result<Option<String>, VersioningError> {
        let snapshot = self.history.tree(commit);
        Ok(self
            .history
            .file_contents(&snapshot, &self.path)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }

    /// The version recorded at `commit`.
    ///
    /// A commit without the version file has the unset version.
    ///
    /// # Errors
    ///
    /// [`VersioningError::MalformedVersion`] if the first line holds no
    /// version.
    pub fn version_at(&self, commit: &Commit) -> Result<Version, VersioningError> {
        let Some(contents) = self.contents_at(commit)? else {
            return Ok(Version::unset());
        };
        let first = contents.split('\n').next().unwrap_or_default();
        Version::parse(first).map_err(|source| VersioningError::MalformedVersion {
            commit: commit.oid.clone(),
            source,
        })
    }

    /// The version recorded at head.
    pub fn head_version(&self) -> Result<Version, VersioningError> {
        let head = self.history.head()?;
        self.version_at(&head)
    }

    /// Whether `commit` is a release commit.
    ///
    /// Root commits are releases. Merge commits never are. Otherwise the
    /// version must differ from the first parent's.
    pub fn is_release_commit(&self, commit: &Commit) -> Result<bool, VersioningError> {
        match commit.parents.as_slice() {
            [] => Ok(true),
            [parent] => {
                let parent = self.history.commit(parent)?;
                Ok(self.version_at(commit)? != self.version_at(&parent)?)
            }
            _ => Ok(false),
        }
    }

    /// Whether head is a release commit.
    pub fn is_release(&self) -> Result<bool, VersioningError> {
        let head = self.history.head()?;
        self.is_release_commit(&head)
    }

    /// Full contents of the version file at head, empty if it is missing.
    pub fn last_log(&self) -> Result<String, VersioningError> {
        let head = self.history.head()?;
        Ok(self.contents_at(&head)?.unwrap_or_default())
    }

    /// Blocks of lines added to the version file by the head commit.
    ///
    /// Each contiguous run of added lines is one entry, newlines included.
    /// A root head yields nothing.
    ///
    /// # Errors
    ///
    /// [`VersioningError::MergeHead`] if head is a merge commit.
    pub fn log_diff(&self) -> Result<Vec<String>, VersioningError> {
        let head = self.history.head()?;
        let parent = match head.parents.as_slice() {
            [] => return Ok(Vec::new()),
            [parent] => self.history.commit(parent)?,
            _ => return Err(VersioningError::MergeHead(head.oid)),
        };

        let old = self.contents_at(&parent)?.unwrap_or_default();
        let new = self.contents_at(&head)?.unwrap_or_default();
        if old.contains('\0') || new.contains('\0') {
            return Ok(Vec::new());
        }

        let diff = TextDiff::from_lines(&old, &new);
        let mut chunks = Vec::new();
        let mut current = String::new();
        for change in diff.iter_all_changes() {
            if change.tag() == ChangeTag::Insert {
                current.push_str(change.value());
            } else if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        Ok(chunks)
    }
}
