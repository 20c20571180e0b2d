//! git
//!
//! Read-only access to commit history.
//!
//! # Architecture
//!
//! The history walkers in [`crate::versioning`] never talk to a repository
//! directly. They see the [`History`] trait: commits with parent hashes, a
//! snapshot per commit, file contents inside a snapshot, and a path diff
//! between two snapshots. Two implementations exist:
//!
//! - [`Git`]: a real repository through `git2`. No other module imports
//!   `git2`.
//! - [`mock::MockHistory`]: an in-memory graph for tests.
//!
//! # Invariants
//!
//! - Nothing in this module writes to the repository
//! - All operations return strong types ([`Oid`])
//! - A missing file or tag is `Ok(None)`, not an error
//!
//! # Example
//!
//! ```ignore
//! use tagsmith::git::{Git, History};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let head = git.head()?;
//! let version = git.file_contents(&head.tree, "VERSION")?;
//! ```

mod interface;
pub mod mock;

pub use interface::{Git, GitError};

use crate::core::types::Oid;

/// A commit as seen by the history walkers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub oid: Oid,
    /// Parent hashes in order; the first parent is the mainline parent
    pub parents: Vec<Oid>,
    pub message: String,
    pub tree: Snapshot,
}

impl Commit {
    /// Whether this commit has no parents.
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Whether this commit has two or more parents.
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}

/// The tree of files recorded by a commit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Snapshot {
    pub oid: Oid,
}

/// One changed path between two snapshots.
///
/// `from` is `None` for added files, `to` is `None` for deleted files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathChange {
    pub from: Option<String>,
    pub to: Option<String>,
}

/// Read interface over a commit graph.
pub trait History {
    /// The commit `HEAD` points at.
    fn head(&self) -> Result<Commit, GitError>;

    /// Look up a commit by hash.
    fn commit(&self, oid: &Oid) -> Result<Commit, GitError>;

    /// The parent commits, in parent order.
    fn parents(&self, commit: &Commit) -> Result<Vec<Commit>, GitError> {
        commit.parents.iter().map(|oid| self.commit(oid)).collect()
    }

    /// The snapshot recorded by a commit.
    fn tree(&self, commit: &Commit) -> Snapshot {
        commit.tree.clone()
    }

    /// Contents of `path` in a snapshot, or `None` if there is no such file.
    fn file_contents(&self, snapshot: &Snapshot, path: &str)
        -> Result<Option<Vec<u8>>, GitError>;

    /// Paths that differ between two snapshots.
    fn diff(&self, from: &Snapshot, to: &Snapshot) -> Result<Vec<PathChange>, GitError>;

    /// The commit a tag points at, peeling annotated tags.
    fn resolve_tag(&self, name: &str) -> Result<Option<Oid>, GitError>;
}
