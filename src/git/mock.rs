//! git::mock
//!
//! In-memory [`History`] for tests.
//!
//! Commits get sequential hashes (`000...01`, `000...02`, ...) so failures
//! are easy to read. Each commit's files start as a copy of its first
//! parent's files, with the given paths overwritten.
//!
//! # Example
//!
//! ```
//! use tagsmith::git::mock::MockHistory;
//! use tagsmith::git::History;
//!
//! let mut history = MockHistory::new();
//! let root = history.add_commit(&[], "init", &[("VERSION", "v1.0.0\n")]);
//! let head = history.add_commit(&[root.clone()], "fix", &[("src/lib.rs", "")]);
//!
//! assert_eq!(history.head().unwrap().oid, head);
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::{Commit, GitError, History, PathChange, Snapshot};
use crate::core::types::Oid;

type Files = BTreeMap<String, Vec<u8>>;

/// A commit graph held in memory.
#[derive(Debug, Clone, Default)]
pub struct MockHistory {
    commits: HashMap<Oid, Commit>,
    trees: HashMap<Oid, Files>,
    tags: HashMap<String, Oid>,
    head: Option<Oid>,
    counter: u64,
}

impl MockHistory {
    /// Create an empty history with an unborn head.
    pub fn new() -> Self {
        Self::default()
    }

    fn next_oid(&mut self, prefix: char) -> Oid {
        self.counter += 1;
        // Prefix keeps tree and commit hashes apart
        Oid::new(format!("{prefix}{:039x}", self.counter))
            .unwrap_or_else(|_| unreachable!("generated hashes are always 40 hex digits"))
    }

    /// Record a commit and move head to it.
    ///
    /// `files` overwrite the first parent's files. Returns the new hash.
    pub fn add_commit(&mut self, parents: &[Oid], message: &str, files: &[(&str, &str)]) -> Oid {
        let mut tree: Files = parents
            .first()
            .and_then(|p| self.commits.get(p))
            .and_then(|c| self.trees.get(&c.tree.oid))
            .cloned()
            .unwrap_or_default();
        for (path, contents) in files {
            tree.insert((*path).to_string(), contents.as_bytes().to_vec());
        }

        let tree_oid = self.next_oid('e');
        self.trees.insert(tree_oid.clone(), tree);

        let oid = self.next_oid('0');
        self.commits.insert(
            oid.clone(),
            Commit {
                oid: oid.clone(),
                parents: parents.to_vec(),
                message: message.to_string(),
                tree: Snapshot { oid: tree_oid },
            },
        );
        self.head = Some(oid.clone());
        oid
    }

    /// Remove a file from a commit's snapshot.
    pub fn remove_file(&mut self, commit: &Oid, path: &str) {
        if let Some(tree) = self
            .commits
            .get(commit)
            .and_then(|c| self.trees.get_mut(&c.tree.oid))
        {
            tree.remove(path);
        }
    }

    /// Point head at an existing commit.
    pub fn set_head(&mut self, oid: &Oid) {
        self.head = Some(oid.clone());
    }

    /// Create a tag pointing at a commit.
    pub fn tag(&mut self, name: &str, oid: &Oid) {
        self.tags.insert(name.to_string(), oid.clone());
    }

    fn files(&self, snapshot: &Snapshot) -> Result<&Files, GitError> {
        self.trees
            .get(&snapshot.oid)
            .ok_or_else(|| GitError::ObjectNotFound {
                oid: snapshot.oid.to_string(),
            })
    }
}

impl History for MockHistory {
    fn head(&self) -> Result<Commit, GitError> {
        let oid = self.head.as_ref().ok_or_else(|| GitError::RefNotFound {
            refname: "HEAD".to_string(),
        })?;
        self.commit(oid)
    }

    fn commit(&self, oid: &Oid) -> Result<Commit, GitError> {
        self.commits
            .get(oid)
            .cloned()
            .ok_or_else(|| GitError::ObjectNotFound {
                oid: oid.to_string(),
            })
    }

    fn file_contents(
        &self,
        snapshot: &Snapshot,
        path: &str,
    ) -> Result<Option<Vec<u8>>, GitError> {
        Ok(self.files(snapshot)?.get(path).cloned())
    }

    fn diff(&self, from: &Snapshot, to: &Snapshot) -> Result<Vec<PathChange>, GitError> {
        let old = self.files(from)?;
        let new = self.files(to)?;

        let paths: BTreeSet<&String> = old.keys().chain(new.keys()).collect();
        Ok(paths
            .into_iter()
            .filter_map(|path| match (old.get(path), new.get(path)) {
                (Some(a), Some(b)) if a == b => None,
                (a, b) => Some(PathChange {
                    from: a.map(|_| path.clone()),
                    to: b.map(|_| path.clone()),
                }),
            })
            .collect())
    }

    fn resolve_tag(&self, name: &str) -> Result<Option<Oid>, GitError> {
        Ok(self.tags.get(name).cloned())
    }
}
