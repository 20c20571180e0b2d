//! versioning::changeset
//!
//! Files and directories changed since the last release.
//!
//! # Algorithm
//!
//! 1. Pick a baseline version. If head is a release commit with a parent,
//!    the baseline is the parent's version (the release being replaced);
//!    otherwise it is head's own version.
//! 2. Walk breadth-first from head. A single-parent commit older than the
//!    baseline is neither expanded nor recorded. A merge tests each parent
//!    against the baseline on its own and is always recorded.
//! 3. The last recorded commit is the boundary. Head's snapshot is diffed
//!    against it and every changed path is reported together with all of
//!    its ancestor directories.
//!
//! The boundary depends on breadth-first level order: with divergent
//! branches of different depths, the last commit dequeued is not
//! necessarily the newest commit older than the baseline on every branch.
//! This is a known weakness, kept as is so results stay comparable across
//! releases.

use std::collections::BTreeSet;

use super::{Frontier, Versioner, VersioningError};
use crate::git::History;

/// Paths changed since the last release, directories included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet(BTreeSet<String>);

impl ChangeSet {
    /// Add a path and each of its ancestor directories.
    fn insert_with_ancestors(&mut self, path: &str) {
        let mut path = clean_path(path);
        while !path.is_empty() {
            let parent = match path.rfind('/') {
                Some(at) => path[..at].to_string(),
                None => String::new(),
            };
            self.0.insert(path);
            path = parent;
        }
    }

    /// Whether `path` (or a directory containing a change) changed.
    ///
    /// `path` is normalized first, so `./src/` matches `src`.
    pub fn contains(&self, path: &str) -> bool {
        self.0.contains(&clean_path(path))
    }

    /// Normalized paths from `paths` that did not change.
    pub fn unchanged<'a>(&self, paths: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        paths
            .into_iter()
            .map(clean_path)
            .filter(|p| !self.0.contains(p))
            .collect()
    }

    /// Sorted iteration over all changed paths.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> FromIterator<&'a str> for ChangeSet {
    /// Collect changed file paths, adding their ancestor directories.
    fn from_iter<I: IntoIterator<Item = &'a str>>(paths: I) -> Self {
        let mut set = ChangeSet::default();
        for path in paths {
            set.insert_with_ancestors(path);
        }
        set
    }
}

/// Lexically normalize a slash-separated relative path.
fn clean_path(path: &str) -> String {
    let mut parts: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}

impl<H: History> Versioner<H> {
    /// Paths changed between head and the last release.
    ///
    /// # Errors
    ///
    /// [`VersioningError::NoReleaseHistory`] if the walk recorded no
    /// boundary commit.
    pub fn changed_paths(&self) -> Result<ChangeSet, VersioningError> {
        let head = self.history.head()?;

        let baseline = match head.parents.first() {
            Some(parent) if self.is_release_commit(&head)? => {
                let parent = self.history.commit(parent)?;
                self.version_at(&parent)?
            }
            _ => self.version_at(&head)?,
        };

        let mut frontier = Frontier::starting_at(head.clone());
        let mut boundary = None;

        while let Some(commit) = frontier.next() {
            match commit.parents.len() {
                0 => {}
                1 => {
                    if self.version_at(&commit)?.is_before(&baseline) {
                        continue;
                    }
                    for parent in self.history.parents(&commit)? {
                        frontier.push(parent);
                    }
                }
                _ => {
                    for parent in self.history.parents(&commit)? {
                        if !self.version_at(&parent)?.is_before(&baseline) {
                            frontier.push(parent);
                        }
                    }
                }
            }
            // Last dequeued wins; see module docs
            boundary = Some(commit);
        }

        let boundary = boundary.ok_or(VersioningError::NoReleaseHistory)?;

        let changes = self
            .history
            .diff(&self.history.tree(&head), &self.history.tree(&boundary))?;

        let mut set = ChangeSet::default();
        for change in changes {
            for path in [change.from, change.to].into_iter().flatten() {
                set.insert_with_ancestors(&path);
            }
        }
        Ok(set)
    }
}
