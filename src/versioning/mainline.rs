//! versioning::mainline
//!
//! The set of commits the version file follows.
//!
//! # Algorithm
//!
//! Breadth-first from a starting commit; every commit reached is mainline.
//!
//! - Root: marked, nothing to follow.
//! - One parent: the parent is followed unconditionally.
//! - Merge: a parent is followed only if its version equals the merge's.
//!
//! The heuristic assumes a release branch is merged into a line that
//! already carries its version bump, so a side branch shows up as the
//! parent with an older version. A side branch that bumped the version
//! itself and was merged without a further bump is treated as mainline.

use std::collections::HashSet;

use super::{Frontier, Versioner, VersioningError};
use crate::core::types::Oid;
use crate::git::{Commit, History};

/// Hashes of mainline commits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MainlineSet(HashSet<Oid>);

impl MainlineSet {
    /// Whether `oid` is on the mainline.
    pub fn contains(&self, oid: &Oid) -> bool {
        self.0.contains(oid)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Oid> {
        self.0.iter()
    }
}

impl FromIterator<Oid> for MainlineSet {
    fn from_iter<I: IntoIterator<Item = Oid>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<H: History> Versioner<H> {
    /// Resolve the mainline reachable from `start`.
    ///
    /// # Errors
    ///
    /// Propagates history read failures and malformed version files.
    pub fn mainline(&self, start: &Commit) -> Result<MainlineSet, VersioningError> {
        let mut frontier = Frontier::starting_at(start.clone());
        let mut marked = HashSet::new();

        while let Some(commit) = frontier.next() {
            marked.insert(commit.oid.clone());
            if commit.is_root() {
                continue;
            }

            let parents = self.history.parents(&commit)?;
            if !commit.is_merge() {
                for parent in parents {
                    frontier.push(parent);
                }
                continue;
            }

            let version = self.version_at(&commit)?;
            for parent in parents {
                if self.version_at(&parent)? == version {
                    frontier.push(parent);
                }
            }
        }

        Ok(MainlineSet(marked))
    }
}
