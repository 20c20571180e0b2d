//! versioning::frontier
//!
//! Breadth-first work queue for a single history traversal.
//!
//! # Design
//!
//! A [`Frontier`] is a FIFO of commits plus the set of hashes it has ever
//! accepted. Pushing a hash a second time is a no-op, so every commit is
//! delivered at most once even when many merge paths lead to it.
//!
//! The frontier is single use. Once [`Iterator::next`] has returned `None`
//! it is spent: later pushes are dropped and `next` keeps returning `None`.
//! Walkers drive it like this, pushing while they consume:
//!
//! ```
//! use tagsmith::git::mock::MockHistory;
//! use tagsmith::git::History;
//! use tagsmith::versioning::Frontier;
//!
//! let mut history = MockHistory::new();
//! let a = history.add_commit(&[], "a", &[]);
//! history.add_commit(&[a], "b", &[]);
//!
//! let mut frontier = Frontier::starting_at(history.head().unwrap());
//! let mut seen = Vec::new();
//! while let Some(commit) = frontier.next() {
//!     seen.push(commit.message.clone());
//!     for parent in history.parents(&commit).unwrap() {
//!         frontier.push(parent);
//!     }
//! }
//! assert_eq!(seen, ["b", "a"]);
//! ```

use std::collections::{HashSet, VecDeque};

use crate::core::types::Oid;
use crate::git::Commit;

/// FIFO queue of commits with hash deduplication.
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<Commit>,
    seen: HashSet<Oid>,
    spent: bool,
}

impl Frontier {
    /// An empty frontier.
    pub fn new() -> Self {
        Self::default()
    }

    /// A frontier holding one starting commit.
    pub fn starting_at(commit: Commit) -> Self {
        let mut frontier = Self::new();
        frontier.push(commit);
        frontier
    }

    /// Enqueue a commit unless its hash was pushed before.
    ///
    /// Returns `true` if the commit was enqueued.
    pub fn push(&mut self, commit: Commit) -> bool {
        if self.spent || !self.seen.insert(commit.oid.clone()) {
            return false;
        }
        self.queue.push_back(commit);
        true
    }

    /// Whether the frontier has been exhausted.
    pub fn is_spent(&self) -> bool {
        self.spent
    }

    /// Commits waiting to be delivered.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Whether nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Iterator for Frontier {
    type Item = Commit;

    fn next(&mut self) -> Option<Commit> {
        let next = self.queue.pop_front();
        if next.is_none() {
            self.spent = true;
        }
        next
    }
}
