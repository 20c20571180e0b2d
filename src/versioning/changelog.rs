//! versioning::changelog
//!
//! Commit messages since the last release, and the version file entry
//! they render into.
//!
//! # Algorithm
//!
//! [`Versioner::log_main`] walks breadth-first from head:
//!
//! - Root: its message is included.
//! - One parent: if the version differs from the parent's, this commit is
//!   the previous release and the walk stops there without including it.
//!   Otherwise the message is included and the parent followed.
//! - Merge: the message is always included. Mainline parents are followed;
//!   every other parent is expanded in place by [`Versioner::log_branch`].
//!
//! [`Versioner::log_branch`] includes every commit until it reaches the
//! mainline (excluded) or a root (included).
//!
//! Each walk deduplicates through its own [`Frontier`], so a commit reached
//! by two side branches can appear twice.

use super::{Frontier, MainlineSet, Versioner, VersioningError};
use crate::core::version::Version;
use crate::git::{Commit, History};

impl<H: History> Versioner<H> {
    /// Messages from head back to the previous release.
    pub fn log_head(&self) -> Result<Vec<String>, VersioningError> {
        let head = self.history.head()?;
        let mainline = self.mainline(&head)?;
        self.log_main(&head, &mainline)
    }

    /// Messages along the mainline from `start`, with side branches spliced
    /// in where they merge.
    pub fn log_main(
        &self,
        start: &Commit,
        mainline: &MainlineSet,
    ) -> Result<Vec<String>, VersioningError> {
        let mut frontier = Frontier::starting_at(start.clone());
        let mut messages = Vec::new();

        while let Some(commit) = frontier.next() {
            match commit.parents.len() {
                0 => messages.push(commit.message.clone()),
                1 => {
                    let mut parents = self.history.parents(&commit)?;
                    let Some(parent) = parents.pop() else {
                        continue;
                    };
                    if self.version_at(&commit)? != self.version_at(&parent)? {
                        continue;
                    }
                    messages.push(commit.message.clone());
                    frontier.push(parent);
                }
                _ => {
                    messages.push(commit.message.clone());
                    for parent in self.history.parents(&commit)? {
                        if mainline.contains(&parent.oid) {
                            frontier.push(parent);
                        } else {
                            messages.extend(self.log_branch(&parent, mainline)?);
                        }
                    }
                }
            }
        }

        Ok(messages)
    }

    /// Messages on a side branch from `start` back to the mainline.
    pub fn log_branch(
        &self,
        start: &Commit,
        mainline: &MainlineSet,
    ) -> Result<Vec<String>, VersioningError> {
        let mut frontier = Frontier::starting_at(start.clone());
        let mut messages = Vec::new();

        while let Some(commit) = frontier.next() {
            if mainline.contains(&commit.oid) {
                continue;
            }
            messages.push(commit.message.clone());
            for parent in self.history.parents(&commit)? {
                frontier.push(parent);
            }
        }

        Ok(messages)
    }
}

/// A new version file entry: the version line and its changelog bullets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub version: Version,
    pub messages: Vec<String>,
}

impl Entry {
    pub fn new(version: Version, messages: Vec<String>) -> Self {
        Self { version, messages }
    }

    /// Render the entry.
    ///
    /// Each message becomes a `- ` bullet; its further lines are indented
    /// by two spaces and blank lines are dropped. The bullet list is framed
    /// by blank lines.
    ///
    /// ```
    /// use tagsmith::core::version::Version;
    /// use tagsmith::versioning::changelog::Entry;
    ///
    /// let entry = Entry::new(
    ///     Version::parse("v1.1.0").unwrap(),
    ///     vec!["add flag\n\nlonger text\n".into()],
    /// );
    /// assert_eq!(entry.render(), "v1.1.0\n\n- add flag\n  longer text\n\n");
    /// ```
    pub fn render(&self) -> String {
        let mut out = format!("{}\n", self.version);
        if self.messages.is_empty() {
            return out;
        }

        out.push('\n');
        for message in &self.messages {
            let mut bullet = "- ";
            for line in message.split('\n').filter(|l| !l.is_empty()) {
                out.push_str(bullet);
                out.push_str(line);
                out.push('\n');
                bullet = "  ";
            }
        }
        out.push('\n');
        out
    }

    /// Render the entry in front of the previous version file contents.
    pub fn render_onto(&self, previous: &str) -> String {
        let mut out = self.render();
        if !previous.is_empty() {
            out.push('\n');
            out.push_str(previous);
        }
        out
    }
}
