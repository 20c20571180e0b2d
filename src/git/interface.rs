//! git::interface
//!
//! [`History`] implementation over a real repository using git2.
//!
//! # Error Handling
//!
//! Git errors are categorized into typed variants:
//! - [`GitError::NotARepo`]: Not inside a Git repository
//! - [`GitError::RefNotFound`]: Requested ref does not exist (e.g. unborn HEAD)
//! - [`GitError::ObjectNotFound`]: Commit or tree does not exist
//! - [`GitError::Internal`]: Anything else libgit2 reports
//!
//! Missing files and missing tags are not errors; the trait reports them
//! as `Ok(None)`.
//!
//! # Example
//!
//! ```ignore
//! use tagsmith::git::{Git, History};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let head = git.head()?;
//! println!("HEAD is {}", head.oid.short(7));
//! ```

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::{Commit, History, PathChange, Snapshot};
use crate::core::types::{Oid, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound | git2::ErrorCode::UnbornBranch => {
                if context.starts_with("refs/") || context == "HEAD" {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
        }
    }
}

/// A repository opened for history reads.
pub struct Git {
    repo: git2::Repository,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .finish()
    }
}

impl Git {
    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover`, so `path` can be any directory
    /// within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        if repo.is_bare() {
            return Err(GitError::BareRepo);
        }

        Ok(Self { repo })
    }

    /// Path to the `.git` directory.
    pub fn git_dir(&self) -> &Path {
        self.repo.path()
    }

    /// Path to the working directory.
    pub fn work_dir(&self) -> Result<&Path, GitError> {
        self.repo.workdir().ok_or(GitError::BareRepo)
    }

    fn to_git2(oid: &Oid) -> Result<git2::Oid, GitError> {
        git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    fn find_tree(&self, snapshot: &Snapshot) -> Result<git2::Tree<'_>, GitError> {
        let oid = Self::to_git2(&snapshot.oid)?;
        self.repo
            .find_tree(oid)
            .map_err(|e| GitError::from_git2(e, snapshot.oid.as_str()))
    }

    fn convert(commit: &git2::Commit<'_>) -> Commit {
        Commit {
            oid: commit.id().into(),
            parents: commit.parent_ids().map(Oid::from).collect(),
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            tree: Snapshot {
                oid: commit.tree_id().into(),
            },
        }
    }
}

impl History for Git {
    fn head(&self) -> Result<Commit, GitError> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        let commit = head
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, "HEAD"))?;

        Ok(Self::convert(&commit))
    }

    fn commit(&self, oid: &Oid) -> Result<Commit, GitError> {
        let commit = self
            .repo
            .find_commit(Self::to_git2(oid)?)
            .map_err(|e| GitError::from_git2(e, oid.as_str()))?;

        Ok(Self::convert(&commit))
    }

    fn file_contents(
        &self,
        snapshot: &Snapshot,
        path: &str,
    ) -> Result<Option<Vec<u8>>, GitError> {
        let tree = self.find_tree(snapshot)?;
        let entry = match tree.get_path(Path::new(path)) {
            Ok(entry) => entry,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, path)),
        };

        // A directory with the requested name is not a file
        if entry.kind() != Some(git2::ObjectType::Blob) {
            return Ok(None);
        }

        let blob = self
            .repo
            .find_blob(entry.id())
            .map_err(|e| GitError::from_git2(e, path))?;

        Ok(Some(blob.content().to_vec()))
    }

    fn diff(&self, from: &Snapshot, to: &Snapshot) -> Result<Vec<PathChange>, GitError> {
        let old = self.find_tree(from)?;
        let new = self.find_tree(to)?;

        let diff = self
            .repo
            .diff_tree_to_tree(Some(&old), Some(&new), None)
            .map_err(|e| GitError::from_git2(e, "diff"))?;

        let path_of = |file: git2::DiffFile<'_>| {
            file.path().map(|p| p.to_string_lossy().into_owned())
        };

        Ok(diff
            .deltas()
            .map(|delta| match delta.status() {
                git2::Delta::Added => PathChange {
                    from: None,
                    to: path_of(delta.new_file()),
                },
                git2::Delta::Deleted => PathChange {
                    from: path_of(delta.old_file()),
                    to: None,
                },
                _ => PathChange {
                    from: path_of(delta.old_file()),
                    to: path_of(delta.new_file()),
                },
            })
            .collect())
    }

    fn resolve_tag(&self, name: &str) -> Result<Option<Oid>, GitError> {
        let refname = format!("refs/tags/{name}");
        let reference = match self.repo.find_reference(&refname) {
            Ok(reference) => reference,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(GitError::from_git2(e, &refname)),
        };

        let commit = reference
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, &refname))?;

        Ok(Some(commit.id().into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod git_error {
        use super::*;

        #[test]
        fn not_found_on_ref_context() {
            let err = git2::Error::new(
                git2::ErrorCode::NotFound,
                git2::ErrorClass::Reference,
                "missing",
            );
            assert!(matches!(
                GitError::from_git2(err, "refs/tags/v1"),
                GitError::RefNotFound { .. }
            ));
        }

        #[test]
        fn unborn_head_is_ref_not_found() {
            let err = git2::Error::new(
                git2::ErrorCode::UnbornBranch,
                git2::ErrorClass::Reference,
                "unborn",
            );
            assert!(matches!(
                GitError::from_git2(err, "HEAD"),
                GitError::RefNotFound { .. }
            ));
        }

        #[test]
        fn not_found_on_object_context() {
            let err = git2::Error::new(
                git2::ErrorCode::NotFound,
                git2::ErrorClass::Odb,
                "missing",
            );
            assert!(matches!(
                GitError::from_git2(err, "abc123"),
                GitError::ObjectNotFound { .. }
            ));
        }

        #[test]
        fn other_codes_are_internal() {
            let err = git2::Error::new(
                git2::ErrorCode::GenericError,
                git2::ErrorClass::Os,
                "boom",
            );
            let mapped = GitError::from_git2(err, "diff");
            assert_eq!(mapped.to_string(), "git error: diff: boom");
        }

        #[test]
        fn type_error_converts() {
            let err: GitError = TypeError::InvalidOid("short".into()).into();
            assert!(matches!(err, GitError::InvalidOid { .. }));
        }
    }
}
