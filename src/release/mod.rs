//! release
//!
//! Turning a tag, a release and a list of files into remote state.
//!
//! # Overview
//!
//! - [`protocol`]: the idempotent tag, draft, upload, publish sequence
//! - [`transfer`]: a fixed pool of worker tasks for uploads and downloads
//! - [`query`]: resolving `latest`/`stable`/`edge` and globbing assets
//!
//! Everything talks to the remote through `dyn Forge`, so the whole module
//! runs against [`MockForge`](crate::forge::mock::MockForge) in tests.

pub mod protocol;
pub mod query;
pub mod transfer;

pub use protocol::ReleaseSpec;
pub use query::{glob_assets, resolve_release, ResolvedAsset};
pub use transfer::{DownloadTarget, Job, TransferError, TransferPool};

use thiserror::Error;

use crate::core::types::Oid;
use crate::forge::ForgeError;

/// Errors from release operations.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// The tag exists and points elsewhere. Tags are never moved.
    #[error("tag {tag} exists and points at {existing}, not {requested}")]
    TagConflict {
        tag: String,
        existing: Oid,
        requested: Oid,
    },

    /// The remote does not know the commit to tag.
    #[error("sha {0} not found, is the commit pushed?")]
    CommitNotPushed(Oid),

    /// `edge` was asked of a repository without releases.
    #[error("{0} has no releases")]
    NoReleases(String),

    /// A release or asset lookup matched nothing.
    #[error("{0} was not found")]
    NotFound(String),

    /// An asset glob failed to compile.
    #[error("{0} is not a valid glob pattern")]
    InvalidPattern(String),

    /// One or more uploads failed; every failure is kept.
    #[error("uploads failed")]
    UploadsFailed(Vec<TransferError>),

    /// A forge call failed during `step`.
    #[error("{step}: {source}")]
    Forge {
        step: &'static str,
        #[source]
        source: ForgeError,
    },
}

impl ReleaseError {
    /// Wrap a forge error with the step it happened in.
    pub(crate) fn during(step: &'static str) -> impl FnOnce(ForgeError) -> ReleaseError {
        move |source| ReleaseError::Forge { step, source }
    }

    /// Whether this is a not-found condition the caller may tolerate.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ReleaseError::NotFound(_)
                | ReleaseError::NoReleases(_)
                | ReleaseError::Forge {
                    source: ForgeError::NotFound(_),
                    ..
                }
        )
    }
}
