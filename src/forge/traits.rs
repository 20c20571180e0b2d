//! forge::traits
//!
//! Forge trait definition for release hosting services.
//!
//! # Design
//!
//! The `Forge` trait is async because forge operations involve network I/O.
//! A forge value is bound to one repository; callers build one per
//! `org/repo` through [`create_forge`](super::create_forge).
//!
//! Lookups that commonly miss return `Option` so callers can tell "absent"
//! apart from a failure without matching on [`ForgeError::NotFound`].
//!
//! # Example
//!
//! ```ignore
//! use tagsmith::forge::{Forge, ForgeError};
//!
//! async fn newest(forge: &dyn Forge) -> Result<(), ForgeError> {
//!     let release = forge.get_latest_release().await?;
//!     println!("{} has {} assets", release.tag_name, release.assets.len());
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWrite;

use crate::core::types::Oid;

/// Errors from forge operations.
///
/// These error types map to common failure modes when interacting
/// with remote hosting services like GitHub.
#[derive(Debug, Clone, Error)]
pub enum ForgeError {
    /// Authentication is required but not available.
    #[error("authentication required")]
    AuthRequired,

    /// Authentication failed (invalid token, expired, insufficient permissions).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limit exceeded.
    #[error("rate limited")]
    RateLimited,

    /// API returned an error.
    #[error("API error: {status} - {message}")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Error message from the API
        message: String,
    },

    /// Network or connection error.
    #[error("network error: {0}")]
    NetworkError(String),

    /// Reading an upload or writing a download failed locally.
    #[error("I/O error: {0}")]
    Io(String),

    /// The operation is not supported by this forge.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

/// Kind of object a tag ref points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    /// Lightweight tag: the ref points straight at a commit.
    Commit,
    /// Annotated tag: the ref points at a tag object.
    Tag,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectKind::Commit => write!(f, "commit"),
            ObjectKind::Tag => write!(f, "tag"),
        }
    }
}

/// A remote `refs/tags/<name>` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagRef {
    /// Tag name without the `refs/tags/` prefix
    pub name: String,
    /// Object the ref points at
    pub target: Oid,
    /// What `target` is
    pub kind: ObjectKind,
}

/// An annotated tag object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagObject {
    /// Hash of the tag object itself
    pub sha: Oid,
    /// Tag name
    pub tag: String,
    /// Annotation message
    pub message: String,
    /// Commit the tag annotates
    pub target: Oid,
}

/// Request to create an annotated tag object.
#[derive(Debug, Clone)]
pub struct CreateTagRequest {
    pub tag: String,
    pub message: String,
    pub target: Oid,
}

/// A file attached to a release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    /// Forge-assigned asset id
    pub id: u64,
    pub name: String,
    pub content_type: String,
    /// Size in bytes
    pub size: u64,
    pub label: Option<String>,
    /// Public download URL
    pub browser_download_url: String,
}

/// A release and its assets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Forge-assigned release id
    pub id: u64,
    /// Tag the release is attached to
    pub tag_name: String,
    pub name: String,
    pub body: String,
    pub draft: bool,
    pub prerelease: bool,
    /// Web URL for viewing
    pub html_url: String,
    /// Upload endpoint for new assets, template suffix removed
    pub upload_url: String,
    pub created_at: Option<DateTime<Utc>>,
    pub assets: Vec<Asset>,
}

impl Release {
    /// The asset with exactly this name, if attached.
    pub fn asset(&self, name: &str) -> Option<&Asset> {
        self.assets.iter().find(|a| a.name == name)
    }
}

/// Request to create a release.
#[derive(Debug, Clone)]
pub struct CreateReleaseRequest {
    /// Existing tag to attach to
    pub tag_name: String,
    pub name: String,
    pub body: String,
    /// Create as draft
    pub draft: bool,
    pub prerelease: bool,
}

/// The Forge trait for release hosting services.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` so the transfer pool can share one
/// forge across its worker tasks.
///
/// # Error Handling
///
/// All methods return `Result<T, ForgeError>`. Callers should handle:
/// - `AuthRequired` / `AuthFailed`: Configure a token
/// - `NotFound`: Resource doesn't exist
/// - `RateLimited`: Back off and retry
/// - `ApiError`: Display error message to user
/// - `NetworkError`: Check connectivity
#[async_trait]
pub trait Forge: Send + Sync {
    /// Get the forge name (e.g., "github").
    fn name(&self) -> &'static str;

    /// Repository owner this forge is bound to.
    fn owner(&self) -> &str;

    /// Repository name this forge is bound to.
    fn repo(&self) -> &str;

    /// Look up `refs/tags/<tag>`.
    ///
    /// Returns `None` if the ref does not exist.
    async fn get_tag_ref(&self, tag: &str) -> Result<Option<TagRef>, ForgeError>;

    /// Read an annotated tag object.
    ///
    /// Returns `None` if `sha` is not a tag object.
    async fn get_tag_object(&self, sha: &Oid) -> Result<Option<TagObject>, ForgeError>;

    /// Whether the remote repository contains the commit `sha`.
    async fn commit_exists(&self, sha: &Oid) -> Result<bool, ForgeError>;

    /// Create an annotated tag object. No ref is created.
    async fn create_tag_object(&self, request: CreateTagRequest) -> Result<TagObject, ForgeError>;

    /// Create `refs/tags/<tag>` pointing at `target`.
    ///
    /// # Errors
    ///
    /// - `ApiError` with status 422 if the ref already exists
    async fn create_tag_ref(&self, tag: &str, target: &Oid) -> Result<TagRef, ForgeError>;

    /// All releases, drafts included, newest first.
    async fn list_releases(&self) -> Result<Vec<Release>, ForgeError>;

    /// The newest published, non-prerelease release.
    ///
    /// # Errors
    ///
    /// - `NotFound` if there is none
    async fn get_latest_release(&self) -> Result<Release, ForgeError>;

    /// The published release for `tag`.
    ///
    /// Drafts are not visible through this lookup; use
    /// [`list_releases`](Forge::list_releases) to find them.
    ///
    /// # Errors
    ///
    /// - `NotFound` if there is none
    async fn get_release_by_tag(&self, tag: &str) -> Result<Release, ForgeError>;

    /// Create a release for an existing tag.
    async fn create_release(&self, request: CreateReleaseRequest) -> Result<Release, ForgeError>;

    /// Mark a draft release as published.
    async fn publish_release(&self, id: u64) -> Result<Release, ForgeError>;

    /// Names of all tags, released or not.
    async fn list_tags(&self) -> Result<Vec<String>, ForgeError>;

    /// Stream `size` bytes of `file` to `release` as an asset called `name`.
    async fn upload_asset(
        &self,
        release: &Release,
        name: &str,
        file: File,
        size: u64,
    ) -> Result<Asset, ForgeError>;

    /// Stream the raw contents of an asset into `sink`.
    ///
    /// Returns the number of bytes written. The sink is not flushed.
    async fn download_asset(
        &self,
        asset: &Asset,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, ForgeError>;

    /// Login of the account the token belongs to.
    async fn current_user(&self) -> Result<String, ForgeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(assets: &[&str]) -> Release {
        Release {
            id: 1,
            tag_name: "v1.0.0".into(),
            name: "v1.0.0".into(),
            body: String::new(),
            draft: false,
            prerelease: false,
            html_url: String::new(),
            upload_url: String::new(),
            created_at: None,
            assets: assets
                .iter()
                .enumerate()
                .map(|(i, name)| Asset {
                    id: i as u64,
                    name: name.to_string(),
                    content_type: "application/octet-stream".into(),
                    size: 0,
                    label: None,
                    browser_download_url: String::new(),
                })
                .collect(),
        }
    }

    #[test]
    fn object_kind_display() {
        assert_eq!(format!("{}", ObjectKind::Commit), "commit");
        assert_eq!(format!("{}", ObjectKind::Tag), "tag");
    }

    #[test]
    fn release_asset_lookup_is_exact() {
        let r = release(&["tool-linux", "tool-darwin"]);
        assert_eq!(r.asset("tool-darwin").map(|a| a.id), Some(1));
        assert!(r.asset("tool").is_none());
    }

    #[test]
    fn forge_error_display() {
        assert_eq!(
            format!("{}", ForgeError::AuthRequired),
            "authentication required"
        );
        assert_eq!(
            format!("{}", ForgeError::AuthFailed("expired token".into())),
            "authentication failed: expired token"
        );
        assert_eq!(
            format!("{}", ForgeError::NotFound("release v1".into())),
            "not found: release v1"
        );
        assert_eq!(format!("{}", ForgeError::RateLimited), "rate limited");
        assert_eq!(
            format!(
                "{}",
                ForgeError::ApiError {
                    status: 422,
                    message: "Validation failed".into()
                }
            ),
            "API error: 422 - Validation failed"
        );
        assert_eq!(
            format!("{}", ForgeError::NetworkError("connection refused".into())),
            "network error: connection refused"
        );
        assert_eq!(
            format!("{}", ForgeError::NotImplemented("gitea".into())),
            "not implemented: gitea"
        );
    }
}
