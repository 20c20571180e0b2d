//! forge::mock
//!
//! Mock forge implementation for deterministic testing.
//!
//! # Design
//!
//! The mock keeps tags, releases and asset bytes in memory and mimics the
//! GitHub behaviors the release protocol depends on: drafts are invisible to
//! tag lookups, creating an existing ref or a duplicate asset name is a 422,
//! and `latest` skips drafts and prereleases. Failures can be injected per
//! operation, and per asset name for transfers.
//!
//! # Example
//!
//! ```
//! use tagsmith::forge::mock::MockForge;
//! use tagsmith::forge::{CreateReleaseRequest, Forge};
//!
//! # tokio_test::block_on(async {
//! let forge = MockForge::new();
//! let release = forge.create_release(CreateReleaseRequest {
//!     tag_name: "v1.0.0".to_string(),
//!     name: "v1.0.0".to_string(),
//!     body: String::new(),
//!     draft: true,
//!     prerelease: false,
//! }).await.unwrap();
//!
//! // Drafts are not visible by tag until published
//! assert!(forge.get_release_by_tag("v1.0.0").await.is_err());
//! forge.publish_release(release.id).await.unwrap();
//! assert!(forge.get_release_by_tag("v1.0.0").await.is_ok());
//! # });
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::traits::{
    Asset, CreateReleaseRequest, CreateTagRequest, Forge, ForgeError, ObjectKind, Release,
    TagObject, TagRef,
};
use crate::core::types::Oid;

/// Mock forge for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone)]
pub struct MockForge {
    owner: String,
    repo: String,
    /// Internal state shared across clones.
    inner: Arc<Mutex<MockForgeInner>>,
}

/// Internal mutable state.
#[derive(Debug, Default)]
struct MockForgeInner {
    /// Commits the remote knows about.
    commits: HashSet<Oid>,
    /// Tag refs in creation order.
    tag_refs: Vec<TagRef>,
    /// Annotated tag objects by their own hash.
    tag_objects: HashMap<Oid, TagObject>,
    /// Releases, newest first.
    releases: Vec<Release>,
    /// Asset contents by asset id.
    blobs: HashMap<u64, Vec<u8>>,
    /// Next id for releases and assets.
    next_id: u64,
    /// Login returned by `current_user`.
    user: String,
    /// Injected failures.
    fail_on: Vec<FailOn>,
    /// Recorded operations for verification.
    operations: Vec<MockOperation>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone)]
pub enum FailOn {
    GetTagRef(ForgeError),
    CommitExists(ForgeError),
    CreateTagObject(ForgeError),
    CreateTagRef(ForgeError),
    ListReleases(ForgeError),
    CreateRelease(ForgeError),
    PublishRelease(ForgeError),
    ListTags(ForgeError),
    /// Fail uploads of one asset name.
    UploadAsset { name: String, error: ForgeError },
    /// Fail downloads of one asset name.
    DownloadAsset { name: String, error: ForgeError },
    CurrentUser(ForgeError),
}

impl FailOn {
    fn error_for(&self, op: &MockOperation) -> Option<ForgeError> {
        let error = match (self, op) {
            (FailOn::GetTagRef(e), MockOperation::GetTagRef { .. })
            | (FailOn::CommitExists(e), MockOperation::CommitExists { .. })
            | (FailOn::CreateTagObject(e), MockOperation::CreateTagObject { .. })
            | (FailOn::CreateTagRef(e), MockOperation::CreateTagRef { .. })
            | (FailOn::ListReleases(e), MockOperation::ListReleases)
            | (FailOn::CreateRelease(e), MockOperation::CreateRelease { .. })
            | (FailOn::PublishRelease(e), MockOperation::PublishRelease { .. })
            | (FailOn::ListTags(e), MockOperation::ListTags)
            | (FailOn::CurrentUser(e), MockOperation::CurrentUser) => e,
            (FailOn::UploadAsset { name, error }, MockOperation::UploadAsset { name: n, .. })
            | (FailOn::DownloadAsset { name, error }, MockOperation::DownloadAsset { name: n })
                if name == n =>
            {
                error
            }
            _ => return None,
        };
        Some(error.clone())
    }
}

/// Recorded operation for test verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockOperation {
    GetTagRef { tag: String },
    GetTagObject { sha: Oid },
    CommitExists { sha: Oid },
    CreateTagObject { tag: String, target: Oid },
    CreateTagRef { tag: String, target: Oid },
    ListReleases,
    GetLatestRelease,
    GetReleaseByTag { tag: String },
    CreateRelease { tag: String, draft: bool },
    PublishRelease { id: u64 },
    ListTags,
    UploadAsset { release_id: u64, name: String },
    DownloadAsset { name: String },
    CurrentUser,
}

impl MockForge {
    /// Create a new empty mock forge for `mock/repo`.
    pub fn new() -> Self {
        Self::for_repo("mock", "repo")
    }

    /// Create a new empty mock forge bound to `owner/repo`.
    pub fn for_repo(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            inner: Arc::new(Mutex::new(MockForgeInner {
                next_id: 1,
                user: "octocat".to_string(),
                ..Default::default()
            })),
        }
    }

    /// Configure the mock to fail on an operation. May be called repeatedly.
    ///
    /// # Example
    ///
    /// ```
    /// use tagsmith::forge::mock::{MockForge, FailOn};
    /// use tagsmith::forge::ForgeError;
    ///
    /// let forge = MockForge::new()
    ///     .fail_on(FailOn::CreateRelease(ForgeError::RateLimited));
    /// ```
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.state().fail_on.push(fail_on);
        self
    }

    /// Clear the failure configuration.
    pub fn clear_fail_on(&self) {
        self.state().fail_on.clear();
    }

    /// Make `sha` known to the remote, as if it had been pushed.
    pub fn push_commit(&self, sha: &Oid) {
        self.state().commits.insert(sha.clone());
    }

    /// Set the login `current_user` returns.
    pub fn set_user(&self, login: impl Into<String>) {
        self.state().user = login.into();
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<MockOperation> {
        self.state().operations.clone()
    }

    /// Clear recorded operations.
    pub fn clear_operations(&self) {
        self.state().operations.clear();
    }

    /// All tag refs, in creation order (for test verification).
    pub fn tag_refs(&self) -> Vec<TagRef> {
        self.state().tag_refs.clone()
    }

    /// All annotated tag objects (for test verification).
    pub fn tag_objects(&self) -> Vec<TagObject> {
        self.state().tag_objects.values().cloned().collect()
    }

    /// All releases, newest first (for test verification).
    pub fn releases(&self) -> Vec<Release> {
        self.state().releases.clone()
    }

    /// Stored bytes of an asset (for test verification).
    pub fn asset_data(&self, id: u64) -> Option<Vec<u8>> {
        self.state().blobs.get(&id).cloned()
    }

    /// Attach an asset directly, bypassing failure injection.
    pub fn seed_asset(&self, release_id: u64, name: &str, data: &[u8]) -> Option<Asset> {
        let mut inner = self.state();
        let id = inner.next_id;
        let release = inner.releases.iter_mut().find(|r| r.id == release_id)?;
        let asset = mock_asset(id, name, data.len());
        release.assets.push(asset.clone());
        inner.next_id += 1;
        inner.blobs.insert(id, data.to_vec());
        Some(asset)
    }

    fn state(&self) -> MutexGuard<'_, MockForgeInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record an operation and return the injected failure for it, if any.
    fn record(&self, op: MockOperation) -> Result<(), ForgeError> {
        let mut inner = self.state();
        let failure = inner.fail_on.iter().find_map(|f| f.error_for(&op));
        inner.operations.push(op);
        match failure {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Default for MockForge {
    fn default() -> Self {
        Self::new()
    }
}

fn mock_asset(id: u64, name: &str, size: usize) -> Asset {
    Asset {
        id,
        name: name.to_string(),
        content_type: "application/octet-stream".to_string(),
        size: size as u64,
        label: None,
        browser_download_url: format!("https://github.com/mock/repo/releases/download/{}", name),
    }
}

fn unprocessable(message: impl Into<String>) -> ForgeError {
    ForgeError::ApiError {
        status: 422,
        message: message.into(),
    }
}

#[async_trait]
impl Forge for MockForge {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn owner(&self) -> &str {
        &self.owner
    }

    fn repo(&self) -> &str {
        &self.repo
    }

    async fn get_tag_ref(&self, tag: &str) -> Result<Option<TagRef>, ForgeError> {
        self.record(MockOperation::GetTagRef {
            tag: tag.to_string(),
        })?;
        Ok(self.state().tag_refs.iter().find(|t| t.name == tag).cloned())
    }

    async fn get_tag_object(&self, sha: &Oid) -> Result<Option<TagObject>, ForgeError> {
        self.record(MockOperation::GetTagObject { sha: sha.clone() })?;
        Ok(self.state().tag_objects.get(sha).cloned())
    }

    async fn commit_exists(&self, sha: &Oid) -> Result<bool, ForgeError> {
        self.record(MockOperation::CommitExists { sha: sha.clone() })?;
        Ok(self.state().commits.contains(sha))
    }

    async fn create_tag_object(&self, request: CreateTagRequest) -> Result<TagObject, ForgeError> {
        self.record(MockOperation::CreateTagObject {
            tag: request.tag.clone(),
            target: request.target.clone(),
        })?;

        let mut inner = self.state();
        if !inner.commits.contains(&request.target) {
            return Err(unprocessable("Object does not exist"));
        }
        let sha = Oid::new(format!("f{:039x}", inner.tag_objects.len() + 1))
            .map_err(|e| unprocessable(e.to_string()))?;
        let object = TagObject {
            sha: sha.clone(),
            tag: request.tag,
            message: request.message,
            target: request.target,
        };
        inner.tag_objects.insert(sha, object.clone());
        Ok(object)
    }

    async fn create_tag_ref(&self, tag: &str, target: &Oid) -> Result<TagRef, ForgeError> {
        self.record(MockOperation::CreateTagRef {
            tag: tag.to_string(),
            target: target.clone(),
        })?;

        let mut inner = self.state();
        if inner.tag_refs.iter().any(|t| t.name == tag) {
            return Err(unprocessable("Reference already exists"));
        }
        let kind = if inner.tag_objects.contains_key(target) {
            ObjectKind::Tag
        } else if inner.commits.contains(target) {
            ObjectKind::Commit
        } else {
            return Err(unprocessable("Object does not exist"));
        };
        let tag_ref = TagRef {
            name: tag.to_string(),
            target: target.clone(),
            kind,
        };
        inner.tag_refs.push(tag_ref.clone());
        Ok(tag_ref)
    }

    async fn list_releases(&self) -> Result<Vec<Release>, ForgeError> {
        self.record(MockOperation::ListReleases)?;
        Ok(self.state().releases.clone())
    }

    async fn get_latest_release(&self) -> Result<Release, ForgeError> {
        self.record(MockOperation::GetLatestRelease)?;
        self.state()
            .releases
            .iter()
            .find(|r| !r.draft && !r.prerelease)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound("latest release".into()))
    }

    async fn get_release_by_tag(&self, tag: &str) -> Result<Release, ForgeError> {
        self.record(MockOperation::GetReleaseByTag {
            tag: tag.to_string(),
        })?;
        self.state()
            .releases
            .iter()
            .find(|r| !r.draft && r.tag_name == tag)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("release {}", tag)))
    }

    async fn create_release(&self, request: CreateReleaseRequest) -> Result<Release, ForgeError> {
        self.record(MockOperation::CreateRelease {
            tag: request.tag_name.clone(),
            draft: request.draft,
        })?;

        let mut inner = self.state();
        if inner.releases.iter().any(|r| r.tag_name == request.tag_name) {
            return Err(unprocessable("Validation Failed: already_exists"));
        }
        let id = inner.next_id;
        inner.next_id += 1;
        let release = Release {
            id,
            html_url: format!(
                "https://github.com/{}/{}/releases/tag/{}",
                self.owner, self.repo, request.tag_name
            ),
            upload_url: format!("https://uploads.github.com/mock/releases/{}/assets", id),
            tag_name: request.tag_name,
            name: request.name,
            body: request.body,
            draft: request.draft,
            prerelease: request.prerelease,
            created_at: None,
            assets: Vec::new(),
        };
        inner.releases.insert(0, release.clone());
        Ok(release)
    }

    async fn publish_release(&self, id: u64) -> Result<Release, ForgeError> {
        self.record(MockOperation::PublishRelease { id })?;
        let mut inner = self.state();
        let release = inner
            .releases
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ForgeError::NotFound(format!("release {}", id)))?;
        release.draft = false;
        Ok(release.clone())
    }

    async fn list_tags(&self) -> Result<Vec<String>, ForgeError> {
        self.record(MockOperation::ListTags)?;
        Ok(self
            .state()
            .tag_refs
            .iter()
            .rev()
            .map(|t| t.name.clone())
            .collect())
    }

    async fn upload_asset(
        &self,
        release: &Release,
        name: &str,
        mut file: File,
        size: u64,
    ) -> Result<Asset, ForgeError> {
        self.record(MockOperation::UploadAsset {
            release_id: release.id,
            name: name.to_string(),
        })?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .await
            .map_err(|e| ForgeError::Io(e.to_string()))?;
        if data.len() as u64 != size {
            return Err(unprocessable(format!(
                "{} is {} bytes, declared {}",
                name,
                data.len(),
                size
            )));
        }

        let mut inner = self.state();
        let id = inner.next_id;
        let target = inner
            .releases
            .iter_mut()
            .find(|r| r.id == release.id)
            .ok_or_else(|| ForgeError::NotFound(format!("release {}", release.id)))?;
        if target.asset(name).is_some() {
            return Err(unprocessable("Validation Failed: already_exists"));
        }
        let asset = mock_asset(id, name, data.len());
        target.assets.push(asset.clone());
        inner.next_id += 1;
        inner.blobs.insert(id, data);
        Ok(asset)
    }

    async fn download_asset(
        &self,
        asset: &Asset,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, ForgeError> {
        self.record(MockOperation::DownloadAsset {
            name: asset.name.clone(),
        })?;
        let data = self
            .state()
            .blobs
            .get(&asset.id)
            .cloned()
            .ok_or_else(|| ForgeError::NotFound(format!("asset {}", asset.name)))?;
        sink.write_all(&data)
            .await
            .map_err(|e| ForgeError::Io(e.to_string()))?;
        Ok(data.len() as u64)
    }

    async fn current_user(&self) -> Result<String, ForgeError> {
        self.record(MockOperation::CurrentUser)?;
        Ok(self.state().user.clone())
    }
}
