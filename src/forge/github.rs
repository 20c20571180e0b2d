//! forge::github
//!
//! GitHub forge implementation using the REST API.
//!
//! # Design
//!
//! One `GitHubForge` is bound to one `owner/repo`. Every request asks the
//! [`TokenProvider`] for a bearer token; the provider caches, so this costs
//! nothing after the first call.
//!
//! Lookups that are expected to miss (tag refs, tag objects, commits) turn
//! a 404 into `None` or `false`. Everything else maps HTTP status to
//! [`ForgeError`] in one place, [`GitHubForge::handle_error_response`].
//!
//! # Rate Limiting
//!
//! GitHub has rate limits. This implementation:
//! - Returns `ForgeError::RateLimited` when limits are hit
//! - Does not implement automatic retry for rate limits (caller's responsibility)
//!
//! # Example
//!
//! ```ignore
//! use tagsmith::auth::ChainTokenProvider;
//! use tagsmith::forge::github::GitHubForge;
//! use tagsmith::forge::Forge;
//! use std::sync::Arc;
//!
//! let provider = Arc::new(ChainTokenProvider::from_chain(&chain, true, "github.com")?);
//! let forge = GitHubForge::new(provider, "octocat", "hello-world");
//! let latest = forge.get_latest_release().await?;
//! ```
//!
//! [`TokenProvider`]: crate::auth::TokenProvider

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_LENGTH, CONTENT_TYPE, USER_AGENT,
};
use reqwest::{Body, Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use super::traits::{
    Asset, CreateReleaseRequest, CreateTagRequest, Forge, ForgeError, ObjectKind, Release,
    TagObject, TagRef,
};
use crate::auth::TokenProvider;
use crate::core::types::Oid;

/// Default GitHub API base URL.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// User-Agent header value for API requests.
const USER_AGENT_VALUE: &str = "tagsmith-cli";

/// Page size for list endpoints (GitHub's maximum).
const PER_PAGE: usize = 100;

/// GitHub forge implementation.
pub struct GitHubForge {
    /// HTTP client for making requests
    client: Client,
    /// Source of bearer tokens
    token_provider: Arc<dyn TokenProvider>,
    /// Repository owner (user or organization)
    owner: String,
    /// Repository name
    repo: String,
    /// API base URL (configurable for GitHub Enterprise)
    api_base: String,
}

// Custom Debug to avoid exposing the token provider's state
impl std::fmt::Debug for GitHubForge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubForge")
            .field("token_host", &self.token_provider.host())
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl GitHubForge {
    /// Create a forge for `owner/repo` on github.com.
    pub fn new(
        provider: Arc<dyn TokenProvider>,
        owner: impl Into<String>,
        repo: impl Into<String>,
    ) -> Self {
        Self::with_api_base(provider, owner, repo, DEFAULT_API_BASE)
    }

    /// Create a forge with a custom API base URL.
    ///
    /// Use this for GitHub Enterprise (e.g., `https://github.example.com/api/v3`)
    /// and for tests against a local mock server.
    pub fn with_api_base(
        provider: Arc<dyn TokenProvider>,
        owner: impl Into<String>,
        repo: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            token_provider: provider,
            owner: owner.into(),
            repo: repo.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_bearer_token(&self) -> Result<String, ForgeError> {
        self.token_provider.bearer_token().await.map_err(|e| {
            if e.needs_token() {
                ForgeError::AuthRequired
            } else {
                ForgeError::AuthFailed(e.to_string())
            }
        })
    }

    /// Build common headers for API requests.
    async fn headers(&self) -> Result<HeaderMap, ForgeError> {
        let token = self.get_bearer_token().await?;
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ForgeError::AuthFailed("token is not a valid header value".into()))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        Ok(headers)
    }

    /// Build URL for a repository endpoint.
    fn repo_url(&self, path: &str) -> String {
        format!(
            "{}/repos/{}/{}/{}",
            self.api_base, self.owner, self.repo, path
        )
    }

    /// Attach headers and send.
    async fn send(&self, request: RequestBuilder) -> Result<Response, ForgeError> {
        request
            .headers(self.headers().await?)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T, ForgeError> {
        let response = self.send(self.client.get(url)).await?;
        self.handle_response(response).await
    }

    /// GET that treats 404 as absence.
    async fn get_optional<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
    ) -> Result<Option<T>, ForgeError> {
        let response = self.send(self.client.get(url)).await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        self.handle_response(response).await.map(Some)
    }

    /// Collect every page of a list endpoint.
    async fn get_paginated<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
    ) -> Result<Vec<T>, ForgeError> {
        let mut items = Vec::new();
        let mut page: u32 = 1;
        loop {
            let url = self.repo_url(&format!("{}?per_page={}&page={}", path, PER_PAGE, page));
            let batch: Vec<T> = self.get_json(&url).await?;
            let count = batch.len();
            items.extend(batch);
            if count < PER_PAGE {
                break;
            }
            page += 1;
        }
        Ok(items)
    }

    /// Handle API response, mapping errors appropriately.
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: Response,
    ) -> Result<T, ForgeError> {
        let status = response.status();

        if status.is_success() {
            response.json().await.map_err(|e| ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("Failed to parse response: {}", e),
            })
        } else {
            self.handle_error_response(response, status).await
        }
    }

    /// Handle an error response from the API.
    async fn handle_error_response<T>(
        &self,
        response: Response,
        status: StatusCode,
    ) -> Result<T, ForgeError> {
        // Fine-grained tokens report what they lacked in this header.
        let required_permissions = response
            .headers()
            .get("X-Accepted-GitHub-Permissions")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let message = match response.json::<GitHubErrorResponse>().await {
            Ok(err) => err.message,
            Err(_) => "Unknown error".to_string(),
        };

        Err(match status {
            StatusCode::UNAUTHORIZED => ForgeError::AuthFailed("Invalid or expired token".into()),
            StatusCode::FORBIDDEN => {
                let mut err_msg = format!("Permission denied: {}", message);
                if let Some(perms) = required_permissions.filter(|p| !p.is_empty()) {
                    err_msg.push_str(&format!(" [required: {}]", perms));
                }
                ForgeError::AuthFailed(err_msg)
            }
            StatusCode::NOT_FOUND => ForgeError::NotFound(message),
            StatusCode::UNPROCESSABLE_ENTITY => ForgeError::ApiError {
                status: status.as_u16(),
                message,
            },
            StatusCode::TOO_MANY_REQUESTS => ForgeError::RateLimited,
            _ if status.is_server_error() => ForgeError::ApiError {
                status: status.as_u16(),
                message: format!("GitHub server error: {}", message),
            },
            _ => ForgeError::ApiError {
                status: status.as_u16(),
                message,
            },
        })
    }
}

#[async_trait]
impl Forge for GitHubForge {
    fn name(&self) -> &'static str {
        "github"
    }

    fn owner(&self) -> &str {
        &self.owner
    }

    fn repo(&self) -> &str {
        &self.repo
    }

    async fn get_tag_ref(&self, tag: &str) -> Result<Option<TagRef>, ForgeError> {
        let url = self.repo_url(&format!("git/ref/tags/{}", tag));
        let found: Option<GitHubGitRef> = self.get_optional(&url).await?;
        found.map(TryInto::try_into).transpose()
    }

    async fn get_tag_object(&self, sha: &Oid) -> Result<Option<TagObject>, ForgeError> {
        let url = self.repo_url(&format!("git/tags/{}", sha));
        let found: Option<GitHubTagObject> = self.get_optional(&url).await?;
        found.map(TryInto::try_into).transpose()
    }

    async fn commit_exists(&self, sha: &Oid) -> Result<bool, ForgeError> {
        let url = self.repo_url(&format!("commits/{}", sha));
        let response = self.send(self.client.get(&url)).await?;
        match response.status() {
            s if s.is_success() => Ok(true),
            // 422 is "No commit found for SHA"
            StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => Ok(false),
            s => self.handle_error_response(response, s).await,
        }
    }

    async fn create_tag_object(&self, request: CreateTagRequest) -> Result<TagObject, ForgeError> {
        let body = CreateTagBody {
            tag: &request.tag,
            message: &request.message,
            object: request.target.as_str(),
            kind: "commit",
        };
        let response = self
            .send(self.client.post(self.repo_url("git/tags")).json(&body))
            .await?;
        let created: GitHubTagObject = self.handle_response(response).await?;
        created.try_into()
    }

    async fn create_tag_ref(&self, tag: &str, target: &Oid) -> Result<TagRef, ForgeError> {
        let refname = format!("refs/tags/{}", tag);
        let body = CreateRefBody {
            ref_name: &refname,
            sha: target.as_str(),
        };
        let response = self
            .send(self.client.post(self.repo_url("git/refs")).json(&body))
            .await?;
        let created: GitHubGitRef = self.handle_response(response).await?;
        created.try_into()
    }

    async fn list_releases(&self) -> Result<Vec<Release>, ForgeError> {
        let releases: Vec<GitHubRelease> = self.get_paginated("releases").await?;
        Ok(releases.into_iter().map(Into::into).collect())
    }

    async fn get_latest_release(&self) -> Result<Release, ForgeError> {
        let release: GitHubRelease = self.get_json(&self.repo_url("releases/latest")).await?;
        Ok(release.into())
    }

    async fn get_release_by_tag(&self, tag: &str) -> Result<Release, ForgeError> {
        let url = self.repo_url(&format!("releases/tags/{}", tag));
        let release: GitHubRelease = self.get_json(&url).await?;
        Ok(release.into())
    }

    async fn create_release(&self, request: CreateReleaseRequest) -> Result<Release, ForgeError> {
        let body = CreateReleaseBody {
            tag_name: &request.tag_name,
            name: &request.name,
            body: &request.body,
            draft: request.draft,
            prerelease: request.prerelease,
        };
        let response = self
            .send(self.client.post(self.repo_url("releases")).json(&body))
            .await?;
        let release: GitHubRelease = self.handle_response(response).await?;
        Ok(release.into())
    }

    async fn publish_release(&self, id: u64) -> Result<Release, ForgeError> {
        let url = self.repo_url(&format!("releases/{}", id));
        let body = UpdateReleaseBody { draft: false };
        let response = self.send(self.client.patch(&url).json(&body)).await?;
        let release: GitHubRelease = self.handle_response(response).await?;
        Ok(release.into())
    }

    async fn list_tags(&self) -> Result<Vec<String>, ForgeError> {
        let tags: Vec<GitHubTag> = self.get_paginated("tags").await?;
        Ok(tags.into_iter().map(|t| t.name).collect())
    }

    async fn upload_asset(
        &self,
        release: &Release,
        name: &str,
        file: File,
        size: u64,
    ) -> Result<Asset, ForgeError> {
        // A file body has no known length, so set it for the upload endpoint
        let request = self
            .client
            .post(&release.upload_url)
            .query(&[("name", name)])
            .header(CONTENT_TYPE, "application/octet-stream")
            .header(CONTENT_LENGTH, size)
            .body(Body::from(file));
        let response = self.send(request).await?;
        let asset: GitHubAsset = self.handle_response(response).await?;
        Ok(asset.into())
    }

    async fn download_asset(
        &self,
        asset: &Asset,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> Result<u64, ForgeError> {
        let url = self.repo_url(&format!("releases/assets/{}", asset.id));
        let mut headers = self.headers().await?;
        headers.insert(ACCEPT, HeaderValue::from_static("application/octet-stream"));

        // GitHub answers with a redirect to storage; reqwest follows it and
        // drops the Authorization header on the cross-origin hop.
        let mut response = self
            .client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return self.handle_error_response(response, status).await;
        }

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ForgeError::NetworkError(e.to_string()))?
        {
            sink.write_all(&chunk)
                .await
                .map_err(|e| ForgeError::Io(e.to_string()))?;
            written += chunk.len() as u64;
        }
        Ok(written)
    }

    async fn current_user(&self) -> Result<String, ForgeError> {
        let user: GitHubUser = self.get_json(&format!("{}/user", self.api_base)).await?;
        Ok(user.login)
    }
}

// --------------------------------------------------------------------------
// API Request/Response Types
// --------------------------------------------------------------------------

/// Request body for creating a tag object.
#[derive(Serialize)]
struct CreateTagBody<'a> {
    tag: &'a str,
    message: &'a str,
    object: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

/// Request body for creating a ref.
#[derive(Serialize)]
struct CreateRefBody<'a> {
    #[serde(rename = "ref")]
    ref_name: &'a str,
    sha: &'a str,
}

/// Request body for creating a release.
#[derive(Serialize)]
struct CreateReleaseBody<'a> {
    tag_name: &'a str,
    name: &'a str,
    body: &'a str,
    draft: bool,
    prerelease: bool,
}

/// Request body for editing a release.
#[derive(Serialize)]
struct UpdateReleaseBody {
    draft: bool,
}

/// GitHub error response format.
#[derive(Deserialize)]
struct GitHubErrorResponse {
    message: String,
}

/// Object a ref or tag points at.
#[derive(Deserialize)]
struct GitHubGitObject {
    sha: String,
    #[serde(rename = "type")]
    kind: String,
}

/// `git/ref` response format.
#[derive(Deserialize)]
struct GitHubGitRef {
    #[serde(rename = "ref")]
    ref_name: String,
    object: GitHubGitObject,
}

/// `git/tags` response format.
#[derive(Deserialize)]
struct GitHubTagObject {
    sha: String,
    tag: String,
    #[serde(default)]
    message: String,
    object: GitHubGitObject,
}

/// Release response format.
#[derive(Deserialize)]
struct GitHubRelease {
    id: u64,
    tag_name: String,
    name: Option<String>,
    body: Option<String>,
    draft: bool,
    prerelease: bool,
    html_url: String,
    upload_url: String,
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    assets: Vec<GitHubAsset>,
}

/// Release asset response format.
#[derive(Deserialize)]
struct GitHubAsset {
    id: u64,
    name: String,
    content_type: String,
    size: u64,
    label: Option<String>,
    browser_download_url: String,
}

/// Tag list item.
#[derive(Deserialize)]
struct GitHubTag {
    name: String,
}

/// Minimal user info.
#[derive(Deserialize)]
struct GitHubUser {
    login: String,
}

fn parse_sha(sha: &str) -> Result<Oid, ForgeError> {
    Oid::new(sha).map_err(|e| ForgeError::ApiError {
        status: 200,
        message: format!("Failed to parse response: {}", e),
    })
}

impl TryFrom<GitHubGitRef> for TagRef {
    type Error = ForgeError;

    fn try_from(gh: GitHubGitRef) -> Result<Self, ForgeError> {
        let kind = match gh.object.kind.as_str() {
            "tag" => ObjectKind::Tag,
            _ => ObjectKind::Commit,
        };
        Ok(TagRef {
            name: gh
                .ref_name
                .strip_prefix("refs/tags/")
                .unwrap_or(&gh.ref_name)
                .to_string(),
            target: parse_sha(&gh.object.sha)?,
            kind,
        })
    }
}

impl TryFrom<GitHubTagObject> for TagObject {
    type Error = ForgeError;

    fn try_from(gh: GitHubTagObject) -> Result<Self, ForgeError> {
        Ok(TagObject {
            sha: parse_sha(&gh.sha)?,
            tag: gh.tag,
            message: gh.message,
            target: parse_sha(&gh.object.sha)?,
        })
    }
}

impl From<GitHubAsset> for Asset {
    fn from(gh: GitHubAsset) -> Self {
        Asset {
            id: gh.id,
            name: gh.name,
            content_type: gh.content_type,
            size: gh.size,
            label: gh.label.filter(|l| !l.is_empty()),
            browser_download_url: gh.browser_download_url,
        }
    }
}

impl From<GitHubRelease> for Release {
    fn from(gh: GitHubRelease) -> Self {
        Release {
            id: gh.id,
            name: gh
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| gh.tag_name.clone()),
            tag_name: gh.tag_name,
            body: gh.body.unwrap_or_default(),
            draft: gh.draft,
            prerelease: gh.prerelease,
            html_url: gh.html_url,
            upload_url: strip_url_template(&gh.upload_url),
            created_at: gh.created_at,
            assets: gh.assets.into_iter().map(Into::into).collect(),
        }
    }
}

/// Remove an RFC 6570 suffix such as `{?name,label}`.
fn strip_url_template(url: &str) -> String {
    match url.find('{') {
        Some(at) => url[..at].to_string(),
        None => url.to_string(),
    }
}
