//! forge::factory
//!
//! Forge creation.
//!
//! # Design
//!
//! Commands use `create_forge()` instead of naming `GitHubForge` directly,
//! so the release protocol and the commands only ever see `dyn Forge`.
//!
//! # Example
//!
//! ```ignore
//! use tagsmith::forge::create_forge;
//!
//! let forge = create_forge(provider.clone(), "https://api.github.com", "octocat", "hello");
//! let tags = forge.list_tags().await?;
//! ```

use std::sync::Arc;

use super::github::GitHubForge;
use super::traits::Forge;
use crate::auth::TokenProvider;

/// Create a forge bound to `owner/repo` at `api_base`.
pub fn create_forge(
    provider: Arc<dyn TokenProvider>,
    api_base: &str,
    owner: &str,
    repo: &str,
) -> Arc<dyn Forge> {
    Arc::new(GitHubForge::with_api_base(provider, owner, repo, api_base))
}
