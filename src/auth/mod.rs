//! auth - GitHub token acquisition
//!
//! # Architecture
//!
//! Forge adapters never read tokens themselves. They hold a
//! [`TokenProvider`] and ask it for a bearer token per request. The one
//! production provider is [`ChainTokenProvider`], which walks the configured
//! `env:NAME` chain and falls back to the git credential helper.
//!
//! # Security
//!
//! Tokens never appear in logs (including --debug), error messages or
//! debug output. Types holding a token implement a redacting `Debug`.

mod chain;
mod errors;

pub use chain::{ChainTokenProvider, TokenSource};
pub use errors::AuthError;

/// Trait for providing bearer tokens to forge adapters.
///
/// # Example
///
/// ```ignore
/// use tagsmith::auth::TokenProvider;
///
/// async fn make_api_call(provider: &dyn TokenProvider) -> Result<()> {
///     let token = provider.bearer_token().await?;
///     // Use token in Authorization header
///     // ...
/// }
/// ```
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns a bearer token.
    ///
    /// # Errors
    ///
    /// - [`AuthError::NotAuthenticated`] if no source yields a token
    /// - [`AuthError::CredentialHelper`] if the helper cannot be run
    async fn bearer_token(&self) -> Result<String, AuthError>;

    /// Check if a token is available without running external helpers.
    fn is_authenticated(&self) -> bool;

    /// Get the host this provider authenticates for.
    fn host(&self) -> &str;
}

/// Host name credentials are looked up for, derived from an API base URL.
///
/// `https://api.github.com` maps to `github.com`; an enterprise base such as
/// `https://ghe.example.com/api/v3` maps to its own host.
pub fn credential_host(api_base: &str) -> String {
    let host = reqwest::Url::parse(api_base)
        .ok()
        .and_then(|url| url.host_str().map(str::to_string))
        .unwrap_or_else(|| "github.com".to_string());
    match host.strip_prefix("api.") {
        Some(rest) if rest == "github.com" => rest.to_string(),
        _ => host,
    }
}
