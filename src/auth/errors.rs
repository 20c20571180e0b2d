//! auth::errors
//!
//! Authentication error types.
//!
//! # Design
//!
//! Error messages never contain tokens. Variants carry source names and
//! hosts, which is enough to tell the user what to configure.
//!
//! # Example
//!
//! ```
//! use tagsmith::auth::AuthError;
//!
//! let err = AuthError::NotAuthenticated {
//!     chain: "env:GITHUB_API_TOKEN".to_string(),
//!     host: "github.com".to_string(),
//! };
//! assert!(err.to_string().contains("env:GITHUB_API_TOKEN"));
//! ```

use thiserror::Error;

/// Errors from token acquisition.
///
/// # Security
///
/// Error messages intentionally do not include token values.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Every source in the chain came up empty.
    #[error("auth chain failed: {chain} (no token found for {host})")]
    NotAuthenticated {
        /// The chain that was tried, as configured
        chain: String,
        /// Host the token was wanted for
        host: String,
    },

    /// A chain entry is not `env:NAME`.
    #[error("invalid auth chain value: {0}")]
    InvalidSource(String),

    /// The git credential helper could not be run.
    #[error("credential helper failed: {0}")]
    CredentialHelper(String),

    /// Internal error (should not happen).
    #[error("internal auth error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Whether configuring a token would resolve this error.
    pub fn needs_token(&self) -> bool {
        matches!(self, AuthError::NotAuthenticated { .. })
    }
}

impl From<std::io::Error> for AuthError {
    fn from(err: std::io::Error) -> Self {
        AuthError::CredentialHelper(err.to_string())
    }
}
