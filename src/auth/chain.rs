//! auth::chain
//!
//! ChainTokenProvider - TokenProvider that walks a configured list of token
//! sources.
//!
//! # Sources
//!
//! The chain is an ordered list of `env:NAME` entries. The first variable
//! that is set and non-empty wins. When every entry comes up empty and the
//! credential helper is enabled, `git credential fill` is asked for a
//! password for `https://<host>`, with terminal prompts disabled.
//!
//! The resolved token is cached for the lifetime of the provider, so the
//! chain runs at most once per process.
//!
//! # Example
//!
//! ```ignore
//! use tagsmith::auth::{ChainTokenProvider, TokenProvider};
//!
//! let provider = ChainTokenProvider::from_chain(
//!     &["env:GITHUB_API_TOKEN".to_string()],
//!     true,
//!     "github.com",
//! )?;
//! let token = provider.bearer_token().await?;
//! ```

use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::OnceCell;

use super::errors::AuthError;
use super::TokenProvider;

/// One entry in the auth chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenSource {
    /// Read an environment variable.
    Env(String),
}

impl TokenSource {
    /// Parse a `kind:value` chain entry.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidSource`] for anything other than `env:NAME`.
    pub fn parse(entry: &str) -> Result<Self, AuthError> {
        match entry.split_once(':') {
            Some(("env", name)) if !name.is_empty() && !name.contains(':') => {
                Ok(TokenSource::Env(name.to_string()))
            }
            _ => Err(AuthError::InvalidSource(entry.to_string())),
        }
    }

    fn lookup(&self) -> Option<String> {
        match self {
            TokenSource::Env(name) => std::env::var(name).ok().filter(|v| !v.is_empty()),
        }
    }
}

impl std::fmt::Display for TokenSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenSource::Env(name) => write!(f, "env:{}", name),
        }
    }
}

/// Token provider backed by an ordered chain of sources.
pub struct ChainTokenProvider {
    sources: Vec<TokenSource>,
    credential_helper: bool,
    host: String,
    token: OnceCell<String>,
}

// Custom Debug to avoid exposing the cached token
impl std::fmt::Debug for ChainTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainTokenProvider")
            .field("sources", &self.sources)
            .field("credential_helper", &self.credential_helper)
            .field("host", &self.host)
            .field("token", &self.token.get().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ChainTokenProvider {
    /// Build a provider from parsed sources.
    pub fn new(sources: Vec<TokenSource>, credential_helper: bool, host: impl Into<String>) -> Self {
        Self {
            sources,
            credential_helper,
            host: host.into(),
            token: OnceCell::new(),
        }
    }

    /// Build a provider from raw `env:NAME` chain entries.
    ///
    /// # Errors
    ///
    /// [`AuthError::InvalidSource`] on the first malformed entry.
    pub fn from_chain(
        chain: &[String],
        credential_helper: bool,
        host: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let sources = chain
            .iter()
            .map(|entry| TokenSource::parse(entry))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(sources, credential_helper, host))
    }

    fn chain_string(&self) -> String {
        self.sources
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    async fn resolve(&self) -> Result<String, AuthError> {
        if let Some(token) = self.sources.iter().find_map(TokenSource::lookup) {
            return Ok(token);
        }
        if self.credential_helper {
            if let Some(token) = credential_fill(&self.host).await? {
                return Ok(token);
            }
        }
        Err(AuthError::NotAuthenticated {
            chain: self.chain_string(),
            host: self.host.clone(),
        })
    }
}

#[async_trait::async_trait]
impl TokenProvider for ChainTokenProvider {
    async fn bearer_token(&self) -> Result<String, AuthError> {
        self.token
            .get_or_try_init(|| self.resolve())
            .await
            .cloned()
    }

    fn is_authenticated(&self) -> bool {
        self.token.get().is_some() || self.sources.iter().any(|s| s.lookup().is_some())
    }

    fn host(&self) -> &str {
        &self.host
    }
}

/// Ask `git credential fill` for the password stored for `https://<host>`.
///
/// A helper that has nothing stored makes git exit non-zero; that is a miss,
/// not an error.
async fn credential_fill(host: &str) -> Result<Option<String>, AuthError> {
    let mut child = Command::new("git")
        .args(["credential", "fill"])
        .env("GIT_TERMINAL_PROMPT", "0")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        let request = format!("protocol=https\nhost={}\n\n", host);
        stdin.write_all(request.as_bytes()).await?;
    }

    let output = child.wait_with_output().await?;
    if !output.status.success() {
        return Ok(None);
    }
    Ok(parse_password(&String::from_utf8_lossy(&output.stdout)))
}

/// Extract `password=` from credential helper output.
fn parse_password(output: &str) -> Option<String> {
    output
        .lines()
        .filter_map(|line| line.split_once('='))
        .find(|(key, _)| *key == "password")
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    mod sources {
        use super::*;

        #[test]
        fn parse_env() {
            assert_eq!(
                TokenSource::parse("env:GITHUB_API_TOKEN").unwrap(),
                TokenSource::Env("GITHUB_API_TOKEN".into())
            );
        }

        #[test]
        fn rejects_unknown_kind() {
            assert!(matches!(
                TokenSource::parse("ssm:/ci/token"),
                Err(AuthError::InvalidSource(_))
            ));
        }

        #[test]
        fn rejects_malformed() {
            for entry in ["env", "env:", "GITHUB_TOKEN", "env:a:b"] {
                assert!(TokenSource::parse(entry).is_err(), "{entry}");
            }
        }

        #[test]
        fn display_round_trips_entry() {
            assert_eq!(TokenSource::Env("TOKEN".into()).to_string(), "env:TOKEN");
        }
    }

    mod provider {
        use super::*;

        #[tokio::test]
        async fn first_set_variable_wins() {
            std::env::set_var("TAGSMITH_TEST_CHAIN_B", "second");
            std::env::set_var("TAGSMITH_TEST_CHAIN_C", "third");
            let provider = ChainTokenProvider::from_chain(
                &[
                    "env:TAGSMITH_TEST_CHAIN_A".into(),
                    "env:TAGSMITH_TEST_CHAIN_B".into(),
                    "env:TAGSMITH_TEST_CHAIN_C".into(),
                ],
                false,
                "github.com",
            )
            .unwrap();

            assert!(provider.is_authenticated());
            assert_eq!(provider.bearer_token().await.unwrap(), "second");
        }

        #[tokio::test]
        async fn empty_variable_is_skipped() {
            std::env::set_var("TAGSMITH_TEST_EMPTY_A", "");
            std::env::set_var("TAGSMITH_TEST_EMPTY_B", "tok");
            let provider = ChainTokenProvider::from_chain(
                &[
                    "env:TAGSMITH_TEST_EMPTY_A".into(),
                    "env:TAGSMITH_TEST_EMPTY_B".into(),
                ],
                false,
                "github.com",
            )
            .unwrap();

            assert_eq!(provider.bearer_token().await.unwrap(), "tok");
        }

        #[tokio::test]
        async fn exhausted_chain_reports_sources() {
            let provider = ChainTokenProvider::from_chain(
                &["env:TAGSMITH_TEST_UNSET_TOKEN".into()],
                false,
                "github.com",
            )
            .unwrap();

            assert!(!provider.is_authenticated());
            let err = provider.bearer_token().await.unwrap_err();
            assert!(err.needs_token());
            assert!(err.to_string().contains("env:TAGSMITH_TEST_UNSET_TOKEN"));
        }

        #[tokio::test]
        async fn debug_does_not_expose_token() {
            std::env::set_var("TAGSMITH_TEST_SECRET", "ghp_supersecret");
            let provider = ChainTokenProvider::from_chain(
                &["env:TAGSMITH_TEST_SECRET".into()],
                false,
                "github.com",
            )
            .unwrap();
            provider.bearer_token().await.unwrap();

            let debug = format!("{:?}", provider);
            assert!(!debug.contains("ghp_supersecret"));
            assert!(debug.contains("REDACTED"));
        }
    }

    mod credential_output {
        use super::*;

        #[test]
        fn finds_password_line() {
            let out = "protocol=https\nhost=github.com\nusername=x\npassword=tok\n";
            assert_eq!(parse_password(out), Some("tok".into()));
        }

        #[test]
        fn missing_or_empty_password() {
            assert_eq!(parse_password("protocol=https\n"), None);
            assert_eq!(parse_password("password=\n"), None);
        }
    }
}
