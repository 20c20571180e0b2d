//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$TAGSMITH_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/tagsmith/config.toml`
//! 3. `~/.tagsmith/config.toml`
//!
//! # Repo Config
//!
//! Located at `<git dir>/tagsmith/config.toml`.
//!
//! # Validation
//!
//! Config values are validated after parsing: worker counts must be
//! positive and auth sources must name a supported kind.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// default_org = "acme"
/// workers = 4
/// api_base = "https://github.example.com/api/v3"
///
/// [auth]
/// chain = ["env:GITHUB_API_TOKEN", "env:TOKEN"]
/// credential_helper = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Organization for identities that omit one
    pub default_org: Option<String>,

    /// Version file name, relative to the repository root
    pub version_file: Option<String>,

    /// Parallel transfer workers
    pub workers: Option<usize>,

    /// GitHub API base URL
    pub api_base: Option<String>,

    /// Token sources
    pub auth: Option<AuthConfig>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_common(
            self.default_org.as_deref(),
            self.version_file.as_deref(),
            self.workers,
        )?;

        if let Some(base) = &self.api_base {
            if !base.starts_with("http://") && !base.starts_with("https://") {
                return Err(ConfigError::InvalidValue(format!(
                    "api_base must be an http(s) URL, got '{base}'"
                )));
            }
        }

        if let Some(auth) = &self.auth {
            auth.validate()?;
        }

        Ok(())
    }
}

/// Repository configuration.
///
/// Tokens are user scoped, so there is no `[auth]` table here.
///
/// # Example
///
/// ```toml
/// default_org = "acme"
/// version_file = "VERSION.txt"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Organization for identities that omit one
    pub default_org: Option<String>,

    /// Version file name, relative to the repository root
    pub version_file: Option<String>,

    /// Parallel transfer workers
    pub workers: Option<usize>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_common(
            self.default_org.as_deref(),
            self.version_file.as_deref(),
            self.workers,
        )
    }
}

fn validate_common(
    default_org: Option<&str>,
    version_file: Option<&str>,
    workers: Option<usize>,
) -> Result<(), ConfigError> {
    if default_org.is_some_and(str::is_empty) {
        return Err(ConfigError::InvalidValue(
            "default_org cannot be empty".to_string(),
        ));
    }
    if let Some(file) = version_file {
        if file.is_empty() || file.starts_with('/') {
            return Err(ConfigError::InvalidValue(format!(
                "version_file must be a relative path, got '{file}'"
            )));
        }
    }
    if workers == Some(0) {
        return Err(ConfigError::InvalidValue(
            "workers must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Token source configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// Ordered sources, each `env:NAME`
    pub chain: Option<Vec<String>>,

    /// Ask `git credential fill` when the chain is exhausted
    pub credential_helper: Option<bool>,
}

impl AuthConfig {
    /// Supported source kinds.
    pub const VALID_SOURCES: &'static [&'static str] = &["env"];

    /// Validate the auth configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for source in self.chain.iter().flatten() {
            let (kind, name) = source.split_once(':').unwrap_or((source.as_str(), ""));
            if !Self::VALID_SOURCES.contains(&kind) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid auth source '{}', must be one of: {}",
                    source,
                    Self::VALID_SOURCES
                        .iter()
                        .map(|k| format!("{k}:NAME"))
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            }
            if name.is_empty() {
                return Err(ConfigError::InvalidValue(format!(
                    "auth source '{source}' is missing a name"
                )));
            }
        }
        Ok(())
    }
}
