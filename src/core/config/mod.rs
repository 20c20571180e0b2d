//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Tagsmith has two configuration scopes:
//! - **Global**: User-level settings (token sources, API base)
//! - **Repo**: Repository-level overrides (version file, default org)
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. Environment (`TAGSMITH_DEFAULT_ORG`)
//! 5. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$TAGSMITH_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/tagsmith/config.toml`
//! 3. `~/.tagsmith/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use tagsmith::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/repo/.git"))).unwrap();
//! let config = result.config;
//!
//! println!("Version file: {}", config.version_file());
//! println!("Workers: {}", config.workers());
//! ```

pub mod schema;

pub use schema::{AuthConfig, GlobalConfig, RepoConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::ident::IdentDefaults;

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "TAGSMITH_CONFIG";

/// Environment variable overriding `default_org`.
pub const DEFAULT_ORG_ENV: &str = "TAGSMITH_DEFAULT_ORG";

/// Version file used when none is configured.
pub const DEFAULT_VERSION_FILE: &str = "VERSION";

/// Transfer workers used when none are configured.
pub const DEFAULT_WORKERS: usize = 3;

/// GitHub API base used when none is configured.
pub const DEFAULT_API_BASE: &str = "https://api.github.com";

/// Token sources tried when no chain is configured.
pub const DEFAULT_AUTH_CHAIN: &[&str] = &["env:GITHUB_API_TOKEN", "env:TOKEN"];

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessor methods apply precedence rules. Repo config overrides global
/// config, and the environment overrides both.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if in a repo)
    pub repo: Option<RepoConfig>,
    /// `TAGSMITH_DEFAULT_ORG`, captured at load time
    env_default_org: Option<String>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `git_dir` is provided, also loads `<git_dir>/tagsmith/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or hold
    /// invalid values. Missing config files are not an error.
    pub fn load(git_dir: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let (global, global_path) = Self::load_global(&mut warnings)?;

        let (repo, repo_path) = match git_dir {
            Some(dir) => Self::load_repo(dir)?,
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        let env_default_org = std::env::var(DEFAULT_ORG_ENV)
            .ok()
            .filter(|org| !org.is_empty());

        Ok(ConfigLoadResult {
            config: Config {
                global,
                repo,
                env_default_org,
                global_path,
                repo_path,
            },
            warnings,
        })
    }

    fn load_global(
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<(GlobalConfig, Option<PathBuf>), ConfigError> {
        // 1. Check $TAGSMITH_CONFIG
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
            warnings.push(ConfigWarning {
                message: format!("{CONFIG_ENV} points at a missing file, ignoring it"),
                path,
            });
        }

        // 2. Check $XDG_CONFIG_HOME/tagsmith/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("tagsmith/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        // 3. Check ~/.tagsmith/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".tagsmith/config.toml");
            if path.exists() {
                let config = Self::read_config(&path)?;
                return Ok((config, Some(path)));
            }
        }

        Ok((GlobalConfig::default(), None))
    }

    fn load_repo(git_dir: &Path) -> Result<(Option<RepoConfig>, Option<PathBuf>), ConfigError> {
        let path = Self::repo_config_path(git_dir);
        if !path.exists() {
            return Ok((None, None));
        }
        let config = Self::read_config(&path)?;
        Ok((Some(config), Some(path)))
    }

    fn read_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Path of the repo config file for a git directory.
    pub fn repo_config_path(git_dir: &Path) -> PathBuf {
        git_dir.join("tagsmith/config.toml")
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Organization for identities that omit one.
    pub fn default_org(&self) -> Option<&str> {
        self.env_default_org
            .as_deref()
            .or_else(|| self.repo.as_ref().and_then(|r| r.default_org.as_deref()))
            .or(self.global.default_org.as_deref())
    }

    /// Version file name. Defaults to `VERSION`.
    pub fn version_file(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.version_file.as_deref())
            .or(self.global.version_file.as_deref())
            .unwrap_or(DEFAULT_VERSION_FILE)
    }

    /// Parallel transfer workers. Defaults to 3.
    pub fn workers(&self) -> usize {
        self.repo
            .as_ref()
            .and_then(|r| r.workers)
            .or(self.global.workers)
            .unwrap_or(DEFAULT_WORKERS)
    }

    /// GitHub API base URL without a trailing slash.
    pub fn api_base(&self) -> &str {
        self.global
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
    }

    /// Ordered token sources.
    pub fn auth_chain(&self) -> Vec<String> {
        match self.global.auth.as_ref().and_then(|a| a.chain.clone()) {
            Some(chain) => chain,
            None => DEFAULT_AUTH_CHAIN.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Whether to fall back to `git credential fill`. Defaults to `true`.
    pub fn credential_helper(&self) -> bool {
        self.global
            .auth
            .as_ref()
            .and_then(|a| a.credential_helper)
            .unwrap_or(true)
    }

    /// Defaults threaded into identity parsing.
    pub fn ident_defaults(&self) -> IdentDefaults {
        IdentDefaults {
            org: self.default_org().map(str::to_string),
        }
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_repo_config(dir: &TempDir, contents: &str) -> PathBuf {
        let config_dir = dir.path().join("tagsmith");
        fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join("config.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_without_files() {
        let config = Config::default();

        assert_eq!(config.version_file(), "VERSION");
        assert_eq!(config.workers(), 3);
        assert_eq!(config.api_base(), "https://api.github.com");
        assert_eq!(
            config.auth_chain(),
            vec!["env:GITHUB_API_TOKEN".to_string(), "env:TOKEN".to_string()]
        );
        assert!(config.credential_helper());
        assert!(config.ident_defaults().org.is_none());
    }

    #[test]
    fn load_repo_config() {
        let temp = TempDir::new().unwrap();
        let path = write_repo_config(
            &temp,
            r#"
            default_org = "acme"
            version_file = "RELEASE"
            workers = 8
            "#,
        );

        let (repo, loaded_from) = Config::load_repo(temp.path()).unwrap();
        let config = Config {
            repo,
            repo_path: loaded_from,
            ..Default::default()
        };

        assert_eq!(config.default_org(), Some("acme"));
        assert_eq!(config.version_file(), "RELEASE");
        assert_eq!(config.workers(), 8);
        assert_eq!(config.repo_config_loaded_from(), Some(path.as_path()));
    }

    #[test]
    fn missing_repo_config_is_not_an_error() {
        let temp = TempDir::new().unwrap();
        let (repo, path) = Config::load_repo(temp.path()).unwrap();
        assert!(repo.is_none());
        assert!(path.is_none());
    }

    #[test]
    fn unknown_fields_rejected() {
        let temp = TempDir::new().unwrap();
        write_repo_config(&temp, "unknown_field = true");

        let result = Config::load_repo(temp.path());
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn precedence_repo_overrides_global() {
        let config = Config {
            global: GlobalConfig {
                default_org: Some("global-org".into()),
                workers: Some(2),
                ..Default::default()
            },
            repo: Some(RepoConfig {
                default_org: Some("repo-org".into()),
                ..Default::default()
            }),
            ..Default::default()
        };

        assert_eq!(config.default_org(), Some("repo-org"));
        assert_eq!(config.workers(), 2);
    }

    #[test]
    fn env_org_overrides_files() {
        let config = Config {
            repo: Some(RepoConfig {
                default_org: Some("repo-org".into()),
                ..Default::default()
            }),
            env_default_org: Some("env-org".into()),
            ..Default::default()
        };

        assert_eq!(config.ident_defaults(), IdentDefaults::with_org("env-org"));
    }

    #[test]
    fn api_base_trailing_slash_trimmed() {
        let config = Config {
            global: GlobalConfig {
                api_base: Some("http://localhost:8080/".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert_eq!(config.api_base(), "http://localhost:8080");
    }
}
