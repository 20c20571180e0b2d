//! cli
//!
//! Command-line interface layer for tagsmith.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load configuration and build the [`Context`] shared by all handlers
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. Handlers turn arguments into calls on
//! [`crate::versioning`] for local history and [`crate::release`] for remote
//! state, then format the results.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use thiserror::Error;

use crate::auth::{credential_host, ChainTokenProvider, TokenProvider};
use crate::core::config::Config;
use crate::core::ident::Ident;
use crate::forge::{create_forge, Forge};
use crate::git::Git;
use crate::ui::output::{self, Verbosity};
use crate::versioning::Versioner;

/// An invocation error; the binary exits with status 2.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct UsageError(pub String);

/// Execution context for commands.
///
/// Built once from global flags and configuration.
#[derive(Debug, Clone)]
pub struct Context {
    /// Directory commands run in
    pub cwd: PathBuf,
    pub verbosity: Verbosity,
    pub config: Config,
}

impl Context {
    /// Build a context, loading configuration for the repository at `cwd`
    /// if there is one.
    ///
    /// Like `git -C`, an explicit `cwd` becomes the process working
    /// directory, so relative file arguments resolve against it.
    pub fn new(cwd: Option<PathBuf>, verbosity: Verbosity) -> Result<Self> {
        if let Some(dir) = &cwd {
            std::env::set_current_dir(dir)
                .with_context(|| format!("cannot change to {}", dir.display()))?;
        }
        let cwd = std::env::current_dir().context("current directory")?;

        let git_dir = Git::open(&cwd).ok().map(|git| git.git_dir().to_path_buf());
        let loaded = Config::load(git_dir.as_deref()).context("load configuration")?;
        for warning in &loaded.warnings {
            output::warn(
                format!("{}: {}", warning.path.display(), warning.message),
                verbosity,
            );
        }
        if let Some(path) = loaded.config.global_config_loaded_from() {
            output::debug(format!("config: {}", path.display()), verbosity);
        }
        if let Some(path) = loaded.config.repo_config_loaded_from() {
            output::debug(format!("config: {}", path.display()), verbosity);
        }

        Ok(Self {
            cwd,
            verbosity,
            config: loaded.config,
        })
    }

    /// Open the local repository.
    pub fn git(&self) -> Result<Git> {
        Git::open(&self.cwd).context("open local repository")
    }

    /// A versioner for the local repository.
    ///
    /// `version_file` overrides the configured version file path.
    pub fn versioner(&self, version_file: Option<&str>) -> Result<Versioner<Git>> {
        let path = version_file.unwrap_or_else(|| self.config.version_file());
        output::debug(format!("version file: {}", path), self.verbosity);
        Ok(Versioner::new(self.git()?, path))
    }

    /// Parse an identity with the configured defaults.
    pub fn ident(&self, arg: &str) -> Result<Ident> {
        Ident::parse(arg, &self.config.ident_defaults())
            .with_context(|| format!("failed to parse {}", arg))
    }

    /// Worker count from a flag, else configuration.
    pub fn workers(&self, flag: Option<usize>) -> usize {
        flag.unwrap_or_else(|| self.config.workers()).max(1)
    }

    /// Token provider from the configured auth chain.
    ///
    /// Build it once per command so the token is resolved at most once.
    pub fn token_provider(&self) -> Result<Arc<dyn TokenProvider>> {
        let api_base = self.config.api_base();
        let provider = ChainTokenProvider::from_chain(
            &self.config.auth_chain(),
            self.config.credential_helper(),
            credential_host(api_base),
        )
        .context("auth configuration")?;
        output::debug(format!("{:?}", provider), self.verbosity);
        Ok(Arc::new(provider))
    }

    /// A forge bound to the repository `ident` names.
    pub fn forge_for(&self, provider: &Arc<dyn TokenProvider>, ident: &Ident) -> Arc<dyn Forge> {
        create_forge(
            Arc::clone(provider),
            self.config.api_base(),
            &ident.org,
            &ident.repo,
        )
    }
}

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);

    // Completions need neither a repository nor configuration
    if let args::Command::Completion { shell } = cli.command {
        return commands::completion(shell);
    }

    let ctx = Context::new(cli.cwd, verbosity)?;
    commands::dispatch(cli.command, &ctx)
}
