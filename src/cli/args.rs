//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Run as if in that directory
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output
//!
//! # Identities
//!
//! Remote commands take identities of the form
//! `[org/]repo[@tag][:asset][:dst]`. An argument of `-` reads further
//! arguments from standard input, one per line.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::core::version::Increment;

/// tagsmith - version-file driven tags, changelogs and GitHub releases
#[derive(Parser, Debug)]
#[command(name = "tagsmith")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Run as if tagsmith was started in this directory
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List release assets
    #[command(
        name = "assets",
        long_about = "List the assets of one or more releases.\n\n\
            Assets are listed three per line. With -l, one asset per line with its \
            content type, size and label. An asset part in the identity filters \
            the list by glob. Headings are printed when more than one identity \
            is given.",
        after_help = "\
EXAMPLES:
    tagsmith assets acme/tool
    tagsmith assets -l acme/tool@v1.2.0:'*.tar.gz'"
    )]
    Assets {
        /// One asset per line, with description
        #[arg(short = 'l')]
        long: bool,

        /// Release identities
        #[arg(required = true, value_name = "IDENT")]
        idents: Vec<String>,
    },

    /// Print the next version and its changelog
    #[command(
        name = "bump",
        long_about = "Compute the next version.\n\n\
            The current version is read from the version file at HEAD. The \
            changelog lists every commit message since the previous release \
            commit. With --latest, the version comes from the latest release of \
            a remote repository instead.\n\n\
            With -w the result is written to the version file, in front of its \
            committed contents.",
        after_help = "\
EXAMPLES:
    # Preview the next minor release
    tagsmith bump minor

    # Write it, then commit it as the release commit
    tagsmith bump -w patch && git commit -am release"
    )]
    Bump {
        /// Component to increment
        #[arg(value_name = "major|minor|patch")]
        increment: Increment,

        /// Bump from the latest release of this repository
        #[arg(long, value_name = "IDENT")]
        latest: Option<String>,

        /// Path to the version file in the repository
        #[arg(short = 'v', value_name = "FILE")]
        version_file: Option<String>,

        /// Write to the version file instead of standard output
        #[arg(short = 'w')]
        write: bool,

        /// Print the version only, not the log
        #[arg(short = 'n')]
        no_log: bool,
    },

    /// Write release assets to standard output
    #[command(name = "cat")]
    Cat {
        /// Asset identities
        #[arg(required = true, value_name = "IDENT:ASSET")]
        idents: Vec<String>,
    },

    /// Download release assets
    #[command(
        name = "get",
        after_help = "\
EXAMPLES:
    tagsmith get acme/tool:'tool-*-linux.tar.gz'
    tagsmith get -d bin acme/tool@v1.2.0:tool.exe:tool"
    )]
    Get {
        /// Output directory
        #[arg(short = 'd', value_name = "DIR", default_value = ".")]
        dir: PathBuf,

        /// Number of download workers
        #[arg(short = 'w', value_name = "N")]
        workers: Option<usize>,

        /// Asset identities
        #[arg(required = true, value_name = "IDENT:ASSET[:DST]")]
        idents: Vec<String>,
    },

    /// Succeed only if HEAD is a release commit
    #[command(name = "now")]
    Now {
        /// Path to the version file in the repository
        #[arg(short = 'v', value_name = "FILE")]
        version_file: Option<String>,
    },

    /// Release HEAD if it is a release commit
    #[command(
        name = "push",
        long_about = "Publish a release for the release commit at HEAD.\n\n\
            The tag is the version at HEAD, the body is the lines the release \
            commit added to the version file. When HEAD is not a release commit \
            nothing happens. Every step is skipped when already done, so push \
            can be re-run after a failure."
    )]
    Push {
        /// Path to the version file in the repository
        #[arg(short = 'v', value_name = "FILE")]
        version_file: Option<String>,

        /// Leave as draft; do not publish
        #[arg(short = 'd')]
        draft: bool,

        /// Use the full file path for asset names
        #[arg(short = 'f')]
        full_paths: bool,

        /// Number of upload workers
        #[arg(short = 'w', value_name = "N")]
        workers: Option<usize>,

        /// Repository to release to
        #[arg(value_name = "[ORG/]REPO")]
        ident: String,

        /// Files to attach
        files: Vec<PathBuf>,
    },

    /// Release a tag
    #[command(
        name = "release",
        long_about = "Publish a release for a tag.\n\n\
            The commit is taken from --sha, else from the local tag, else HEAD. \
            An existing tag must point at that commit. Existing releases and \
            assets are left alone.",
        after_help = "\
EXAMPLES:
    tagsmith release --body @NOTES.md acme/tool@v1.2.0 dist/*
    git log -1 --format=%b | tagsmith release --body - --pre acme/tool@v2.0.0-rc1"
    )]
    Release {
        /// Release name (defaults to the tag)
        #[arg(long)]
        name: Option<String>,

        /// Release body, `@file` to read a file, `-` to read standard input
        #[arg(long, default_value = "")]
        body: String,

        /// Commit to release
        #[arg(long)]
        sha: Option<String>,

        /// Leave as draft; do not publish
        #[arg(short = 'd')]
        draft: bool,

        /// Use the full file path for asset names
        #[arg(short = 'f')]
        full_paths: bool,

        /// Mark as a prerelease
        #[arg(long = "pre")]
        prerelease: bool,

        /// Number of upload workers
        #[arg(short = 'w', value_name = "N")]
        workers: Option<usize>,

        /// Repository and tag
        #[arg(value_name = "[ORG/]REPO@TAG")]
        ident: String,

        /// Files to attach
        files: Vec<PathBuf>,
    },

    /// Resolve floating tags to release tags
    #[command(name = "resolve")]
    Resolve {
        /// Print web URLs instead
        #[arg(short = 'w')]
        web: bool,

        /// Release identities
        #[arg(required = true, value_name = "IDENT")]
        idents: Vec<String>,
    },

    /// List release tags
    #[command(
        name = "tags",
        long_about = "List the tags of one or more repositories.\n\n\
            By default only tags of full releases are listed, five per line. \
            With -a, prereleases, drafts and tags without a release are listed \
            too. With -l, one tag per line with its release details."
    )]
    Tags {
        /// One tag per line, with description
        #[arg(short = 'l')]
        long: bool,

        /// Include drafts, prereleases and plain tags
        #[arg(short = 'a')]
        all: bool,

        /// Repositories
        #[arg(required = true, value_name = "[ORG/]REPO")]
        idents: Vec<String>,
    },

    /// List changed paths or check whether paths changed
    #[command(
        name = "what",
        long_about = "List the paths changed since the previous release commit.\n\n\
            With path arguments, succeed if any of them changed. With --all, \
            succeed only if every one of them changed.",
        after_help = "\
EXAMPLES:
    # Skip a deploy step when nothing under web/ moved
    tagsmith what web && ./deploy-web.sh"
    )]
    What {
        /// Path to the version file in the repository
        #[arg(short = 'v', value_name = "FILE")]
        version_file: Option<String>,

        /// Require every path to have changed
        #[arg(long)]
        all: bool,

        /// Paths to check
        paths: Vec<String>,
    },

    /// Print the login of the token owner
    #[command(name = "who")]
    Who,

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        after_help = "\
EXAMPLES:
    tagsmith completion bash > ~/.local/share/bash-completion/completions/tagsmith
    tagsmith completion zsh > ~/.zfunc/_tagsmith"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completion generation.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
