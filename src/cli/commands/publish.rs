//! cli::commands::publish
//!
//! `push` and `release`: build a [`ReleaseSpec`] and run it.
//!
//! # Design
//!
//! `push` derives everything from the release commit at HEAD: the tag is
//! its version, the body the lines it added to the version file. `release`
//! takes the tag from the command line and looks for the commit in the
//! local tag, falling back to HEAD.

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};

use super::runtime;
use crate::cli::{Context, UsageError};
use crate::core::ident::{Ident, DEFAULT_TAG};
use crate::core::types::Oid;
use crate::git::History;
use crate::release::{ReleaseError, ReleaseSpec};
use crate::ui::output;

/// Flags shared by `push` and `release`.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub version_file: Option<String>,
    pub draft: bool,
    pub prerelease: bool,
    pub full_paths: bool,
    pub workers: Option<usize>,
}

/// Run the push command.
pub fn push(ctx: &Context, arg: &str, files: Vec<PathBuf>, opts: Options) -> Result<()> {
    let ident = repo_ident(ctx, arg)?;

    let versioner = ctx.versioner(opts.version_file.as_deref())?;
    if !versioner.is_release().context("check release commit")? {
        output::progress("push: nop, head is not a release commit", ctx.verbosity);
        return Ok(());
    }

    let version = versioner.head_version().context("get version of head")?;
    let head = versioner.history().head().context("get head")?;
    let changes = versioner.log_diff().context("get changes")?;

    let tag = version.to_string();
    let spec = ReleaseSpec {
        ident: ident.with_tag(tag.clone()),
        sha: head.oid,
        name: tag,
        body: changes.join("\n"),
        draft: opts.draft,
        prerelease: opts.prerelease,
        uploads: files,
        keep_paths: opts.full_paths,
        workers: ctx.workers(opts.workers),
    };
    run(ctx, spec)
}

/// Run the release command.
pub fn release(
    ctx: &Context,
    arg: &str,
    files: Vec<PathBuf>,
    name: Option<String>,
    body: &str,
    sha: Option<&str>,
    opts: Options,
) -> Result<()> {
    let ident = ctx
        .ident(arg)
        .map_err(|e| UsageError(format!("{:#}", e)))?;
    if ident.is_floating() || ident.asset.is_some() {
        return Err(UsageError(format!(
            "failed to parse {}, does not match [org/]repo@tag",
            arg
        ))
        .into());
    }

    let body = read_body(body)?;
    let sha = match sha {
        Some(sha) => Oid::new(sha).with_context(|| format!("--sha {}", sha))?,
        None => local_target(ctx, &ident.tag)?,
    };

    let spec = ReleaseSpec {
        name: name.unwrap_or_else(|| ident.tag.clone()),
        ident,
        sha,
        body,
        draft: opts.draft,
        prerelease: opts.prerelease,
        uploads: files,
        keep_paths: opts.full_paths,
        workers: ctx.workers(opts.workers),
    };
    run(ctx, spec)
}

/// Parse a bare `[org/]repo` identity.
fn repo_ident(ctx: &Context, arg: &str) -> Result<Ident> {
    let ident = ctx
        .ident(arg)
        .map_err(|e| UsageError(format!("{:#}", e)))?;
    if ident.tag != DEFAULT_TAG || ident.asset.is_some() {
        return Err(UsageError(format!(
            "failed to parse {}, does not match [org/]repo",
            arg
        ))
        .into());
    }
    Ok(ident)
}

/// Release body from a literal, `@file`, or `-` for standard input.
fn read_body(body: &str) -> Result<String> {
    if body == "-" {
        return std::io::read_to_string(std::io::stdin()).context("read body from stdin");
    }
    match body.strip_prefix('@') {
        Some(file) => {
            std::fs::read_to_string(file).with_context(|| format!("read body {}", file))
        }
        None => Ok(body.to_string()),
    }
}

/// Commit the local tag points at, or HEAD when there is no such tag.
fn local_target(ctx: &Context, tag: &str) -> Result<Oid> {
    let git = ctx.git()?;
    if let Some(oid) = git.resolve_tag(tag).context("local repository")? {
        output::debug(format!("{} is local tag {}", oid, tag), ctx.verbosity);
        return Ok(oid);
    }
    Ok(git.head().context("get local head")?.oid)
}

fn run(ctx: &Context, spec: ReleaseSpec) -> Result<()> {
    output::debug(
        format!("release {} at {}", spec.ident, spec.sha),
        ctx.verbosity,
    );

    let provider = ctx.token_provider()?;
    let forge = ctx.forge_for(&provider, &spec.ident);
    match runtime()?.block_on(spec.run(forge, ctx.verbosity)) {
        Ok(_) => Ok(()),
        Err(ReleaseError::UploadsFailed(errors)) => {
            for err in &errors {
                output::error(err);
            }
            bail!("uploads failed");
        }
        Err(e) => Err(e.into()),
    }
}
