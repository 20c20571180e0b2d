//! cli::commands::bump
//!
//! Compute the next version and its changelog entry.
//!
//! # Design
//!
//! Locally, the version and messages come from history: the version at
//! HEAD, then every message back to the previous release commit. With
//! `--latest` they come from the newest remote release and the log is a
//! single "bumped from" line.
//!
//! With `-w` the entry is written in front of the committed contents of
//! the version file.

use anyhow::{Context as _, Result};

use super::runtime;
use crate::cli::{Context, UsageError};
use crate::core::version::{Increment, Version};
use crate::release::query::resolve_release;
use crate::versioning::changelog::Entry;

/// Run the bump command.
pub fn bump(
    ctx: &Context,
    increment: Increment,
    latest: Option<&str>,
    version_file: Option<&str>,
    write: bool,
    no_log: bool,
) -> Result<()> {
    let (current, messages, last) = match latest {
        None => local_state(ctx, version_file, no_log)?,
        Some(arg) => {
            let (version, messages) = remote_state(ctx, arg, no_log)?;
            (version, messages, String::new())
        }
    };

    let next = current.bump(increment);
    let entry = Entry::new(next, messages);
    let text = if no_log {
        format!("{}\n", entry.version)
    } else if write {
        entry.render_onto(&last)
    } else {
        entry.render()
    };

    if !write {
        print!("{}", text);
        return Ok(());
    }

    let versioner = ctx.versioner(version_file)?;
    let path = versioner.history().work_dir()?.join(versioner.path());
    std::fs::write(&path, text)
        .with_context(|| format!("write version file {}", path.display()))?;
    Ok(())
}

/// Version, messages and committed file contents from the local history.
fn local_state(
    ctx: &Context,
    version_file: Option<&str>,
    no_log: bool,
) -> Result<(Version, Vec<String>, String)> {
    let versioner = ctx.versioner(version_file)?;
    let version = versioner.head_version().context("get latest version")?;
    if no_log {
        return Ok((version, Vec::new(), String::new()));
    }
    let messages = versioner.log_head().context("calculate log")?;
    let last = versioner
        .last_log()
        .context("get committed version file contents")?;
    Ok((version, messages, last))
}

/// Version of the latest release of `arg`, and the matching log line.
fn remote_state(ctx: &Context, arg: &str, no_log: bool) -> Result<(Version, Vec<String>)> {
    let ident = ctx
        .ident(arg)
        .map_err(|e| UsageError(format!("{:#}", e)))?;

    let provider = ctx.token_provider()?;
    let forge = ctx.forge_for(&provider, &ident);
    let release = runtime()?.block_on(resolve_release(forge.as_ref(), &ident.tag))?;
    let version = Version::parse(&release.tag_name)?;

    if no_log {
        return Ok((version, Vec::new()));
    }
    let from = ident.with_tag(version.to_string());
    Ok((version, vec![format!("bumped from {}", from)]))
}
