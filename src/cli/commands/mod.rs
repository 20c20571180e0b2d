//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls into versioning or release code
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! Commands that talk to GitHub are async. Each builds a tokio runtime and
//! blocks on its async body, so the dispatcher itself stays synchronous.

mod assets;
mod bump;
mod completion;
mod fetch;
mod now;
mod publish;
mod resolve;
mod tags;
mod what;
mod who;

pub use completion::completion;

use std::io::BufRead;

use anyhow::Result;

use super::args::Command;
use super::{Context, UsageError};

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Assets { long, idents } => assets::assets(ctx, &read_args(idents)?, long),
        Command::Bump {
            increment,
            latest,
            version_file,
            write,
            no_log,
        } => bump::bump(
            ctx,
            increment,
            latest.as_deref(),
            version_file.as_deref(),
            write,
            no_log,
        ),
        Command::Cat { idents } => fetch::cat(ctx, &read_args(idents)?),
        Command::Get {
            dir,
            workers,
            idents,
        } => fetch::get(ctx, &read_args(idents)?, &dir, workers),
        Command::Now { version_file } => now::now(ctx, version_file.as_deref()),
        Command::Push {
            version_file,
            draft,
            full_paths,
            workers,
            ident,
            files,
        } => publish::push(
            ctx,
            &ident,
            files,
            publish::Options {
                version_file,
                draft,
                prerelease: false,
                full_paths,
                workers,
            },
        ),
        Command::Release {
            name,
            body,
            sha,
            draft,
            full_paths,
            prerelease,
            workers,
            ident,
            files,
        } => publish::release(
            ctx,
            &ident,
            files,
            name,
            &body,
            sha.as_deref(),
            publish::Options {
                version_file: None,
                draft,
                prerelease,
                full_paths,
                workers,
            },
        ),
        Command::Resolve { web, idents } => resolve::resolve(ctx, &read_args(idents)?, web),
        Command::Tags { long, all, idents } => tags::tags(ctx, &read_args(idents)?, long, all),
        Command::What {
            version_file,
            all,
            paths,
        } => what::what(ctx, version_file.as_deref(), &paths, all),
        Command::Who => who::who(ctx),
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Expand `-` arguments into lines read from standard input.
pub(crate) fn read_args(args: Vec<String>) -> Result<Vec<String>> {
    let stdin = std::io::stdin();
    let expanded = expand_args(args, stdin.lock())?;
    if expanded.is_empty() {
        return Err(UsageError("no arguments given".into()).into());
    }
    Ok(expanded)
}

/// Replace a single `-` with the trimmed lines of `input`.
fn expand_args(args: Vec<String>, input: impl BufRead) -> Result<Vec<String>> {
    let mut input = Some(input);
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        if arg != "-" {
            out.push(arg.trim().to_string());
            continue;
        }
        let Some(reader) = input.take() else {
            return Err(UsageError("-: cannot read stdin more than once".into()).into());
        };
        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            if !line.is_empty() {
                out.push(line.to_string());
            }
        }
    }
    Ok(out)
}

/// Build a runtime for an async command body.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Runtime::new()?)
}
