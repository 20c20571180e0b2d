//! cli::commands::fetch
//!
//! Download release assets: `get` to a directory, `cat` to standard output.
//!
//! # Design
//!
//! Every identity is resolved to its matching assets first, so a bad
//! identity fails before anything is downloaded. `cat` uses one worker so
//! assets reach standard output whole and in order.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Result};

use super::runtime;
use crate::cli::Context;
use crate::core::ident::Ident;
use crate::forge::Forge;
use crate::release::query::glob_assets;
use crate::release::transfer::{DownloadTarget, Job, TransferError, TransferPool};
use crate::ui::output::{self, Verbosity};

/// Run the cat command.
pub fn cat(ctx: &Context, args: &[String]) -> Result<()> {
    fetch(ctx, args, DownloadTarget::Stdout, 1)
}

/// Run the get command.
pub fn get(ctx: &Context, args: &[String], dir: &Path, workers: Option<usize>) -> Result<()> {
    let target = DownloadTarget::Dir(dir.to_path_buf());
    fetch(ctx, args, target, ctx.workers(workers))
}

fn fetch(ctx: &Context, args: &[String], target: DownloadTarget, workers: usize) -> Result<()> {
    let mut idents = Vec::with_capacity(args.len());
    for arg in args {
        let ident = ctx.ident(arg)?;
        if ident.asset.is_none() {
            bail!(
                "failed to parse {}, does not match [org/]repo[@tag]:asset[:dst]",
                arg
            );
        }
        idents.push(ident);
    }

    let provider = ctx.token_provider()?;
    let sources: Vec<_> = idents
        .into_iter()
        .map(|ident| (ctx.forge_for(&provider, &ident), ident))
        .collect();

    let rt = runtime()?;
    let errors = rt.block_on(download_all(&sources, target, workers, ctx.verbosity))?;

    if !errors.is_empty() {
        for err in &errors {
            output::error(err);
        }
        bail!("get failed");
    }
    Ok(())
}

/// Resolve every source, then download all matches through one pool.
///
/// Nothing is queued until every identity has resolved.
async fn download_all(
    sources: &[(Arc<dyn Forge>, Ident)],
    target: DownloadTarget,
    workers: usize,
    verbosity: Verbosity,
) -> Result<Vec<TransferError>> {
    let mut resolved = Vec::new();
    for (forge, ident) in sources {
        for asset in glob_assets(forge.as_ref(), ident).await? {
            resolved.push((Arc::clone(forge), asset));
        }
    }

    let pool = TransferPool::new(workers, verbosity);
    for (forge, asset) in resolved {
        output::debug(format!("queue {}", asset.ident), verbosity);
        pool.enqueue(Job::Download {
            forge,
            asset,
            target: target.clone(),
        })?;
    }
    Ok(pool.drain().await)
}
