//! cli::commands::resolve
//!
//! Pin floating tags such as `latest` to the release tag they name today.

use anyhow::{anyhow, Result};

use super::runtime;
use crate::cli::Context;
use crate::release::query::resolve_release;

/// Run the resolve command.
///
/// Prints each identity with its real tag, or the release's web URL.
pub fn resolve(ctx: &Context, args: &[String], web: bool) -> Result<()> {
    let provider = ctx.token_provider()?;
    let rt = runtime()?;

    for arg in args {
        let ident = ctx.ident(arg)?;
        let forge = ctx.forge_for(&provider, &ident);
        let release = rt
            .block_on(resolve_release(forge.as_ref(), &ident.tag))
            .map_err(|e| anyhow!("{}: {}", arg, e))?;

        if web {
            println!("{}", release.html_url);
        } else {
            println!("{}", ident.with_tag(release.tag_name));
        }
    }
    Ok(())
}
