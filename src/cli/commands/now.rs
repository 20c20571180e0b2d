//! cli::commands::now
//!
//! Exit status tells whether HEAD is a release commit.

use anyhow::{bail, Context as _, Result};

use crate::cli::Context;

/// Run the now command.
pub fn now(ctx: &Context, version_file: Option<&str>) -> Result<()> {
    let versioner = ctx.versioner(version_file)?;
    if !versioner.is_release().context("check head")? {
        bail!("not a release");
    }
    Ok(())
}
