//! cli::commands::assets
//!
//! List the assets of releases.

use anyhow::{Context as _, Result};

use super::runtime;
use crate::cli::Context;
use crate::forge::Asset;
use crate::release::query::{matching_assets, resolve_release};
use crate::ui::output::Columns;

/// Assets per line in the short listing.
const PER_LINE: usize = 3;

/// Run the assets command.
pub fn assets(ctx: &Context, args: &[String], long: bool) -> Result<()> {
    let idents = args
        .iter()
        .map(|arg| ctx.ident(arg))
        .collect::<Result<Vec<_>>>()?;

    let provider = ctx.token_provider()?;
    let rt = runtime()?;
    let mut cols = Columns::new(16);

    for ident in &idents {
        let forge = ctx.forge_for(&provider, ident);
        let release = rt
            .block_on(resolve_release(forge.as_ref(), &ident.tag))
            .with_context(|| ident.to_string())?;

        let pinned = ident.with_tag(release.tag_name.clone());
        if idents.len() > 1 {
            cols.line(format!("{}:", pinned));
        }

        let pattern = ident.asset.as_deref().unwrap_or("*");
        let found = matching_assets(&release, pattern)?;
        if long {
            for asset in found {
                cols.row(describe(asset));
            }
        } else {
            for chunk in found.chunks(PER_LINE) {
                cols.row(chunk.iter().map(|a| a.name.clone()));
            }
        }

        if idents.len() > 1 {
            cols.line("");
        }
    }

    print!("{}", cols.render());
    Ok(())
}

fn describe(asset: &Asset) -> Vec<String> {
    vec![
        asset.name.clone(),
        asset.content_type.clone(),
        asset.size.to_string(),
        asset.label.clone().unwrap_or_default(),
    ]
}
