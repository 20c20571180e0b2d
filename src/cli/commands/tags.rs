//! cli::commands::tags
//!
//! List repository tags, by default only those of full releases.

use std::collections::HashMap;

use anyhow::Result;

use super::runtime;
use crate::cli::Context;
use crate::forge::Release;
use crate::ui::output::Columns;

/// Tags per line in the short listing.
const PER_LINE: usize = 5;

/// Run the tags command.
pub fn tags(ctx: &Context, args: &[String], long: bool, all: bool) -> Result<()> {
    let idents = args
        .iter()
        .map(|arg| ctx.ident(arg))
        .collect::<Result<Vec<_>>>()?;

    let provider = ctx.token_provider()?;
    let rt = runtime()?;
    let mut cols = Columns::new(12);

    for ident in &idents {
        let forge = ctx.forge_for(&provider, ident);
        let (releases, tags) = rt.block_on(async {
            let releases = forge.list_releases().await?;
            let tags = forge.list_tags().await?;
            anyhow::Ok((releases, tags))
        })?;

        if idents.len() > 1 {
            cols.line(format!("{}:", ident));
        }
        list_into(&mut cols, &releases, &tags, long, all);
        if idents.len() > 1 {
            cols.line("");
        }
    }

    print!("{}", cols.render());
    Ok(())
}

/// Append the listing of one repository.
fn list_into(cols: &mut Columns, releases: &[Release], tags: &[String], long: bool, all: bool) {
    let by_tag: HashMap<&str, &Release> =
        releases.iter().map(|r| (r.tag_name.as_str(), r)).collect();

    let mut short = Vec::new();
    for tag in tags {
        let release = by_tag.get(tag.as_str()).copied();
        match release {
            _ if !all && !release.is_some_and(|r| !r.draft && !r.prerelease) => continue,
            Some(r) if long => cols.row(describe(r)),
            None if long => cols.row([tag.clone(), "tag".to_string()]),
            _ => short.push(tag.clone()),
        }
    }
    for chunk in short.chunks(PER_LINE) {
        cols.row(chunk.iter().cloned());
    }
}

fn describe(release: &Release) -> Vec<String> {
    let created = release
        .created_at
        .map(|t| t.format("%Y-%m-%d %H:%M %Z").to_string())
        .unwrap_or_default();
    let mut cells = vec![release.tag_name.clone(), "release".to_string(), created];
    if release.prerelease {
        cells.push("pre-release".to_string());
    }
    if release.draft {
        cells.push("draft".to_string());
    }
    cells
}
