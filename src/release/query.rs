//! release::query
//!
//! Read-only release lookups.
//!
//! `latest` and `stable` mean the newest published full release. `edge`
//! means the newest release of any kind, drafts and prereleases included.
//! Any other tag is looked up directly.

use glob::Pattern;

use super::ReleaseError;
use crate::core::ident::Ident;
use crate::forge::{Asset, Forge, Release};

/// An asset matched by an identity, with the identity pinned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Pinned to the release's real tag and this asset's name
    pub ident: Ident,
    pub asset: Asset,
}

impl ResolvedAsset {
    /// Local file name to write the asset to.
    pub fn destination(&self) -> &str {
        self.ident.dst.as_deref().unwrap_or(&self.asset.name)
    }
}

/// Resolve `tag` to a release.
///
/// # Errors
///
/// - [`ReleaseError::NoReleases`] for `edge` on a repository without releases
/// - [`ReleaseError::Forge`] wrapping `NotFound` when the tag has no release
pub async fn resolve_release(forge: &dyn Forge, tag: &str) -> Result<Release, ReleaseError> {
    match tag {
        "edge" => {
            let releases = forge
                .list_releases()
                .await
                .map_err(ReleaseError::during("list releases"))?;
            releases
                .into_iter()
                .next()
                .ok_or_else(|| ReleaseError::NoReleases(format!("{}/{}", forge.owner(), forge.repo())))
        }
        "latest" | "stable" => forge
            .get_latest_release()
            .await
            .map_err(ReleaseError::during("get latest release")),
        tag => forge
            .get_release_by_tag(tag)
            .await
            .map_err(ReleaseError::during("get release")),
    }
}

/// Assets of `release` whose names match `pattern`, in release order.
///
/// # Errors
///
/// [`ReleaseError::InvalidPattern`] if `pattern` is not a valid glob.
pub fn matching_assets<'a>(
    release: &'a Release,
    pattern: &str,
) -> Result<Vec<&'a Asset>, ReleaseError> {
    let glob = Pattern::new(pattern).map_err(|_| ReleaseError::InvalidPattern(pattern.into()))?;
    Ok(release
        .assets
        .iter()
        .filter(|a| glob.matches(&a.name))
        .collect())
}

/// Resolve the release named by `ident` and the assets its asset part matches.
///
/// Each result carries `ident` pinned to the release's tag and the asset's
/// name. A plain asset name keeps its destination; a glob match is written
/// under its own name.
///
/// # Errors
///
/// [`ReleaseError::NotFound`] if nothing matches, including when `ident`
/// names no asset at all.
pub async fn glob_assets(forge: &dyn Forge, ident: &Ident) -> Result<Vec<ResolvedAsset>, ReleaseError> {
    let release = resolve_release(forge, &ident.tag).await?;
    let pinned = ident.with_tag(release.tag_name.clone());

    let Some(pattern) = ident.asset.as_deref() else {
        return Err(ReleaseError::NotFound(pinned.to_string()));
    };

    let found: Vec<ResolvedAsset> = matching_assets(&release, pattern)?
        .into_iter()
        .map(|asset| {
            let mut id = pinned.with_asset(asset.name.clone());
            if let Some(dst) = &ident.dst {
                id.dst = Some(dst.clone());
            }
            ResolvedAsset {
                ident: id,
                asset: asset.clone(),
            }
        })
        .collect();

    if found.is_empty() {
        return Err(ReleaseError::NotFound(pinned.to_string()));
    }
    Ok(found)
}
