//! core::ident
//!
//! Release identity strings: `[org/]repo[@tag][:asset][:dst]`.
//!
//! # Design
//!
//! The organization may be omitted on the command line; the fallback comes
//! from an explicit [`IdentDefaults`] value built from configuration, never
//! from process globals. The tag defaults to `latest`.
//!
//! The asset part may be a glob (`*.tar.gz`). A destination name only makes
//! sense for a single asset, so it is rejected next to a glob. A plain
//! asset name without a destination downloads to a file of the same name.
//!
//! # Example
//!
//! ```
//! use tagsmith::core::ident::{Ident, IdentDefaults};
//!
//! let defaults = IdentDefaults::with_org("acme");
//! let id = Ident::parse("tool@v1.2.0:tool-linux.tar.gz", &defaults).unwrap();
//! assert_eq!(id.org, "acme");
//! assert_eq!(id.tag, "v1.2.0");
//! assert_eq!(id.dst.as_deref(), Some("tool-linux.tar.gz"));
//! assert_eq!(id.to_string(), "acme/tool@v1.2.0:tool-linux.tar.gz");
//! ```

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// Tag used when an identity names none.
pub const DEFAULT_TAG: &str = "latest";

/// Tags that name a release by role instead of by version.
pub const FLOATING_TAGS: [&str; 3] = ["latest", "stable", "edge"];

static IDENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:([0-9A-Za-z_-]+)/)?",
        r"([0-9A-Za-z_-]+)",
        r"(?:@([0-9A-Za-z._-]+))?",
        r"(?::([0-9A-Za-z.*?\[\]^_-]+))?",
        r"(?::([0-9A-Za-z._-]+))?$",
    ))
    .expect("ident pattern is a valid regex")
});

static PLAIN_ASSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z._-]+$").expect("asset pattern is a valid regex"));

/// Errors from identity parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentError {
    #[error("invalid identity: {0}")]
    Malformed(String),

    #[error("identity '{0}' has no organization and no default_org is configured")]
    MissingOrg(String),

    #[error("identity '{0}' combines a glob with a destination")]
    GlobWithDestination(String),
}

/// Fallback values applied while parsing identities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentDefaults {
    /// Organization used when the identity omits one
    pub org: Option<String>,
}

impl IdentDefaults {
    /// Defaults with a fallback organization.
    pub fn with_org(org: impl Into<String>) -> Self {
        Self {
            org: Some(org.into()),
        }
    }
}

/// A parsed release identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub org: String,
    pub repo: String,
    pub tag: String,
    /// Asset name or glob
    pub asset: Option<String>,
    /// Local destination for a single asset
    pub dst: Option<String>,
}

impl Ident {
    /// Parse an identity string.
    ///
    /// # Errors
    ///
    /// - [`IdentError::Malformed`] if the string does not match the grammar
    /// - [`IdentError::MissingOrg`] if no org is given and none is defaulted
    /// - [`IdentError::GlobWithDestination`] for `repo:*.zip:out.zip`
    pub fn parse(s: &str, defaults: &IdentDefaults) -> Result<Self, IdentError> {
        let caps = IDENT_PATTERN
            .captures(s)
            .ok_or_else(|| IdentError::Malformed(s.to_string()))?;
        let part = |i: usize| caps.get(i).map(|m| m.as_str().to_string());

        let org = match part(1).or_else(|| defaults.org.clone()) {
            Some(org) if !org.is_empty() => org,
            _ => return Err(IdentError::MissingOrg(s.to_string())),
        };
        let repo = part(2).ok_or_else(|| IdentError::Malformed(s.to_string()))?;
        let tag = part(3).unwrap_or_else(|| DEFAULT_TAG.to_string());
        let asset = part(4);
        let mut dst = part(5);

        if let Some(asset) = &asset {
            let glob = !PLAIN_ASSET.is_match(asset);
            if glob && dst.is_some() {
                return Err(IdentError::GlobWithDestination(s.to_string()));
            }
            if !glob && dst.is_none() {
                dst = Some(asset.clone());
            }
        }

        Ok(Self {
            org,
            repo,
            tag,
            asset,
            dst,
        })
    }

    /// Build an identity from its parts with the default tag.
    pub fn new(org: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            org: org.into(),
            repo: repo.into(),
            tag: DEFAULT_TAG.to_string(),
            asset: None,
            dst: None,
        }
    }

    /// Same identity pinned to another tag.
    pub fn with_tag(&self, tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..self.clone()
        }
    }

    /// Same identity naming a single asset.
    pub fn with_asset(&self, asset: impl Into<String>) -> Self {
        let asset = asset.into();
        Self {
            dst: Some(asset.clone()),
            asset: Some(asset),
            ..self.clone()
        }
    }

    /// Whether the asset part is a glob pattern.
    pub fn is_glob(&self) -> bool {
        self.asset
            .as_deref()
            .is_some_and(|a| !PLAIN_ASSET.is_match(a))
    }

    /// Whether the tag is `latest`, `stable` or `edge`.
    pub fn is_floating(&self) -> bool {
        FLOATING_TAGS.contains(&self.tag.as_str())
    }

    /// `org/repo` without tag or asset.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.org, self.repo)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.org, self.repo)?;
        if self.tag != DEFAULT_TAG {
            write!(f, "@{}", self.tag)?;
        }
        if let Some(asset) = &self.asset {
            write!(f, ":{asset}")?;
            if let Some(dst) = self.dst.as_ref().filter(|d| *d != asset) {
                write!(f, ":{dst}")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<Ident, IdentError> {
        Ident::parse(s, &IdentDefaults::default())
    }

    mod parsing {
        use super::*;

        #[test]
        fn full_form() {
            let id = parse("acme/tool@v1.0.0:tool.zip:out.zip").unwrap();
            assert_eq!(id.org, "acme");
            assert_eq!(id.repo, "tool");
            assert_eq!(id.tag, "v1.0.0");
            assert_eq!(id.asset.as_deref(), Some("tool.zip"));
            assert_eq!(id.dst.as_deref(), Some("out.zip"));
        }

        #[test]
        fn tag_defaults_to_latest() {
            let id = parse("acme/tool").unwrap();
            assert_eq!(id.tag, DEFAULT_TAG);
            assert!(id.asset.is_none());
            assert!(id.dst.is_none());
        }

        #[test]
        fn plain_asset_sets_destination() {
            let id = parse("acme/tool:tool.zip").unwrap();
            assert_eq!(id.dst.as_deref(), Some("tool.zip"));
            assert!(!id.is_glob());
        }

        #[test]
        fn glob_asset_has_no_destination() {
            let id = parse("acme/tool:*.tar.gz").unwrap();
            assert!(id.is_glob());
            assert!(id.dst.is_none());
        }

        #[test]
        fn glob_with_destination_rejected() {
            assert_eq!(
                parse("acme/tool:*.zip:out.zip"),
                Err(IdentError::GlobWithDestination("acme/tool:*.zip:out.zip".into()))
            );
        }

        #[test]
        fn malformed_rejected() {
            assert!(matches!(parse("a/b/c"), Err(IdentError::Malformed(_))));
            assert!(matches!(parse(""), Err(IdentError::Malformed(_))));
            assert!(matches!(parse("acme/tool@"), Err(IdentError::Malformed(_))));
        }

        #[test]
        fn non_ascii_word_chars_rejected() {
            assert!(matches!(parse("acme/tööl"), Err(IdentError::Malformed(_))));
        }
    }

    mod defaults {
        use super::*;

        #[test]
        fn missing_org_without_default() {
            assert_eq!(parse("tool"), Err(IdentError::MissingOrg("tool".into())));
        }

        #[test]
        fn missing_org_uses_default() {
            let id = Ident::parse("tool", &IdentDefaults::with_org("acme")).unwrap();
            assert_eq!(id.slug(), "acme/tool");
        }

        #[test]
        fn explicit_org_wins() {
            let id = Ident::parse("other/tool", &IdentDefaults::with_org("acme")).unwrap();
            assert_eq!(id.org, "other");
        }
    }

    mod display {
        use super::*;

        #[test]
        fn omits_default_tag() {
            assert_eq!(parse("acme/tool").unwrap().to_string(), "acme/tool");
            assert_eq!(
                parse("acme/tool@latest").unwrap().to_string(),
                "acme/tool"
            );
        }

        #[test]
        fn omits_destination_equal_to_asset() {
            assert_eq!(
                parse("acme/tool@v1:a.zip").unwrap().to_string(),
                "acme/tool@v1:a.zip"
            );
            assert_eq!(
                parse("acme/tool@v1:a.zip:b.zip").unwrap().to_string(),
                "acme/tool@v1:a.zip:b.zip"
            );
        }

        #[test]
        fn with_tag_pins_version() {
            let id = parse("acme/tool:*.zip").unwrap().with_tag("v2.0.0");
            assert_eq!(id.to_string(), "acme/tool@v2.0.0:*.zip");
        }
    }

    #[test]
    fn floating_tags() {
        assert!(parse("acme/tool").unwrap().is_floating());
        assert!(parse("acme/tool@edge").unwrap().is_floating());
        assert!(!parse("acme/tool@v1.0.0").unwrap().is_floating());
    }
}
