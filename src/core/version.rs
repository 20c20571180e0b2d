//! core::version
//!
//! Semantic versions embedded in arbitrary text.
//!
//! # Design
//!
//! A [`Version`] keeps the original string verbatim (`v1.2.3-rc`, `release-4`)
//! and only interprets the first `\d+(\.\d+)?(\.\d+)?` match inside it. Two
//! consequences follow:
//!
//! - Ordering ([`Version::is_before`], [`Version::cmp_components`]) looks at
//!   the three numeric components only. Missing components count as 0.
//! - Equality (`==`) is textual. `v1.2` and `v1.2.0` order the same but are
//!   different versions, which is what history traversal relies on when it
//!   asks whether the version file changed between two commits.
//!
//! A version read from a commit that has no version file is *unset*. It
//! displays as `v0.0.0` and orders as `0.0.0`.
//!
//! # Example
//!
//! ```
//! use tagsmith::core::version::{Increment, Version};
//!
//! let v = Version::parse("v1.2.3-rc").unwrap();
//! assert_eq!(v.bump(Increment::Minor).to_string(), "v1.3.0-rc");
//! assert!(v.is_before(&Version::parse("1.10").unwrap()));
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

/// First match of this pattern is the version inside a string.
static VERSION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+)(?:\.(\d+))?(?:\.(\d+))?").expect("version pattern is a valid regex")
});

/// Fallback used when bumping an unset or unparsable version.
const ZERO_VERSION: &str = "v0.0.0";

/// Error returned when a string carries no usable version.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionParseError {
    /// No digits anywhere in the input
    #[error("version '{input}' does not match the 0.0.0 pattern")]
    NoMatch { input: String },

    /// A numeric component does not fit in 64 bits
    #[error("version '{input}' has component '{component}' out of range")]
    OutOfRange { input: String, component: String },
}

impl VersionParseError {
    /// The rejected input.
    pub fn input(&self) -> &str {
        match self {
            VersionParseError::NoMatch { input } | VersionParseError::OutOfRange { input, .. } => {
                input
            }
        }
    }
}

/// A semver component to increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Increment {
    /// `1.2.3` -> `2.0.0`
    Major,
    /// `1.2.3` -> `1.3.0`
    Minor,
    /// `1.2.3` -> `1.2.4`
    Patch,
}

impl Increment {
    /// Index of the component in `[major, minor, patch]`.
    fn index(self) -> usize {
        match self {
            Increment::Major => 0,
            Increment::Minor => 1,
            Increment::Patch => 2,
        }
    }
}

impl fmt::Display for Increment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Increment::Major => write!(f, "major"),
            Increment::Minor => write!(f, "minor"),
            Increment::Patch => write!(f, "patch"),
        }
    }
}

impl FromStr for Increment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "major" => Ok(Increment::Major),
            "minor" => Ok(Increment::Minor),
            "patch" => Ok(Increment::Patch),
            other => Err(format!("not an increment: {other}")),
        }
    }
}

/// A version string with a semver core somewhere inside it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Version(String);

impl Version {
    /// Parse a version, keeping the full input as its display form.
    ///
    /// # Errors
    ///
    /// Returns [`VersionParseError`] if `s` contains no digits, or if a
    /// component of the first match does not fit in a `u64`.
    pub fn parse(s: &str) -> Result<Self, VersionParseError> {
        let Some(caps) = VERSION_PATTERN.captures(s) else {
            return Err(VersionParseError::NoMatch {
                input: s.to_string(),
            });
        };
        for m in caps.iter().skip(1).flatten() {
            if m.as_str().parse::<u64>().is_err() {
                return Err(VersionParseError::OutOfRange {
                    input: s.to_string(),
                    component: m.as_str().to_string(),
                });
            }
        }
        Ok(Self(s.to_string()))
    }

    /// The version of a commit without a version file.
    pub fn unset() -> Self {
        Self::default()
    }

    /// Whether this is the unset version.
    pub fn is_unset(&self) -> bool {
        self.0.is_empty()
    }

    /// The raw string, exactly as parsed.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric `[major, minor, patch]` components.
    ///
    /// Missing components are 0. Parsing guarantees the others fit.
    pub fn components(&self) -> [u64; 3] {
        let mut out = [0u64; 3];
        if let Some(caps) = VERSION_PATTERN.captures(&self.0) {
            for (i, slot) in out.iter_mut().enumerate() {
                *slot = caps
                    .get(i + 1)
                    .and_then(|m| m.as_str().parse().ok())
                    .unwrap_or(0);
            }
        }
        out
    }

    /// Compare numeric components left to right, ignoring surrounding text.
    pub fn cmp_components(&self, other: &Version) -> Ordering {
        self.components().cmp(&other.components())
    }

    /// Whether `self` is an earlier version than `other`.
    ///
    /// ```
    /// use tagsmith::core::version::Version;
    ///
    /// let v = |s| Version::parse(s).unwrap();
    /// assert!(v("v1.0.0").is_before(&v("v1.0.1")));
    /// assert!(!v("v2.0.0").is_before(&v("v1.9.9")));
    /// ```
    pub fn is_before(&self, other: &Version) -> bool {
        self.cmp_components(other) == Ordering::Less
    }

    /// Return a new version with `increment` bumped.
    ///
    /// Components right of the bumped one are zeroed and the result always
    /// carries all three components. Text around the version is untouched.
    /// An unset version bumps from `v0.0.0`.
    pub fn bump(&self, increment: Increment) -> Version {
        let current = match VERSION_PATTERN.find(&self.0) {
            Some(_) => self.0.as_str(),
            None => ZERO_VERSION,
        };
        let Some(found) = VERSION_PATTERN.find(current) else {
            return Version(current.to_string());
        };

        let mut parts = Version(current.to_string()).components();
        let at = increment.index();
        parts[at] = parts[at].saturating_add(1);
        for part in parts.iter_mut().skip(at + 1) {
            *part = 0;
        }

        Version(format!(
            "{}{}.{}.{}{}",
            &current[..found.start()],
            parts[0],
            parts[1],
            parts[2],
            &current[found.end()..]
        ))
    }
}

impl FromStr for Version {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Version::parse(s)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unset() {
            return write!(f, "{ZERO_VERSION}");
        }
        write!(f, "{}", self.0.trim_end_matches('\n'))
    }
}
