//! cli::commands::what
//!
//! List paths changed since the previous release, or test named paths.

use anyhow::{bail, Result};

use crate::cli::Context;
use crate::versioning::changeset::ChangeSet;

/// Run the what command.
pub fn what(ctx: &Context, version_file: Option<&str>, paths: &[String], all: bool) -> Result<()> {
    let versioner = ctx.versioner(version_file)?;
    let changes = versioner.changed_paths()?;

    if paths.is_empty() {
        for path in changes.iter() {
            println!("{}", path);
        }
        return Ok(());
    }

    check(&changes, paths, all)
}

/// Succeed if any path changed, or with `all`, if every path changed.
fn check(changes: &ChangeSet, paths: &[String], all: bool) -> Result<()> {
    if !all {
        if paths.iter().any(|p| changes.contains(p)) {
            return Ok(());
        }
        bail!("no changes detected");
    }

    let unchanged = changes.unchanged(paths.iter().map(String::as_str));
    if !unchanged.is_empty() {
        bail!("no changes detected: {}", unchanged.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn changes(paths: &[&str]) -> ChangeSet {
        paths.iter().copied().collect()
    }

    fn args(paths: &[&str]) -> Vec<String> {
        paths.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn any_mode() {
        let set = changes(&["src/lib.rs"]);
        assert!(check(&set, &args(&["docs", "./src/"]), false).is_ok());
        let err = check(&set, &args(&["docs"]), false).unwrap_err();
        assert_eq!(err.to_string(), "no changes detected");
    }

    #[test]
    fn all_mode_lists_unchanged() {
        let set = changes(&["src/lib.rs"]);
        assert!(check(&set, &args(&["src", "src/lib.rs"]), true).is_ok());
        let err = check(&set, &args(&["src", "docs/", "README.md"]), true).unwrap_err();
        assert_eq!(err.to_string(), "no changes detected: docs, README.md");
    }
}
