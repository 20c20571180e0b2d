//! Integration tests for versioning against real repositories.
//!
//! These tests build repositories with the git binary and read them back
//! through [`Git`], so the libgit2 adapter and the history walks are
//! exercised together.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use tagsmith::core::types::Oid;
use tagsmith::git::{Git, History};
use tagsmith::versioning::{Versioner, VersioningError};

/// Test fixture that creates a real git repository.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create an empty repository with a configured identity.
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");

        run_git(dir.path(), &["init", "-q", "-b", "main"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);
        run_git(dir.path(), &["config", "commit.gpgsign", "false"]);

        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn versioner(&self) -> Versioner<Git> {
        let git = Git::open(self.path()).expect("failed to open test repo");
        Versioner::new(git, "VERSION")
    }

    /// Write a file (creating parent directories) and commit it.
    fn commit_file(&self, path: &str, content: &str, message: &str) -> Oid {
        let full = self.path().join(path);
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(full, content).unwrap();
        run_git(self.path(), &["add", path]);
        run_git(self.path(), &["commit", "-q", "-m", message]);
        self.head()
    }

    fn head(&self) -> Oid {
        let output = Command::new("git")
            .args(["rev-parse", "HEAD"])
            .current_dir(self.path())
            .output()
            .expect("git rev-parse failed");
        Oid::new(String::from_utf8(output.stdout).unwrap().trim()).unwrap()
    }

    fn git(&self, args: &[&str]) {
        run_git(self.path(), args);
    }
}

/// Run a git command in the given directory.
fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

fn trimmed(messages: Vec<String>) -> Vec<String> {
    messages.into_iter().map(|m| m.trim().to_string()).collect()
}

// =============================================================================
// Version and release detection
// =============================================================================

mod release_detection {
    use super::*;

    #[test]
    fn root_commit_is_a_release() {
        let repo = TestRepo::new();
        repo.commit_file("VERSION", "v1.0.0\n", "init");

        let v = repo.versioner();
        assert!(v.is_release().unwrap());
        assert_eq!(v.head_version().unwrap().to_string(), "v1.0.0");
    }

    #[test]
    fn ordinary_commit_is_not_a_release() {
        let repo = TestRepo::new();
        repo.commit_file("VERSION", "v1.0.0\n", "init");
        repo.commit_file("src/lib.rs", "fn main() {}\n", "add lib");

        assert!(!repo.versioner().is_release().unwrap());
    }

    #[test]
    fn version_change_is_a_release() {
        let repo = TestRepo::new();
        repo.commit_file("VERSION", "v1.0.0\n", "init");
        repo.commit_file("VERSION", "v1.1.0\n\n- things\n\nv1.0.0\n", "release");

        let v = repo.versioner();
        assert!(v.is_release().unwrap());
        assert_eq!(v.head_version().unwrap().to_string(), "v1.1.0");
    }

    #[test]
    fn missing_version_file_is_unset() {
        let repo = TestRepo::new();
        repo.commit_file("README.md", "# hi\n", "init");

        let v = repo.versioner();
        assert!(v.head_version().unwrap().is_unset());
        assert_eq!(v.last_log().unwrap(), "");
    }

    #[test]
    fn malformed_version_is_an_error() {
        let repo = TestRepo::new();
        repo.commit_file("VERSION", "no digits here\n", "init");

        let err = repo.versioner().head_version().unwrap_err();
        assert!(matches!(err, VersioningError::MalformedVersion { .. }));
    }

    #[test]
    fn unborn_head_is_an_error() {
        let repo = TestRepo::new();
        assert!(repo.versioner().head_version().is_err());
    }
}

// =============================================================================
// Changelog
// =============================================================================

mod changelog {
    use super::*;

    #[test]
    fn log_head_stops_at_previous_release() {
        let repo = TestRepo::new();
        repo.commit_file("VERSION", "v1.0.0\n", "init");
        repo.commit_file("a.txt", "a", "add a");
        repo.commit_file("VERSION", "v1.1.0\n", "release v1.1.0");
        repo.commit_file("b.txt", "b", "add b");
        repo.commit_file("c.txt", "c", "add c");

        let log = trimmed(repo.versioner().log_head().unwrap());
        assert_eq!(log, ["add c", "add b"]);
    }

    #[test]
    fn log_head_includes_root_without_prior_release() {
        let repo = TestRepo::new();
        repo.commit_file("README.md", "# hi\n", "init");
        repo.commit_file("a.txt", "a", "add a");

        let log = trimmed(repo.versioner().log_head().unwrap());
        assert_eq!(log, ["add a", "init"]);
    }

    #[test]
    fn merged_branch_messages_are_included() {
        let repo = TestRepo::new();
        repo.commit_file("VERSION", "v1.0.0\n", "init");
        repo.git(&["checkout", "-q", "-b", "feature"]);
        repo.commit_file("f.txt", "f", "feature work");
        repo.git(&["checkout", "-q", "main"]);
        repo.commit_file("m.txt", "m", "main work");
        repo.git(&["merge", "-q", "--no-ff", "-m", "merge feature", "feature"]);

        let log = trimmed(repo.versioner().log_head().unwrap());
        assert_eq!(log[0], "merge feature");
        assert!(log.contains(&"feature work".to_string()));
        assert!(log.contains(&"main work".to_string()));
    }

    #[test]
    fn log_diff_returns_added_lines() {
        let repo = TestRepo::new();
        repo.commit_file("VERSION", "v1.0.0\n", "init");
        repo.commit_file(
            "VERSION",
            "v1.1.0\n\n- add flag\n\nv1.0.0\n",
            "release",
        );

        let chunks = repo.versioner().log_diff().unwrap();
        assert_eq!(chunks, ["v1.1.0\n\n- add flag\n\n"]);
    }

    #[test]
    fn log_diff_rejects_merge_head() {
        let repo = TestRepo::new();
        repo.commit_file("VERSION", "v1.0.0\n", "init");
        repo.git(&["checkout", "-q", "-b", "side"]);
        repo.commit_file("s.txt", "s", "side");
        repo.git(&["checkout", "-q", "main"]);
        repo.commit_file("m.txt", "m", "main");
        repo.git(&["merge", "-q", "--no-ff", "-m", "merge", "side"]);

        let err = repo.versioner().log_diff().unwrap_err();
        assert!(matches!(err, VersioningError::MergeHead(_)));
    }
}

// =============================================================================
// Change-set
// =============================================================================

mod changed_paths {
    use super::*;

    fn paths(repo: &TestRepo) -> Vec<String> {
        repo.versioner()
            .changed_paths()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn single_commit_has_no_changes() {
        let repo = TestRepo::new();
        repo.commit_file("VERSION", "v1.0.0\n", "init");
        assert!(paths(&repo).is_empty());
    }

    #[test]
    fn reports_files_and_directories_since_release() {
        let repo = TestRepo::new();
        repo.commit_file("VERSION", "v1.0.0\n", "init");
        repo.commit_file("old/x.txt", "x", "before release");
        repo.commit_file("VERSION", "v1.1.0\n", "release");
        repo.commit_file("src/cmd/main.rs", "fn main() {}", "add main");

        assert_eq!(paths(&repo), ["src", "src/cmd", "src/cmd/main.rs"]);
    }

    #[test]
    fn deleted_files_are_reported() {
        let repo = TestRepo::new();
        repo.commit_file("VERSION", "v1.0.0\n", "init");
        repo.commit_file("gone.txt", "x", "add");
        repo.commit_file("VERSION", "v1.1.0\n", "release");
        repo.git(&["rm", "-q", "gone.txt"]);
        repo.git(&["commit", "-q", "-m", "remove"]);

        let set = repo.versioner().changed_paths().unwrap();
        assert!(set.contains("gone.txt"));
    }

    #[test]
    fn downgraded_version_has_no_release_history() {
        let repo = TestRepo::new();
        repo.commit_file("VERSION", "v2.0.0\n", "init");
        repo.commit_file("VERSION", "v1.0.0\n", "downgrade");

        let err = repo.versioner().changed_paths().unwrap_err();
        assert!(matches!(err, VersioningError::NoReleaseHistory));
    }
}

// =============================================================================
// Local tags
// =============================================================================

mod tags {
    use super::*;

    #[test]
    fn lightweight_tag_resolves_to_commit() {
        let repo = TestRepo::new();
        let first = repo.commit_file("VERSION", "v1.0.0\n", "init");
        repo.commit_file("a.txt", "a", "more");
        repo.git(&["tag", "v1.0.0", first.as_str()]);

        let git = Git::open(repo.path()).unwrap();
        assert_eq!(git.resolve_tag("v1.0.0").unwrap(), Some(first));
    }

    #[test]
    fn annotated_tag_peels_to_commit() {
        let repo = TestRepo::new();
        let head = repo.commit_file("VERSION", "v1.0.0\n", "init");
        repo.git(&["tag", "-a", "v1.0.0", "-m", "release v1.0.0"]);

        let git = Git::open(repo.path()).unwrap();
        assert_eq!(git.resolve_tag("v1.0.0").unwrap(), Some(head));
    }

    #[test]
    fn missing_tag_is_none() {
        let repo = TestRepo::new();
        repo.commit_file("VERSION", "v1.0.0\n", "init");

        let git = Git::open(repo.path()).unwrap();
        assert_eq!(git.resolve_tag("v9.9.9").unwrap(), None);
    }
}
