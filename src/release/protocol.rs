//! release::protocol
//!
//! The release sequence: tag, draft, upload, publish.
//!
//! # Design
//!
//! Every step checks remote state before changing it, so a run that failed
//! halfway can simply be repeated:
//!
//! 1. The tag is created only if absent. An existing tag must already point
//!    at the requested commit; tags are never moved.
//! 2. A draft release is created only if no release has the tag. An
//!    existing release is left as it is.
//! 3. Assets are uploaded through a [`TransferPool`]. A same-named asset of
//!    equal size counts as already uploaded.
//! 4. The release is published unless a draft was asked for.
//!
//! Nothing is locked. Two first releases of the same tag started at the
//! same moment can both pass step 2; the loser fails on the forge's
//! duplicate check.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::transfer::{Job, TransferPool};
use super::ReleaseError;
use crate::core::ident::Ident;
use crate::core::types::Oid;
use crate::forge::{CreateReleaseRequest, CreateTagRequest, Forge, ObjectKind, Release};
use crate::ui::output::{self, Verbosity};

/// Everything needed to publish one release.
#[derive(Debug, Clone)]
pub struct ReleaseSpec {
    /// Repository and tag to release
    pub ident: Ident,
    /// Commit the tag must point at
    pub sha: Oid,
    pub name: String,
    pub body: String,
    /// Leave the release as a draft
    pub draft: bool,
    pub prerelease: bool,
    /// Local files to attach
    pub uploads: Vec<PathBuf>,
    /// Name assets by their full path instead of the file name
    pub keep_paths: bool,
    /// Upload workers
    pub workers: usize,
}

impl ReleaseSpec {
    /// Remote asset name for a local file.
    pub fn upload_name(&self, path: &Path) -> String {
        if self.keep_paths {
            return path.to_string_lossy().into_owned();
        }
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned())
    }

    fn tag(&self) -> &str {
        &self.ident.tag
    }

    /// Run the release sequence against `forge`.
    ///
    /// Returns the release as it stands after the last step.
    ///
    /// # Errors
    ///
    /// - [`ReleaseError::TagConflict`] if the tag points at another commit
    /// - [`ReleaseError::CommitNotPushed`] if the remote lacks the commit
    /// - [`ReleaseError::UploadsFailed`] with every failed upload
    /// - [`ReleaseError::Forge`] for any other remote failure, tagged with
    ///   the step it happened in
    pub async fn run(self, forge: Arc<dyn Forge>, verbosity: Verbosity) -> Result<Release, ReleaseError> {
        let message = format!("release {}", self.name);
        ensure_tag(forge.as_ref(), self.tag(), &self.sha, &message).await?;

        let release = ensure_draft(forge.as_ref(), &self).await?;

        if !self.uploads.is_empty() {
            let shared = Arc::new(release.clone());
            let pool = TransferPool::new(self.workers, verbosity);
            for path in &self.uploads {
                output::progress(format!("uploading {}", path.display()), verbosity);
                let job = Job::Upload {
                    forge: Arc::clone(&forge),
                    release: Arc::clone(&shared),
                    name: self.upload_name(path),
                    local: path.clone(),
                };
                if let Err(e) = pool.enqueue(job) {
                    return Err(ReleaseError::UploadsFailed(vec![e]));
                }
            }
            let errors = pool.drain().await;
            if !errors.is_empty() {
                return Err(ReleaseError::UploadsFailed(errors));
            }
        }

        if self.draft {
            output::progress(
                format!("{} {} draft release updated", self.ident.slug(), self.tag()),
                verbosity,
            );
            return Ok(release);
        }

        let published = publish(forge.as_ref(), self.tag()).await?;
        output::progress(format!("{} released!", self.ident), verbosity);
        Ok(published)
    }
}

/// Make sure `tag` exists on the remote and points at `sha`.
///
/// A non-empty `message` creates an annotated tag.
pub async fn ensure_tag(
    forge: &dyn Forge,
    tag: &str,
    sha: &Oid,
    message: &str,
) -> Result<(), ReleaseError> {
    let existing = forge
        .get_tag_ref(tag)
        .await
        .map_err(ReleaseError::during("tag"))?;

    if let Some(tag_ref) = existing {
        let target = match tag_ref.kind {
            ObjectKind::Commit => tag_ref.target,
            ObjectKind::Tag => forge
                .get_tag_object(&tag_ref.target)
                .await
                .map_err(ReleaseError::during("tag"))?
                .map(|object| object.target)
                .unwrap_or(tag_ref.target),
        };
        if &target != sha {
            return Err(ReleaseError::TagConflict {
                tag: tag.to_string(),
                existing: target,
                requested: sha.clone(),
            });
        }
        return Ok(());
    }

    let known = forge
        .commit_exists(sha)
        .await
        .map_err(ReleaseError::during("tag"))?;
    if !known {
        return Err(ReleaseError::CommitNotPushed(sha.clone()));
    }

    let target = if message.is_empty() {
        sha.clone()
    } else {
        forge
            .create_tag_object(CreateTagRequest {
                tag: tag.to_string(),
                message: message.to_string(),
                target: sha.clone(),
            })
            .await
            .map_err(ReleaseError::during("tag"))?
            .sha
    };

    forge
        .create_tag_ref(tag, &target)
        .await
        .map_err(ReleaseError::during("tag"))?;
    Ok(())
}

/// Find the release for the spec's tag, drafts included, or create a draft.
async fn ensure_draft(forge: &dyn Forge, spec: &ReleaseSpec) -> Result<Release, ReleaseError> {
    if let Some(release) = find_release(forge, spec.tag(), "draft release").await? {
        return Ok(release);
    }
    forge
        .create_release(CreateReleaseRequest {
            tag_name: spec.tag().to_string(),
            name: spec.name.clone(),
            body: spec.body.clone(),
            draft: true,
            prerelease: spec.prerelease,
        })
        .await
        .map_err(ReleaseError::during("draft release"))
}

/// Publish the release for `tag` if it is still a draft.
async fn publish(forge: &dyn Forge, tag: &str) -> Result<Release, ReleaseError> {
    let release = find_release(forge, tag, "publish release")
        .await?
        .ok_or_else(|| ReleaseError::NotFound(format!("release {}", tag)))?;
    if !release.draft {
        return Ok(release);
    }
    forge
        .publish_release(release.id)
        .await
        .map_err(ReleaseError::during("publish release"))
}

// Lookup by tag does not see drafts, so search the full listing
async fn find_release(
    forge: &dyn Forge,
    tag: &str,
    step: &'static str,
) -> Result<Option<Release>, ReleaseError> {
    let releases = forge
        .list_releases()
        .await
        .map_err(ReleaseError::during(step))?;
    Ok(releases.into_iter().find(|r| r.tag_name == tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::mock::{FailOn, MockForge, MockOperation};
    use crate::forge::ForgeError;
    use tempfile::TempDir;

    fn oid(c: char) -> Oid {
        Oid::new(c.to_string().repeat(40)).unwrap()
    }

    fn spec(tag: &str, sha: Oid) -> ReleaseSpec {
        ReleaseSpec {
            ident: Ident::new("acme", "tool").with_tag(tag),
            sha,
            name: tag.to_string(),
            body: "- first\n".to_string(),
            draft: false,
            prerelease: false,
            uploads: Vec::new(),
            keep_paths: false,
            workers: 2,
        }
    }

    fn forge_with_commit(sha: &Oid) -> MockForge {
        let forge = MockForge::for_repo("acme", "tool");
        forge.push_commit(sha);
        forge
    }

    fn files(dir: &TempDir, names: &[&str]) -> Vec<PathBuf> {
        names
            .iter()
            .map(|name| {
                let path = dir.path().join(name);
                std::fs::write(&path, name.as_bytes()).unwrap();
                path
            })
            .collect()
    }

    mod tagging {
        use super::*;

        #[tokio::test]
        async fn creates_annotated_tag() {
            let sha = oid('a');
            let forge = forge_with_commit(&sha);

            ensure_tag(&forge, "v1.0.0", &sha, "release v1.0.0").await.unwrap();

            let objects = forge.tag_objects();
            assert_eq!(objects.len(), 1);
            assert_eq!(objects[0].target, sha);
            assert_eq!(objects[0].message, "release v1.0.0");
            let refs = forge.tag_refs();
            assert_eq!(refs[0].kind, ObjectKind::Tag);
            assert_eq!(refs[0].target, objects[0].sha);
        }

        #[tokio::test]
        async fn empty_message_creates_lightweight_tag() {
            let sha = oid('a');
            let forge = forge_with_commit(&sha);

            ensure_tag(&forge, "v1", &sha, "").await.unwrap();

            assert!(forge.tag_objects().is_empty());
            assert_eq!(forge.tag_refs()[0].kind, ObjectKind::Commit);
        }

        #[tokio::test]
        async fn existing_tag_on_same_commit_is_noop() {
            let sha = oid('a');
            let forge = forge_with_commit(&sha);
            ensure_tag(&forge, "v1", &sha, "release v1").await.unwrap();
            forge.clear_operations();

            ensure_tag(&forge, "v1", &sha, "release v1").await.unwrap();

            assert_eq!(forge.tag_refs().len(), 1);
            assert!(!forge
                .operations()
                .iter()
                .any(|op| matches!(op, MockOperation::CreateTagRef { .. })));
        }

        #[tokio::test]
        async fn existing_tag_elsewhere_conflicts() {
            let (a, b) = (oid('a'), oid('b'));
            let forge = forge_with_commit(&a);
            forge.push_commit(&b);
            ensure_tag(&forge, "v1", &a, "release v1").await.unwrap();

            let err = ensure_tag(&forge, "v1", &b, "release v1").await.unwrap_err();
            match err {
                ReleaseError::TagConflict {
                    existing,
                    requested,
                    ..
                } => {
                    assert_eq!(existing, a);
                    assert_eq!(requested, b);
                }
                other => panic!("expected conflict, got {other:?}"),
            }
            assert_eq!(forge.tag_refs().len(), 1);
        }

        #[tokio::test]
        async fn unpushed_commit() {
            let forge = MockForge::for_repo("acme", "tool");
            let err = ensure_tag(&forge, "v1", &oid('c'), "m").await.unwrap_err();
            assert!(matches!(err, ReleaseError::CommitNotPushed(_)));
            assert_eq!(
                err.to_string(),
                format!("sha {} not found, is the commit pushed?", oid('c'))
            );
        }

        #[tokio::test]
        async fn forge_failure_names_step() {
            let sha = oid('a');
            let forge = forge_with_commit(&sha).fail_on(FailOn::CreateTagRef(ForgeError::RateLimited));
            let err = ensure_tag(&forge, "v1", &sha, "m").await.unwrap_err();
            assert_eq!(err.to_string(), "tag: rate limited");
        }
    }

    mod full_run {
        use super::*;

        #[tokio::test]
        async fn publishes_with_assets() {
            let sha = oid('a');
            let forge = forge_with_commit(&sha);
            let dir = TempDir::new().unwrap();
            let mut s = spec("v1.0.0", sha);
            s.uploads = files(&dir, &["a.tar.gz", "b.tar.gz", "c.txt"]);

            let release = s.run(Arc::new(forge.clone()), Verbosity::Quiet).await.unwrap();

            assert!(!release.draft);
            assert_eq!(release.tag_name, "v1.0.0");
            assert_eq!(release.body, "- first\n");
            let mut names: Vec<_> = forge.releases()[0]
                .assets
                .iter()
                .map(|a| a.name.clone())
                .collect();
            names.sort();
            assert_eq!(names, ["a.tar.gz", "b.tar.gz", "c.txt"]);
        }

        #[tokio::test]
        async fn second_run_changes_nothing() {
            let sha = oid('a');
            let forge = forge_with_commit(&sha);
            let dir = TempDir::new().unwrap();
            let mut s = spec("v1.0.0", sha);
            s.uploads = files(&dir, &["a.bin", "b.bin"]);

            s.clone().run(Arc::new(forge.clone()), Verbosity::Quiet).await.unwrap();
            let refs = forge.tag_refs();
            let objects = forge.tag_objects();
            let releases = forge.releases();

            s.run(Arc::new(forge.clone()), Verbosity::Quiet).await.unwrap();

            assert_eq!(forge.tag_refs(), refs);
            assert_eq!(forge.tag_objects(), objects);
            assert_eq!(forge.releases(), releases);
        }

        #[tokio::test]
        async fn draft_stays_draft() {
            let sha = oid('a');
            let forge = forge_with_commit(&sha);
            let mut s = spec("v2", sha);
            s.draft = true;
            s.prerelease = true;

            let release = s.run(Arc::new(forge.clone()), Verbosity::Quiet).await.unwrap();

            assert!(release.draft);
            assert!(release.prerelease);
            assert!(!forge
                .operations()
                .iter()
                .any(|op| matches!(op, MockOperation::PublishRelease { .. })));
        }

        #[tokio::test]
        async fn resumes_a_left_over_draft() {
            let sha = oid('a');
            let forge = forge_with_commit(&sha);
            let mut first = spec("v3", sha.clone());
            first.draft = true;
            first.run(Arc::new(forge.clone()), Verbosity::Quiet).await.unwrap();

            let release = spec("v3", sha)
                .run(Arc::new(forge.clone()), Verbosity::Quiet)
                .await
                .unwrap();

            assert!(!release.draft);
            assert_eq!(forge.releases().len(), 1);
        }

        #[tokio::test]
        async fn upload_failures_leave_draft_unpublished() {
            let sha = oid('a');
            let forge = forge_with_commit(&sha)
                .fail_on(FailOn::UploadAsset {
                    name: "a.bin".into(),
                    error: ForgeError::NetworkError("reset".into()),
                })
                .fail_on(FailOn::UploadAsset {
                    name: "b.bin".into(),
                    error: ForgeError::RateLimited,
                });
            let dir = TempDir::new().unwrap();
            let mut s = spec("v1", sha);
            s.uploads = files(&dir, &["a.bin", "b.bin", "c.bin"]);

            let err = s.run(Arc::new(forge.clone()), Verbosity::Quiet).await.unwrap_err();

            match err {
                ReleaseError::UploadsFailed(errors) => assert_eq!(errors.len(), 2),
                other => panic!("expected upload failures, got {other:?}"),
            }
            let release = &forge.releases()[0];
            assert!(release.draft);
            assert_eq!(release.assets.len(), 1);
        }

        #[tokio::test]
        async fn publish_failure_names_step() {
            let sha = oid('a');
            let forge = forge_with_commit(&sha).fail_on(FailOn::PublishRelease(ForgeError::AuthFailed(
                "bad credentials".into(),
            )));
            let err = spec("v1", sha)
                .run(Arc::new(forge), Verbosity::Quiet)
                .await
                .unwrap_err();
            assert!(err.to_string().starts_with("publish release: "));
        }
    }

    #[test]
    fn upload_names() {
        let mut s = spec("v1", oid('a'));
        let path = Path::new("dist/linux/tool.tar.gz");
        assert_eq!(s.upload_name(path), "tool.tar.gz");
        s.keep_paths = true;
        assert_eq!(s.upload_name(path), "dist/linux/tool.tar.gz");
    }
}
