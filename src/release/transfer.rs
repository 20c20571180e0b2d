//! release::transfer
//!
//! Fixed-size pool of upload and download workers.
//!
//! # Design
//!
//! Jobs go into one unbounded channel. `workers` tasks share the receiving
//! end and pull jobs until the channel is closed and empty. A job carries
//! the forge it talks to, so one pool can serve several repositories. Each worker
//! returns the errors of the jobs it ran, so [`TransferPool::drain`] can
//! report every failure rather than only the first.
//!
//! `drain` takes the pool by value: once drained, nothing can be enqueued.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use super::query::ResolvedAsset;
use crate::forge::{Forge, ForgeError, Release};
use crate::ui::output::{self, Verbosity};

/// Errors from a single transfer job.
#[derive(Debug, Error)]
pub enum TransferError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{name}: {source}")]
    Forge {
        name: String,
        #[source]
        source: ForgeError,
    },

    /// A same-named asset exists with a different size. Never overwritten.
    #[error("release asset {tag} {name} exists and is a different size to {}", local.display())]
    AssetConflict {
        tag: String,
        name: String,
        local: PathBuf,
    },

    #[error("transfer worker failed: {0}")]
    Worker(String),

    #[error("transfer pool is closed")]
    Closed,
}

/// Where a downloaded asset goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    Stdout,
    /// Written to `<dir>/<destination>`
    Dir(PathBuf),
}

/// One unit of work for the pool.
#[derive(Clone)]
pub enum Job {
    /// Attach `local` to `release` as `name`.
    Upload {
        forge: Arc<dyn Forge>,
        release: Arc<Release>,
        name: String,
        local: PathBuf,
    },
    /// Fetch a resolved asset.
    Download {
        forge: Arc<dyn Forge>,
        asset: ResolvedAsset,
        target: DownloadTarget,
    },
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Job::Upload { name, local, .. } => f
                .debug_struct("Upload")
                .field("name", name)
                .field("local", local)
                .finish(),
            Job::Download { asset, target, .. } => f
                .debug_struct("Download")
                .field("ident", &asset.ident)
                .field("target", target)
                .finish(),
        }
    }
}

/// A running pool of transfer workers.
pub struct TransferPool {
    sender: mpsc::UnboundedSender<Job>,
    workers: JoinSet<Vec<TransferError>>,
}

impl std::fmt::Debug for TransferPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransferPool")
            .field("workers", &self.workers.len())
            .finish()
    }
}

impl TransferPool {
    /// Start `workers` tasks (at least one) on the current runtime.
    pub fn new(workers: usize, verbosity: Verbosity) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel::<Job>();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut set = JoinSet::new();
        for _ in 0..workers.max(1) {
            let receiver = Arc::clone(&receiver);
            set.spawn(async move {
                let mut errors = Vec::new();
                loop {
                    // Hold the lock only while waiting for the next job
                    let job = receiver.lock().await.recv().await;
                    let Some(job) = job else { break };
                    if let Err(e) = run_job(job, verbosity).await {
                        output::debug(format!("transfer failed: {}", e), verbosity);
                        errors.push(e);
                    }
                }
                errors
            });
        }

        Self {
            sender,
            workers: set,
        }
    }

    /// Queue a job. Never blocks.
    pub fn enqueue(&self, job: Job) -> Result<(), TransferError> {
        self.sender.send(job).map_err(|_| TransferError::Closed)
    }

    /// Close the queue, wait for every job, and return all failures.
    pub async fn drain(self) -> Vec<TransferError> {
        let Self {
            sender,
            mut workers,
        } = self;
        drop(sender);

        let mut errors = Vec::new();
        while let Some(result) = workers.join_next().await {
            match result {
                Ok(mut failed) => errors.append(&mut failed),
                Err(e) => errors.push(TransferError::Worker(e.to_string())),
            }
        }
        errors
    }
}

async fn run_job(job: Job, verbosity: Verbosity) -> Result<(), TransferError> {
    match job {
        Job::Upload {
            forge,
            release,
            name,
            local,
        } => upload(forge.as_ref(), &release, &name, local, verbosity).await,
        Job::Download {
            forge,
            asset,
            target,
        } => download(forge.as_ref(), &asset, &target, verbosity).await,
    }
}

async fn upload(
    forge: &dyn Forge,
    release: &Release,
    name: &str,
    local: PathBuf,
    verbosity: Verbosity,
) -> Result<(), TransferError> {
    let io_err = |source| TransferError::Io {
        path: local.clone(),
        source,
    };
    let size = tokio::fs::metadata(&local).await.map_err(io_err)?.len();

    if let Some(existing) = release.asset(name) {
        if existing.size == size {
            output::debug(format!("{} already uploaded, skipping", name), verbosity);
            return Ok(());
        }
        return Err(TransferError::AssetConflict {
            tag: release.tag_name.clone(),
            name: name.to_string(),
            local: local.clone(),
        });
    }

    let file = File::open(&local).await.map_err(io_err)?;
    forge
        .upload_asset(release, name, file, size)
        .await
        .map_err(|source| TransferError::Forge {
            name: name.to_string(),
            source,
        })?;
    Ok(())
}

async fn download(
    forge: &dyn Forge,
    resolved: &ResolvedAsset,
    target: &DownloadTarget,
    verbosity: Verbosity,
) -> Result<(), TransferError> {
    output::progress(format!("get {}", resolved.ident), verbosity);

    let forge_err = |source| TransferError::Forge {
        name: resolved.asset.name.clone(),
        source,
    };
    match target {
        DownloadTarget::Stdout => {
            let mut stdout = tokio::io::stdout();
            forge
                .download_asset(&resolved.asset, &mut stdout)
                .await
                .map_err(forge_err)?;
            stdout.flush().await.map_err(|source| TransferError::Io {
                path: PathBuf::from("-"),
                source,
            })
        }
        DownloadTarget::Dir(dir) => {
            let path = dir.join(resolved.destination());
            let mut file = File::create(&path)
                .await
                .map_err(|source| TransferError::Io {
                    path: path.clone(),
                    source,
                })?;
            let written = forge.download_asset(&resolved.asset, &mut file).await;
            let flushed = match written {
                Ok(_) => file.flush().await,
                Err(e) => {
                    // Partial downloads are removed
                    drop(file);
                    let _ = tokio::fs::remove_file(&path).await;
                    return Err(forge_err(e));
                }
            };
            flushed.map_err(|source| TransferError::Io { path, source })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ident::{Ident, IdentDefaults};
    use crate::forge::mock::{FailOn, MockForge};
    use crate::forge::CreateReleaseRequest;
    use tempfile::TempDir;

    async fn draft(forge: &MockForge, tag: &str) -> Arc<Release> {
        let release = forge
            .create_release(CreateReleaseRequest {
                tag_name: tag.into(),
                name: tag.into(),
                body: String::new(),
                draft: true,
                prerelease: false,
            })
            .await
            .unwrap();
        Arc::new(release)
    }

    fn write_files(dir: &TempDir, count: usize) -> Vec<PathBuf> {
        (0..count)
            .map(|i| {
                let path = dir.path().join(format!("file-{}.bin", i));
                std::fs::write(&path, vec![b'x'; i + 1]).unwrap();
                path
            })
            .collect()
    }

    mod uploads {
        use super::*;

        #[tokio::test]
        async fn all_jobs_complete() {
            let forge = MockForge::for_repo("acme", "tool");
            let release = draft(&forge, "v1").await;
            let dir = TempDir::new().unwrap();
            let files = write_files(&dir, 7);

            let pool = TransferPool::new(3, Verbosity::Quiet);
            for path in &files {
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                pool.enqueue(Job::Upload {
                    forge: Arc::new(forge.clone()),
                    release: Arc::clone(&release),
                    name,
                    local: path.clone(),
                })
                .unwrap();
            }

            assert!(pool.drain().await.is_empty());
            assert_eq!(forge.releases()[0].assets.len(), 7);
        }

        #[tokio::test]
        async fn failures_are_collected_per_job() {
            let forge = MockForge::for_repo("acme", "tool")
                .fail_on(FailOn::UploadAsset {
                    name: "file-1.bin".into(),
                    error: ForgeError::RateLimited,
                })
                .fail_on(FailOn::UploadAsset {
                    name: "file-4.bin".into(),
                    error: ForgeError::NetworkError("reset".into()),
                });
            let release = draft(&forge, "v1").await;
            let dir = TempDir::new().unwrap();
            let mut files = write_files(&dir, 6);
            files.push(dir.path().join("missing.bin"));

            let pool = TransferPool::new(2, Verbosity::Quiet);
            for path in &files {
                let name = path.file_name().unwrap().to_string_lossy().into_owned();
                pool.enqueue(Job::Upload {
                    forge: Arc::new(forge.clone()),
                    release: Arc::clone(&release),
                    name,
                    local: path.clone(),
                })
                .unwrap();
            }

            let errors = pool.drain().await;
            assert_eq!(errors.len(), 3);
            assert_eq!(
                errors
                    .iter()
                    .filter(|e| matches!(e, TransferError::Forge { .. }))
                    .count(),
                2
            );
            assert!(errors.iter().any(|e| matches!(e, TransferError::Io { .. })));
            assert_eq!(forge.releases()[0].assets.len(), 4);
        }

        #[tokio::test]
        async fn large_file_is_stored_whole() {
            let forge = MockForge::for_repo("acme", "tool");
            let release = draft(&forge, "v1").await;
            let dir = TempDir::new().unwrap();
            let data: Vec<u8> = (0..3 * 1024 * 1024).map(|i| (i % 253) as u8).collect();
            let path = dir.path().join("big.bin");
            std::fs::write(&path, &data).unwrap();

            let pool = TransferPool::new(1, Verbosity::Quiet);
            pool.enqueue(Job::Upload {
                forge: Arc::new(forge.clone()),
                release,
                name: "big.bin".into(),
                local: path,
            })
            .unwrap();

            assert!(pool.drain().await.is_empty());
            let stored = &forge.releases()[0].assets[0];
            assert_eq!(stored.size, data.len() as u64);
            assert_eq!(forge.asset_data(stored.id).unwrap(), data);
        }

        #[tokio::test]
        async fn same_size_asset_is_skipped() {
            let forge = MockForge::for_repo("acme", "tool");
            let created = draft(&forge, "v1").await;
            forge.seed_asset(created.id, "file-0.bin", b"x").unwrap();
            let release = Arc::new(forge.releases()[0].clone());

            let dir = TempDir::new().unwrap();
            let files = write_files(&dir, 1);
            let pool = TransferPool::new(1, Verbosity::Quiet);
            pool.enqueue(Job::Upload {
                forge: Arc::new(forge.clone()),
                release,
                name: "file-0.bin".into(),
                local: files[0].clone(),
            })
            .unwrap();

            assert!(pool.drain().await.is_empty());
            assert_eq!(forge.releases()[0].assets.len(), 1);
        }

        #[tokio::test]
        async fn different_size_asset_conflicts() {
            let forge = MockForge::for_repo("acme", "tool");
            let created = draft(&forge, "v1").await;
            forge.seed_asset(created.id, "file-0.bin", b"longer").unwrap();
            let release = Arc::new(forge.releases()[0].clone());

            let dir = TempDir::new().unwrap();
            let files = write_files(&dir, 1);
            let pool = TransferPool::new(1, Verbosity::Quiet);
            pool.enqueue(Job::Upload {
                forge: Arc::new(forge.clone()),
                release,
                name: "file-0.bin".into(),
                local: files[0].clone(),
            })
            .unwrap();

            let errors = pool.drain().await;
            assert_eq!(errors.len(), 1);
            assert!(errors[0]
                .to_string()
                .starts_with("release asset v1 file-0.bin exists and is a different size to"));
            assert_eq!(forge.asset_data(forge.releases()[0].assets[0].id).unwrap(), b"longer");
        }
    }

    mod downloads {
        use super::*;

        #[tokio::test]
        async fn writes_to_destination() {
            let forge = MockForge::for_repo("acme", "tool");
            let release = draft(&forge, "v1").await;
            let asset = forge.seed_asset(release.id, "tool.tar.gz", b"payload").unwrap();

            let ident = Ident::parse("acme/tool@v1:tool.tar.gz:out.tgz", &IdentDefaults::default())
                .unwrap();
            let dir = TempDir::new().unwrap();

            let pool = TransferPool::new(2, Verbosity::Quiet);
            pool.enqueue(Job::Download {
                forge: Arc::new(forge.clone()),
                asset: ResolvedAsset { ident, asset },
                target: DownloadTarget::Dir(dir.path().to_path_buf()),
            })
            .unwrap();

            assert!(pool.drain().await.is_empty());
            assert_eq!(std::fs::read(dir.path().join("out.tgz")).unwrap(), b"payload");
        }

        #[tokio::test]
        async fn failed_download_is_reported() {
            let forge = MockForge::for_repo("acme", "tool").fail_on(FailOn::DownloadAsset {
                name: "tool.tar.gz".into(),
                error: ForgeError::NotFound("asset".into()),
            });
            let release = draft(&forge, "v1").await;
            let asset = forge.seed_asset(release.id, "tool.tar.gz", b"payload").unwrap();
            let ident = Ident::new("acme", "tool").with_asset("tool.tar.gz");
            let dir = TempDir::new().unwrap();

            let pool = TransferPool::new(1, Verbosity::Quiet);
            pool.enqueue(Job::Download {
                forge: Arc::new(forge.clone()),
                asset: ResolvedAsset { ident, asset },
                target: DownloadTarget::Dir(dir.path().to_path_buf()),
            })
            .unwrap();

            let errors = pool.drain().await;
            assert_eq!(errors.len(), 1);
            // The destination is created before the transfer and removed on failure
            assert!(!dir.path().join("tool.tar.gz").exists());
        }
    }

    #[tokio::test]
    async fn zero_workers_still_runs_jobs() {
        let forge = MockForge::for_repo("acme", "tool");
        let release = draft(&forge, "v1").await;
        let dir = TempDir::new().unwrap();
        let files = write_files(&dir, 2);

        let pool = TransferPool::new(0, Verbosity::Quiet);
        for (i, path) in files.iter().enumerate() {
            pool.enqueue(Job::Upload {
                forge: Arc::new(forge.clone()),
                release: Arc::clone(&release),
                name: format!("a{}", i),
                local: path.clone(),
            })
            .unwrap();
        }
        assert!(pool.drain().await.is_empty());
        assert_eq!(forge.releases()[0].assets.len(), 2);
    }
}
