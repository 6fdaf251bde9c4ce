use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use gridstore_core::StoreError;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

/// Advisory locks keyed by file path.
///
/// Two layers guard the critical section "load whole file, mutate, rename":
/// an in-process mutex serializes tasks of this process, and an OS-level
/// exclusive flock on a `.lock` sidecar excludes other processes. Process
/// crash releases the flock automatically (the OS closes the descriptor).
#[derive(Debug, Default)]
pub(crate) struct PathLocks {
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

/// Guard for one lock acquisition. Dropping it releases the flock first,
/// then the in-process mutex.
#[derive(Debug)]
pub(crate) struct PathGuard {
    lock_file: Option<File>,
    _serial: OwnedMutexGuard<()>,
}

impl PathLocks {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn mutex_for(&self, path: &Path) -> Arc<Mutex<()>> {
        self.locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Acquire the lock for `path`, blocking until it is free.
    ///
    /// The flock only ever contends with other processes; in-process callers
    /// are already serialized by the mutex, so the blocking acquisition runs
    /// on the blocking pool without starving the runtime.
    pub(crate) async fn acquire(&self, path: &Path) -> Result<PathGuard, StoreError> {
        let serial = self.mutex_for(path).lock_owned().await;

        let lock_path = sidecar_path(path);
        if let Some(parent) = lock_path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::Lock(format!(
                    "failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let lock_file = tokio::task::spawn_blocking(move || -> Result<File, StoreError> {
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&lock_path)
                .map_err(|e| {
                    StoreError::Lock(format!(
                        "failed to open lock file {}: {}",
                        lock_path.display(),
                        e
                    ))
                })?;
            fs2::FileExt::lock_exclusive(&file).map_err(|e| {
                StoreError::Lock(format!(
                    "failed to lock {}: {}",
                    lock_path.display(),
                    e
                ))
            })?;
            Ok(file)
        })
        .await
        .map_err(|e| StoreError::Lock(format!("lock task failed: {}", e)))??;

        debug!("Acquired path lock for {}", path.display());
        Ok(PathGuard {
            lock_file: Some(lock_file),
            _serial: serial,
        })
    }
}

impl Drop for PathGuard {
    fn drop(&mut self) {
        if let Some(file) = self.lock_file.take() {
            let _ = fs2::FileExt::unlock(&file);
        }
    }
}

/// `{path}.lock` next to the store file.
fn sidecar_path(path: &Path) -> PathBuf {
    let mut os = path.as_os_str().to_os_string();
    os.push(".lock");
    PathBuf::from(os)
}
