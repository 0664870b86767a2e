//! Keg lock management
//!
//! Provides exclusive locking so two processes never install or remove
//! the same formula at once.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};

/// How old a lock file can be before it's considered stale (2 hours)
const STALE_LOCK_AGE_SECS: u64 = 7200;

/// Check if a lock file is stale (older than STALE_LOCK_AGE_SECS)
fn is_stale_lock(lock_path: &Path) -> bool {
    if let Ok(metadata) = std::fs::metadata(lock_path)
        && let Ok(modified) = metadata.modified()
        && let Ok(age) = std::time::SystemTime::now().duration_since(modified)
    {
        return age.as_secs() > STALE_LOCK_AGE_SECS;
    }
    false
}

/// Acquire an exclusive lock for formula `name` inside `cellar`.
/// Returns a guard that releases the lock when dropped.
pub fn acquire_keg_lock(cellar: &Path, name: &str) -> Result<KegLock> {
    std::fs::create_dir_all(cellar)
        .with_context(|| format!("Failed to create cellar: {}", cellar.display()))?;
    let lock_path = cellar.join(format!(".{}.lock", name));

    if lock_path.exists() && is_stale_lock(&lock_path) {
        let _ = std::fs::remove_file(&lock_path);
    }

    let lock_file = File::create(&lock_path)
        .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

    if lock_file.try_lock_exclusive().is_err() {
        return Err(anyhow::anyhow!(
            "Formula '{}' is already being installed by another process. \
             If this is incorrect, delete '{}'",
            name,
            lock_path.display()
        ));
    }

    Ok(KegLock {
        _file: lock_file,
        path: lock_path,
    })
}

/// RAII guard for a keg lock - releases the lock and deletes the lock file when dropped
#[derive(Debug)]
pub struct KegLock {
    _file: File,
    path: PathBuf,
}

impl KegLock {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for KegLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
