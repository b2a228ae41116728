//! Helpers for safely changing the process working directory in tests.
//!
//! The working directory is process-global, so the guard holds a global
//! mutex for its whole lifetime and restores the original directory on drop.
//!
//! # Examples
//!
//! ```no_run
//! use layered_config_test_helpers::cwd;
//!
//! let guard = cwd::set_dir("/tmp/test-dir")?;
//! // Relative lookups now resolve against `/tmp/test-dir`.
//! guard.restore()?;
//! # Ok::<(), anyhow::Error>(())
//! ```

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use parking_lot::{Mutex, MutexGuard};

static CWD_MUTEX: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

/// RAII guard that restores the working directory on drop.
#[must_use = "dropping restores the prior working directory"]
pub struct CwdGuard {
    original: PathBuf,
    _lock: MutexGuard<'static, ()>,
}

impl CwdGuard {
    /// Restores the original working directory, reporting failures.
    ///
    /// # Errors
    ///
    /// Returns an error if `set_current_dir` fails.
    pub fn restore(&self) -> std::io::Result<()> {
        std::env::set_current_dir(&self.original)
    }
}

impl Drop for CwdGuard {
    fn drop(&mut self) {
        // Best effort; call `restore` to observe failures.
        let _unused = std::env::set_current_dir(&self.original);
    }
}

/// Changes the working directory to `path` until the guard is dropped.
///
/// # Errors
///
/// Returns an error if the current directory cannot be read or `path`
/// cannot be entered.
pub fn set_dir(path: impl AsRef<Path>) -> Result<CwdGuard> {
    let lock = CWD_MUTEX.lock();
    let original = std::env::current_dir().context("read current dir")?;
    std::env::set_current_dir(path.as_ref())
        .with_context(|| format!("enter {}", path.as_ref().display()))?;
    Ok(CwdGuard {
        original,
        _lock: lock,
    })
}
