//! Helpers for safely mutating environment variables in tests.
//!
//! Every mutation takes a global re-entrant mutex and returns an RAII guard
//! that restores the previous state on drop, removing the variable if it was
//! absent before. Guards for the same key restore in LIFO order.
//!
//! Loaders read several variables per load (`CONFIG_PATH`, the
//! `CONSUL_HTTP_*` family, one name per field), so tests that need a stable
//! environment for a whole load should hold an [`EnvScope`].
//!
//! # Examples
//!
//! ```
//! use layered_config_test_helpers::env;
//!
//! let _g = env::set_var("KEY", "VALUE");
//! // `KEY` is set to `VALUE` for the duration of the guard.
//! ```

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use std::env;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::sync::LazyLock;

static ENV_MUTEX: LazyLock<ReentrantMutex<()>> = LazyLock::new(ReentrantMutex::default);

/// Applies `value` to `key`, removing it when `value` is `None`.
///
/// # Safety
///
/// Callers must hold `ENV_MUTEX`.
unsafe fn write_var(key: &str, value: Option<&OsStr>) {
    match value {
        Some(value) => unsafe { env::set_var(key, value) },
        None => unsafe { env::remove_var(key) },
    }
}

fn replace_locked(
    key: String,
    value: Option<&OsStr>,
    _lock: &ReentrantMutexGuard<'static, ()>,
) -> EnvVarGuard {
    let original = env::var_os(&key);
    // SAFETY: the caller holds `ENV_MUTEX`.
    unsafe { write_var(&key, value) };
    EnvVarGuard { key, original }
}

/// RAII guard restoring an environment variable to its prior value on drop.
#[must_use = "dropping restores the prior value"]
pub struct EnvVarGuard {
    key: String,
    original: Option<OsString>,
}

impl fmt::Debug for EnvVarGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvVarGuard")
            .field("key", &self.key)
            .field("had_original", &self.original.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        let _lock = ENV_MUTEX.lock();
        let original = self.original.take();
        // SAFETY: `ENV_MUTEX` is held for the restoration.
        unsafe { write_var(&self.key, original.as_deref()) };
    }
}

/// Exclusive access to the environment for the lifetime of the value.
#[must_use = "dropping releases the environment lock"]
pub struct EnvVarLock {
    guard: ReentrantMutexGuard<'static, ()>,
}

impl EnvVarLock {
    /// Sets `key` while holding the lock.
    pub fn set_var<K, V>(&self, key: K, value: V) -> EnvVarGuard
    where
        K: Into<String>,
        V: AsRef<OsStr>,
    {
        replace_locked(key.into(), Some(value.as_ref()), &self.guard)
    }

    /// Removes `key` while holding the lock.
    pub fn remove_var<K>(&self, key: K) -> EnvVarGuard
    where
        K: Into<String>,
    {
        replace_locked(key.into(), None, &self.guard)
    }
}

/// Holds the environment lock together with the guards created under it.
///
/// Guards are restored before the lock is released.
#[must_use = "dropping releases the environment lock and restores guards"]
pub struct EnvScope {
    guards: Vec<EnvVarGuard>,
    _lock: EnvVarLock,
}

impl Drop for EnvScope {
    fn drop(&mut self) {
        drop(std::mem::take(&mut self.guards));
    }
}

/// Sets an environment variable and returns a guard restoring its prior value.
///
/// # Examples
/// ```
/// use layered_config_test_helpers::env;
/// let _g = env::set_var("FOO", "bar");
/// assert!(matches!(std::env::var("FOO"), Ok(ref value) if value == "bar"));
/// ```
pub fn set_var<K, V>(key: K, value: V) -> EnvVarGuard
where
    K: Into<String>,
    V: AsRef<OsStr>,
{
    lock().set_var(key, value)
}

/// Removes an environment variable and returns a guard restoring its prior
/// value.
///
/// # Examples
/// ```
/// use layered_config_test_helpers::env;
/// let _g = env::remove_var("FOO");
/// assert!(std::env::var("FOO").is_err());
/// ```
pub fn remove_var<K>(key: K) -> EnvVarGuard
where
    K: Into<String>,
{
    lock().remove_var(key)
}

/// Acquires the global environment lock.
pub fn lock() -> EnvVarLock {
    EnvVarLock {
        guard: ENV_MUTEX.lock(),
    }
}

/// Runs `builder` under the lock and keeps both the lock and the guards it
/// returns until the scope is dropped.
///
/// # Examples
/// ```
/// use layered_config_test_helpers::env;
///
/// let _scope = env::scope_with(|lock| {
///     vec![lock.set_var("DBHOST", "db.internal"), lock.remove_var("CONFIG_PATH")]
/// });
/// assert_eq!(std::env::var("DBHOST").as_deref(), Ok("db.internal"));
/// ```
pub fn scope_with<F>(builder: F) -> EnvScope
where
    F: FnOnce(&EnvVarLock) -> Vec<EnvVarGuard>,
{
    let lock = lock();
    let guards = builder(&lock);
    EnvScope {
        guards,
        _lock: lock,
    }
}

#[cfg(test)]
mod tests;
