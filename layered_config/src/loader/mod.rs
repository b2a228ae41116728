//! Source loaders.
//!
//! Each loader retrieves raw values from one backing source and hands them
//! to the binder. A source that is simply not there reports an
//! [`ErrorKind::Unavailable`](crate::ErrorKind::Unavailable) error, which the
//! orchestrator skips; anything else is left for the orchestrator to wrap and
//! abort on.

mod consul;
mod defaults;
mod env;
mod file;
mod flags;
mod vault;

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;

use crate::context::Context;
use crate::descriptor::Configurable;
use crate::error::{HandlerError, LoadResult, WatchError};

pub use consul::{Consul, DEFAULT_PREFIX};
pub use defaults::Defaults;
pub use env::Env;
pub use file::{CONFIG_PATH_ENV, File};
pub use flags::Flags;
pub use vault::{GENERIC_PATH, Vault};

/// A ranked configuration source.
#[async_trait]
pub trait Loader: Send + Sync {
    /// Short identity used when logging and wrapping errors.
    fn name(&self) -> &'static str;

    /// Writes every value this source holds for `app_name` into `target`.
    ///
    /// Fields the source does not mention are left untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`LoadError`](crate::LoadError) describing why the source
    /// could not be applied.
    async fn load(
        &self,
        ctx: &Context,
        app_name: &str,
        target: &mut dyn Configurable,
    ) -> LoadResult<()>;
}

/// Callback receiving each new value of a watched key.
///
/// `None` means the key was removed.
pub type DynamicHandler = Box<dyn FnMut(Option<&[u8]>) -> Result<(), HandlerError> + Send>;

/// Refresh interval used when none is configured.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(30);

/// Parameters of one dynamic watch.
pub struct DynamicConfig {
    /// Application whose key space holds the field.
    pub app_name: String,
    /// Path of the field below the application, such as `loglevel` or
    /// `struct/inner/field`.
    pub field_name: String,
    /// Longest time one blocking query may be held by the store.
    pub refresh_interval: Duration,
    /// Called with every new value.
    pub handler: DynamicHandler,
}

impl DynamicConfig {
    /// Watches `field_name` of `app_name`, calling `handler` on each change.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Duration;
    ///
    /// use layered_config::DynamicConfig;
    ///
    /// let config = DynamicConfig::new("adm0001s", "loglevel", |value: Option<&[u8]>| {
    ///     let _level = value.map(String::from_utf8_lossy);
    ///     Ok(())
    /// })
    /// .refresh_interval(Duration::from_secs(5));
    /// assert_eq!(config.refresh_interval, Duration::from_secs(5));
    /// ```
    #[must_use]
    pub fn new<F>(app_name: impl Into<String>, field_name: impl Into<String>, handler: F) -> Self
    where
        F: FnMut(Option<&[u8]>) -> Result<(), HandlerError> + Send + 'static,
    {
        Self {
            app_name: app_name.into(),
            field_name: field_name.into(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            handler: Box::new(handler),
        }
    }

    /// Sets the refresh interval.
    #[must_use]
    pub const fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }
}

impl fmt::Debug for DynamicConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicConfig")
            .field("app_name", &self.app_name)
            .field("field_name", &self.field_name)
            .field("refresh_interval", &self.refresh_interval)
            .finish_non_exhaustive()
    }
}

/// A source able to watch a single key for changes.
#[async_trait]
pub trait DynamicValue: Send + Sync {
    /// Watches the configured key until the context finishes, the handler
    /// fails or the store fails.
    ///
    /// The handler runs once per new version of the key and never for a
    /// response that repeats the last seen version. The watch never ends
    /// successfully, so the reason it stopped is returned directly.
    async fn dynamic_value(&self, ctx: &Context, config: DynamicConfig) -> WatchError;
}
