//! Applying loaders in precedence order.

use tracing::{debug, warn};

use crate::context::Context;
use crate::descriptor::Configurable;
use crate::error::{ErrorKind, LoadError, LoadResult};
use crate::loader::{Consul, Defaults, Env, File, Flags, Loader, Vault};

/// The standard precedence: defaults, Consul, Vault, file, environment, then
/// command-line flags. Later loaders override earlier ones field by field.
#[must_use]
pub fn default_loaders() -> Vec<Box<dyn Loader>> {
    vec![
        Box::new(Defaults),
        Box::new(Consul::new()),
        Box::new(Vault::new()),
        Box::new(File::new()),
        Box::new(Env),
        Box::new(Flags::new()),
    ]
}

/// Applies `loaders` to `target` in order.
///
/// The context is checked before each loader; once it has finished the load
/// stops and succeeds with whatever was bound so far. Unavailable sources are
/// logged and skipped. Any other failure is attributed to its loader and ends
/// the load, keeping the fields bound before it.
///
/// # Errors
///
/// Returns [`LoadError::Loader`] wrapping the first fatal failure.
///
/// # Examples
///
/// ```
/// use layered_config::{Context, Defaults, Env, Layered, Loader, load_with_loaders};
///
/// #[derive(Debug, Default, Layered)]
/// struct Settings {
///     #[layered(default = "info")]
///     log_level: String,
/// }
///
/// # tokio::runtime::Builder::new_current_thread().build()?.block_on(async {
/// let loaders: Vec<Box<dyn Loader>> = vec![Box::new(Defaults), Box::new(Env)];
/// let mut settings = Settings::default();
/// load_with_loaders(&Context::background(), "svc", &mut settings, &loaders).await?;
/// assert!(!settings.log_level.is_empty());
/// # Ok::<(), layered_config::LoadError>(())
/// # })?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub async fn load_with_loaders(
    ctx: &Context,
    app_name: &str,
    target: &mut dyn Configurable,
    loaders: &[Box<dyn Loader>],
) -> LoadResult<()> {
    for loader in loaders {
        if let Some(cause) = ctx.cause() {
            debug!(loader = loader.name(), %cause, "load stopped before loader");
            return Ok(());
        }
        let Err(err) = loader.load(ctx, app_name, target).await else {
            continue;
        };
        match err.kind() {
            ErrorKind::Unavailable => {
                warn!(loader = loader.name(), error = %err, "source unavailable, skipping");
            }
            ErrorKind::Canceled => {
                debug!(loader = loader.name(), error = %err, "load interrupted");
                return Ok(());
            }
            _ => return Err(LoadError::loader(loader.name(), err)),
        }
    }
    debug!(app = app_name, "configuration loaded");
    Ok(())
}

/// Loads `target` from [`default_loaders`].
///
/// # Errors
///
/// See [`load_with_loaders`].
pub async fn load_config(
    ctx: &Context,
    app_name: &str,
    target: &mut dyn Configurable,
) -> LoadResult<()> {
    load_with_loaders(ctx, app_name, target, &default_loaders()).await
}

/// Loads `target` from [`default_loaders`] on a private current-thread
/// runtime, for programs without one.
///
/// Must not be called from within an async runtime.
///
/// # Errors
///
/// See [`load_with_loaders`]. Failing to start the runtime is reported as a
/// [`LoadError::Remote`].
pub fn load_config_blocking(app_name: &str, target: &mut dyn Configurable) -> LoadResult<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| crate::StoreError::other(format!("cannot start runtime: {err}")))?;
    runtime.block_on(load_config(&Context::background(), app_name, target))
}
