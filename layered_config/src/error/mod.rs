//! Error types produced by loaders, collaborators and the dynamic watcher.

mod classify;
mod helpers;
mod types;

pub use classify::ErrorKind;
pub use helpers::is_display_request;
pub use types::{DecodeError, HandlerError, LoadError, StoreError, WatchError};

/// Result alias used by the loading entry points.
pub type LoadResult<T> = Result<T, LoadError>;
