//! Classification of errors into the skip/abort policy.

use super::types::{LoadError, WatchError};

/// How an error affects the surrounding operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The source is absent: no client configured, no file, or a local
    /// server that is not running. Loading skips the source.
    Unavailable,
    /// A value or document is malformed. Always fatal.
    Malformed,
    /// A reachable remote or the filesystem failed. Fatal.
    Remote,
    /// The caller canceled or the deadline passed.
    Canceled,
    /// A dynamic value handler failed.
    Handler,
}

impl LoadError {
    /// Classifies this error.
    ///
    /// Errors attributed to a loader classify as their source.
    ///
    /// # Examples
    ///
    /// ```
    /// use layered_config::{ErrorKind, LoadError, StoreError};
    ///
    /// let err = LoadError::loader("consul", StoreError::other("denied").into());
    /// assert_eq!(err.kind(), ErrorKind::Remote);
    /// assert_eq!(LoadError::no_client("unset").kind(), ErrorKind::Unavailable);
    /// ```
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NoClient { .. } | Self::NoConfigFile { .. } => ErrorKind::Unavailable,
            Self::Remote(store) if store.is_local_unreachable() => ErrorKind::Unavailable,
            Self::InvalidValue { .. }
            | Self::Decode { .. }
            | Self::CliParsing(_)
            | Self::InvalidFlag { .. } => ErrorKind::Malformed,
            Self::Remote(_) | Self::File { .. } => ErrorKind::Remote,
            Self::Canceled(_) => ErrorKind::Canceled,
            Self::Loader { source, .. } => source.kind(),
        }
    }
}

impl WatchError {
    /// Classifies this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::NoClient { .. } => ErrorKind::Unavailable,
            Self::Handler { .. } => ErrorKind::Handler,
            Self::Done(_) => ErrorKind::Canceled,
            Self::Store { source, .. } if source.is_local_unreachable() => ErrorKind::Unavailable,
            Self::Store { .. } => ErrorKind::Remote,
        }
    }
}
