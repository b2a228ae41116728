//! Error enums for loading, remote collaborators and watches.

use std::path::PathBuf;

use thiserror::Error;

use crate::context::Cause;
use crate::descriptor::SourceKind;
use crate::value::CoerceError;

/// Error returned by a dynamic value handler.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoadError {
    /// The source has no client because its connection settings are absent.
    #[error("no client available: {reason}")]
    NoClient {
        /// Which setting was missing.
        reason: String,
    },

    /// No configuration file exists in any searched location.
    #[error("no configuration file found for '{app_name}'")]
    NoConfigFile {
        /// Application whose file was searched for.
        app_name: String,
        /// Candidates inspected, in search order.
        searched: Vec<PathBuf>,
    },

    /// A retrieved or default value could not be coerced.
    #[error("invalid value for '{field}' from {source_kind}: {cause}")]
    InvalidValue {
        /// Dotted path of the field.
        field: String,
        /// Source that produced the value.
        source_kind: SourceKind,
        /// Coercion failure.
        #[source]
        cause: CoerceError,
    },

    /// Error originating from a configuration file.
    #[error("Configuration file error in '{path}': {source}")]
    File {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying error reported while reading.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A document could not be decoded.
    #[error("failed to decode {origin}: {source}")]
    Decode {
        /// Where the document came from.
        origin: String,
        /// Decoder failure.
        #[source]
        source: DecodeError,
    },

    /// Error parsing command-line arguments.
    #[error("Failed to parse command-line arguments: {0}")]
    CliParsing(#[from] Box<clap::Error>),

    /// Two fields map onto the same flag with different arities, or a flag
    /// name is unusable.
    #[error("invalid flag '--{name}': {reason}")]
    InvalidFlag {
        /// Offending flag name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A remote store reported a failure.
    #[error(transparent)]
    Remote(#[from] StoreError),

    /// The caller canceled the load while a source was in flight.
    #[error("load interrupted: {0}")]
    Canceled(Cause),

    /// A failure attributed to a named loader.
    #[error("{loader}: {source}")]
    Loader {
        /// Name of the loader that failed.
        loader: &'static str,
        /// The loader's error.
        #[source]
        source: Box<LoadError>,
    },
}

impl LoadError {
    /// Attributes `source` to `loader`.
    #[must_use]
    pub fn loader(loader: &'static str, source: Self) -> Self {
        Self::Loader {
            loader,
            source: Box::new(source),
        }
    }

    /// Builds a [`LoadError::File`] for `path`.
    #[must_use]
    pub fn file(
        path: impl Into<PathBuf>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::File {
            path: path.into(),
            source: source.into(),
        }
    }

    /// Builds a [`LoadError::NoClient`].
    #[must_use]
    pub fn no_client(reason: impl Into<String>) -> Self {
        Self::NoClient {
            reason: reason.into(),
        }
    }
}

impl From<clap::Error> for LoadError {
    fn from(e: clap::Error) -> Self {
        Self::CliParsing(Box::new(e))
    }
}

/// Failures reported by the key/value and secrets store collaborators.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The store could not be reached.
    #[error("cannot reach {address}: {message}")]
    Unreachable {
        /// Address that was dialled.
        address: String,
        /// Whether the address refers to this host.
        local: bool,
        /// Transport explanation.
        message: String,
    },

    /// The store answered with an error status.
    #[error("{address} responded with status {status}: {message}")]
    Status {
        /// Address that answered.
        address: String,
        /// HTTP status code.
        status: u16,
        /// Response body or reason.
        message: String,
    },

    /// The response could not be understood.
    #[error("invalid response from {address}: {message}")]
    InvalidResponse {
        /// Address that answered.
        address: String,
        /// What was wrong with it.
        message: String,
    },

    /// Any other failure, carried as a message.
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    /// Builds a [`StoreError::Other`].
    #[must_use]
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other(message.into())
    }

    /// Whether the failure means a store on this host is not running.
    #[must_use]
    pub const fn is_local_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable { local: true, .. })
    }
}

/// Failures decoding a structured document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// The document is not UTF-8.
    #[error("document is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// YAML syntax or type error.
    #[error("YAML: {0}")]
    Yaml(#[from] serde_saphyr::Error),

    /// JSON syntax or type error.
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML syntax or type error.
    #[error("TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// Layered documents could not be merged into one table.
    #[error("merge failed: {0}")]
    Merge(#[from] Box<figment::Error>),

    /// The document root is not a table.
    #[error("expected a map at the document root, found {found}")]
    NotAMap {
        /// Description of the root value.
        found: String,
    },
}

/// Reasons a dynamic watch stopped.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WatchError {
    /// The store has no client because its connection settings are absent.
    #[error("no client available: {reason}")]
    NoClient {
        /// Which setting was missing.
        reason: String,
    },

    /// The handler rejected a new value.
    #[error("dynamic value handler failed for '{key_path}': {source}")]
    Handler {
        /// Field path being watched.
        key_path: String,
        /// Handler failure.
        #[source]
        source: HandlerError,
    },

    /// The caller's context finished.
    #[error(transparent)]
    Done(#[from] Cause),

    /// The blocking query failed.
    #[error("watch of '{key_path}' failed: {source}")]
    Store {
        /// Field path being watched.
        key_path: String,
        /// Store failure.
        #[source]
        source: StoreError,
    },
}

impl WatchError {
    /// The cancellation cause, when the watch ended because of the context.
    #[must_use]
    pub const fn cause(&self) -> Option<Cause> {
        match self {
            Self::Done(cause) => Some(*cause),
            _ => None,
        }
    }
}
