//! Ranked configuration sources bound onto typed structs.
//!
//! A configuration struct derives [`Layered`], which records every field's
//! names, default literal and type at compile time. Loaders then read the
//! defaults, Consul, Vault, a configuration file, the environment and the
//! command line in turn, each overwriting only the fields it actually holds.
//! A source that is simply absent (no client configured, no file, a local
//! server that is not running) is skipped; anything else stops the load and
//! is reported against the loader that failed.
//!
//! Separately, [`DynamicValue`] watches a single Consul key with blocking
//! queries and hands every new version to a callback until the caller's
//! [`Context`] finishes.
//!
//! ```no_run
//! use layered_config::{Layered, load_config_blocking};
//!
//! #[derive(Debug, Default, Layered)]
//! struct Settings {
//!     #[layered(name = "logLevel", env = "LOG_LEVEL", default = "info")]
//!     log_level: String,
//!     #[layered(secret)]
//!     db_password: String,
//! }
//!
//! let mut settings = Settings::default();
//! load_config_blocking("adm0001s", &mut settings)?;
//! # Ok::<(), layered_config::LoadError>(())
//! ```

extern crate self as layered_config;

pub use layered_config_macros::Layered;

mod binder;
mod codec;
mod context;
mod descriptor;
mod error;
mod loader;
mod lookup;
mod orchestrator;
mod remote;
mod value;
mod watch;

pub use binder::{BoundFields, DefaultPolicy, FieldReport, bind, describe};
pub use codec::{Decoder, JsonDecoder, SUFFIXES, TomlDecoder, YamlDecoder, decoder_for_path};
pub use context::{Cause, Context};
pub use descriptor::{
    ConfigDescriptor, Configurable, Field, FieldDescriptor, FieldKind, FieldRef, FieldSlot,
    NameHint, SourceKind,
};
pub use error::{
    DecodeError, ErrorKind, HandlerError, LoadError, LoadResult, StoreError, WatchError,
    is_display_request,
};
pub use loader::{
    CONFIG_PATH_ENV, Consul, DEFAULT_PREFIX, DEFAULT_REFRESH_INTERVAL, Defaults, DynamicConfig,
    DynamicHandler, DynamicValue, Env, File, Flags, GENERIC_PATH, Loader, Vault,
};
pub use lookup::{EmptyLookup, FlatLookup, Lookup, TreeLookup, raw_from_value};
pub use orchestrator::{default_loaders, load_config, load_config_blocking, load_with_loaders};
pub use remote::{BlockingQuery, ConsulHttp, KvClient, KvResponse, SecretClient, VaultHttp};
pub use value::{CoerceError, RawValue, Settable, parse_bool, split_list};
