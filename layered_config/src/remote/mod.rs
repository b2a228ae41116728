//! Collaborator contracts for the key/value and secrets stores.
//!
//! Loaders and the dynamic watcher only need "bytes for a key, with its
//! version index" and "a secret map for a path". The traits here capture that
//! narrow contract; [`ConsulHttp`] and [`VaultHttp`] implement it over HTTP
//! and tests substitute in-memory stores.

mod consul_http;
mod network;
mod vault_http;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::StoreError;

pub use consul_http::ConsulHttp;
pub use vault_http::VaultHttp;

/// Parameters of a blocking query.
///
/// An `index` of zero asks for the current value immediately. A non-zero
/// index asks the store to hold the request until the key's index moves past
/// it or `wait` elapses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockingQuery {
    /// Last index the caller has seen.
    pub index: u64,
    /// Longest time the store may hold the request.
    pub wait: Option<Duration>,
}

impl BlockingQuery {
    /// A plain read that returns immediately.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            index: 0,
            wait: None,
        }
    }
}

/// A key/value store answer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KvResponse {
    /// Raw value, or `None` when the key does not exist.
    pub value: Option<Vec<u8>>,
    /// Version index reported by the store.
    pub index: u64,
}

/// Read access to a key/value store that supports blocking queries.
#[async_trait]
pub trait KvClient: Send + Sync {
    /// Reads `key`.
    ///
    /// A missing key is not an error; it yields a response whose `value` is
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be reached or rejects the
    /// request.
    async fn get(&self, key: &str, query: BlockingQuery) -> Result<KvResponse, StoreError>;
}

/// Read access to a secrets store.
#[async_trait]
pub trait SecretClient: Send + Sync {
    /// Reads the secret map stored at `path`, or `None` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the store cannot be reached or rejects the
    /// request.
    async fn read(&self, path: &str) -> Result<Option<Map<String, Value>>, StoreError>;
}

#[async_trait]
impl<T> KvClient for std::sync::Arc<T>
where
    T: KvClient + ?Sized,
{
    async fn get(&self, key: &str, query: BlockingQuery) -> Result<KvResponse, StoreError> {
        (**self).get(key, query).await
    }
}

#[async_trait]
impl<T> SecretClient for std::sync::Arc<T>
where
    T: SecretClient + ?Sized,
{
    async fn read(&self, path: &str) -> Result<Option<Map<String, Value>>, StoreError> {
        (**self).read(path).await
    }
}
