//! In-memory stand-ins for the key/value and secrets stores.
//!
//! [`MemoryKv`] answers every read from a fixed map. [`ScriptedKv`] replays a
//! queue of replies, one per request, and then holds further requests open
//! forever, which is how a blocking query behaves when nothing changes.
//! [`MemorySecrets`] serves secret maps by path.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use layered_config::{BlockingQuery, KvClient, KvResponse, SecretClient, StoreError};
use parking_lot::Mutex;
use serde_json::{Map, Value};

/// A key/value store backed by a map.
///
/// # Examples
///
/// ```
/// use layered_config_test_helpers::kv::MemoryKv;
///
/// let kv = MemoryKv::new().with_value("finops/app", "logLevel: debug\n");
/// # let _ = kv;
/// ```
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: HashMap<String, KvResponse>,
    failure: Option<String>,
}

impl MemoryKv {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every read fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            entries: HashMap::new(),
            failure: Some(message.into()),
        }
    }

    /// Stores `value` under `key`, bumping the key's index.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        let index = u64::try_from(self.entries.len()).unwrap_or(u64::MAX).saturating_add(1);
        self.entries.insert(
            key.into(),
            KvResponse {
                value: Some(value.into()),
                index,
            },
        );
        self
    }
}

#[async_trait]
impl KvClient for MemoryKv {
    async fn get(&self, key: &str, _query: BlockingQuery) -> Result<KvResponse, StoreError> {
        if let Some(message) = &self.failure {
            return Err(StoreError::other(message.clone()));
        }
        Ok(self.entries.get(key).cloned().unwrap_or_default())
    }
}

/// One scripted answer of a [`ScriptedKv`].
#[derive(Debug, Clone)]
pub enum Reply {
    /// Answer with `value` at `index`.
    Value {
        /// Stored bytes, or `None` for a missing key.
        value: Option<Vec<u8>>,
        /// Reported index.
        index: u64,
    },
    /// Fail with a [`StoreError::Other`] carrying the message.
    Fail(String),
}

impl Reply {
    /// A present value at `index`.
    #[must_use]
    pub fn value(value: impl Into<Vec<u8>>, index: u64) -> Self {
        Self::Value {
            value: Some(value.into()),
            index,
        }
    }

    /// A missing key at `index`.
    #[must_use]
    pub const fn absent(index: u64) -> Self {
        Self::Value { value: None, index }
    }

    /// A failed request.
    #[must_use]
    pub fn fail(message: impl Into<String>) -> Self {
        Self::Fail(message.into())
    }
}

/// A request received by a [`ScriptedKv`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedQuery {
    /// Requested key.
    pub key: String,
    /// Blocking parameters of the request.
    pub query: BlockingQuery,
}

/// A key/value store that replays scripted replies in order.
///
/// Once the script is exhausted every request stays pending, so a watch
/// over it only ends through its context.
#[derive(Debug, Default)]
pub struct ScriptedKv {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<RecordedQuery>>,
}

impl ScriptedKv {
    /// A store that answers with `replies`, one per request.
    #[must_use]
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::default(),
        }
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedQuery> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl KvClient for ScriptedKv {
    async fn get(&self, key: &str, query: BlockingQuery) -> Result<KvResponse, StoreError> {
        self.calls.lock().push(RecordedQuery {
            key: key.to_owned(),
            query,
        });
        let next = self.replies.lock().pop_front();
        match next {
            Some(Reply::Value { value, index }) => Ok(KvResponse { value, index }),
            Some(Reply::Fail(message)) => Err(StoreError::other(message)),
            None => std::future::pending().await,
        }
    }
}

/// A secrets store backed by a map of paths to secret tables.
#[derive(Debug, Default)]
pub struct MemorySecrets {
    secrets: HashMap<String, Map<String, Value>>,
    failure: Option<String>,
}

impl MemorySecrets {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every read fails with `message`.
    #[must_use]
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            secrets: HashMap::new(),
            failure: Some(message.into()),
        }
    }

    /// Stores `secret` at `path`. Non-object values are stored as an empty
    /// table.
    #[must_use]
    pub fn with_secret(mut self, path: impl Into<String>, secret: Value) -> Self {
        let table = match secret {
            Value::Object(table) => table,
            _ => Map::new(),
        };
        self.secrets.insert(path.into(), table);
        self
    }
}

#[async_trait]
impl SecretClient for MemorySecrets {
    async fn read(&self, path: &str) -> Result<Option<Map<String, Value>>, StoreError> {
        if let Some(message) = &self.failure {
            return Err(StoreError::other(message.clone()));
        }
        Ok(self.secrets.get(path).cloned())
    }
}
