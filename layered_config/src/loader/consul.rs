//! The Consul key/value store.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{DynamicConfig, DynamicValue, Loader};
use crate::binder::{DefaultPolicy, bind};
use crate::codec::{Decoder, YamlDecoder};
use crate::context::Context;
use crate::descriptor::{Configurable, SourceKind};
use crate::error::{LoadError, LoadResult, StoreError, WatchError};
use crate::lookup::TreeLookup;
use crate::remote::{BlockingQuery, ConsulHttp, KvClient};
use crate::watch::watch_key;

/// Key prefix used by the store loaders unless overridden.
pub const DEFAULT_PREFIX: &str = "finops";

/// Joins non-empty path segments with `/`, ignoring stray slashes.
pub(crate) fn key_path<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    segments
        .into_iter()
        .map(|segment| segment.trim_matches('/'))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Reads a whole configuration document from Consul.
///
/// The document lives at `<prefix>/<app>` and is decoded with YAML unless
/// another [`Decoder`] is configured. Without an explicit client one is built
/// from the `CONSUL_HTTP_*` environment on every load, and a missing
/// `CONSUL_HTTP_ADDR` makes the source unavailable rather than failing.
///
/// A missing key binds nothing.
#[derive(Clone)]
pub struct Consul {
    client: Option<Arc<dyn KvClient>>,
    prefix: String,
    decoder: Arc<dyn Decoder>,
}

impl std::fmt::Debug for Consul {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Consul")
            .field("has_client", &self.client.is_some())
            .field("prefix", &self.prefix)
            .field("decoder", &self.decoder.name())
            .finish()
    }
}

impl Default for Consul {
    fn default() -> Self {
        Self {
            client: None,
            prefix: String::from(DEFAULT_PREFIX),
            decoder: Arc::new(YamlDecoder),
        }
    }
}

impl Consul {
    /// A loader that discovers its client from the environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `client` instead of discovering one.
    #[must_use]
    pub fn with_client<C>(mut self, client: C) -> Self
    where
        C: KvClient + 'static,
    {
        self.client = Some(Arc::new(client));
        self
    }

    /// Replaces the key prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Decodes documents with `decoder`.
    #[must_use]
    pub fn with_decoder<D>(mut self, decoder: D) -> Self
    where
        D: Decoder + 'static,
    {
        self.decoder = Arc::new(decoder);
        self
    }

    fn client(&self) -> LoadResult<Arc<dyn KvClient>> {
        if let Some(client) = &self.client {
            return Ok(Arc::clone(client));
        }
        let client: Arc<dyn KvClient> = Arc::new(ConsulHttp::from_env()?);
        Ok(client)
    }

    /// Full key of `field` of `app_name`, or of the whole document when
    /// `field` is empty.
    #[must_use]
    pub fn key(&self, app_name: &str, field: &str) -> String {
        key_path([self.prefix.as_str(), app_name, field])
    }
}

#[async_trait]
impl Loader for Consul {
    fn name(&self) -> &'static str {
        "consul"
    }

    async fn load(
        &self,
        ctx: &Context,
        app_name: &str,
        target: &mut dyn Configurable,
    ) -> LoadResult<()> {
        let client = self.client()?;
        let key = self.key(app_name, "");
        let response = ctx
            .run(client.get(&key, BlockingQuery::immediate()))
            .await
            .map_err(LoadError::Canceled)??;
        let Some(data) = response.value else {
            debug!(key = %key, "no configuration stored in consul");
            return Ok(());
        };
        let dict = self
            .decoder
            .decode(&data)
            .map_err(|source| LoadError::Decode {
                origin: format!("consul key '{key}'"),
                source,
            })?;
        bind(
            target,
            &TreeLookup::new(SourceKind::Consul, &dict),
            DefaultPolicy::Skip,
        )
        .map(drop)
    }
}

#[async_trait]
impl DynamicValue for Consul {
    async fn dynamic_value(&self, ctx: &Context, config: DynamicConfig) -> WatchError {
        let client = match self.client() {
            Ok(client) => client,
            Err(LoadError::NoClient { reason }) => return WatchError::NoClient { reason },
            Err(LoadError::Remote(source)) => {
                return WatchError::Store {
                    key_path: config.field_name,
                    source,
                };
            }
            Err(other) => {
                return WatchError::Store {
                    key_path: config.field_name,
                    source: StoreError::other(other.to_string()),
                };
            }
        };
        let key = self.key(&config.app_name, &config.field_name);
        watch_key(ctx, client, key, config).await
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(&["finops", "app"], "finops/app")]
    #[case(&["finops", "app", ""], "finops/app")]
    #[case(&["/finops/", "app", "struct/inner/field"], "finops/app/struct/inner/field")]
    fn key_paths_join_segments(#[case] segments: &[&str], #[case] expected: &str) {
        assert_eq!(key_path(segments.iter().copied()), expected);
    }

    #[test]
    fn custom_prefixes_are_used() {
        let loader = Consul::new().with_prefix("team");
        assert_eq!(loader.key("svc", "loglevel"), "team/svc/loglevel");
    }
}
