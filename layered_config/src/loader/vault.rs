//! The Vault secrets store.

use std::sync::Arc;

use async_trait::async_trait;
use figment::Figment;
use figment::providers::Serialized;
use figment::value::Dict;
use serde_json::{Map, Value};
use tracing::debug;

use super::Loader;
use super::consul::{DEFAULT_PREFIX, key_path};
use crate::binder::{DefaultPolicy, bind};
use crate::context::Context;
use crate::descriptor::{Configurable, SourceKind};
use crate::error::{DecodeError, LoadError, LoadResult};
use crate::lookup::TreeLookup;
use crate::remote::{SecretClient, VaultHttp};

/// Path below the prefix holding secrets shared by every application.
pub const GENERIC_PATH: &str = "generic";

/// Reads secrets from Vault.
///
/// Two secrets are read, `<prefix>/generic` and `<prefix>/<app>`, and merged
/// with the application's values winning. Without an explicit client one is
/// built from `VAULT_ADDR` and `VAULT_TOKEN`; when either is missing the source
/// is unavailable.
#[derive(Clone)]
pub struct Vault {
    client: Option<Arc<dyn SecretClient>>,
    prefix: String,
}

impl std::fmt::Debug for Vault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Vault")
            .field("has_client", &self.client.is_some())
            .field("prefix", &self.prefix)
            .finish()
    }
}

impl Default for Vault {
    fn default() -> Self {
        Self {
            client: None,
            prefix: String::from(DEFAULT_PREFIX),
        }
    }
}

impl Vault {
    /// A loader that discovers its client from the environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `client` instead of discovering one.
    #[must_use]
    pub fn with_client<C>(mut self, client: C) -> Self
    where
        C: SecretClient + 'static,
    {
        self.client = Some(Arc::new(client));
        self
    }

    /// Replaces the path prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    fn client(&self) -> LoadResult<Arc<dyn SecretClient>> {
        if let Some(client) = &self.client {
            return Ok(Arc::clone(client));
        }
        let client: Arc<dyn SecretClient> = Arc::new(VaultHttp::from_env()?);
        Ok(client)
    }

    async fn read(
        &self,
        ctx: &Context,
        client: &dyn SecretClient,
        name: &str,
    ) -> LoadResult<Option<Map<String, Value>>> {
        let path = key_path([self.prefix.as_str(), name]);
        let secret = ctx
            .run(client.read(&path))
            .await
            .map_err(LoadError::Canceled)??;
        if secret.is_none() {
            debug!(path = %path, "no secret stored in vault");
        }
        Ok(secret)
    }
}

/// Merges `layers` in order, later layers winning, nested tables merged key
/// by key.
fn merge(layers: impl IntoIterator<Item = Map<String, Value>>) -> Result<Dict, DecodeError> {
    layers
        .into_iter()
        .fold(Figment::new(), |figment, layer| {
            figment.merge(Serialized::defaults(layer))
        })
        .extract::<Dict>()
        .map_err(|err| DecodeError::Merge(Box::new(err)))
}

#[async_trait]
impl Loader for Vault {
    fn name(&self) -> &'static str {
        "vault"
    }

    async fn load(
        &self,
        ctx: &Context,
        app_name: &str,
        target: &mut dyn Configurable,
    ) -> LoadResult<()> {
        let client = self.client()?;
        let generic = self.read(ctx, client.as_ref(), GENERIC_PATH).await?;
        let specific = self.read(ctx, client.as_ref(), app_name).await?;
        if generic.is_none() && specific.is_none() {
            return Ok(());
        }
        let dict = merge(generic.into_iter().chain(specific)).map_err(|source| {
            LoadError::Decode {
                origin: format!("vault secrets for '{app_name}'"),
                source,
            }
        })?;
        bind(
            target,
            &TreeLookup::new(SourceKind::Vault, &dict),
            DefaultPolicy::Skip,
        )
        .map(drop)
    }
}
