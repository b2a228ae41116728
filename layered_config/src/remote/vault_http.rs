//! Vault KV version 2 client over the HTTP API.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Map, Value};

use super::network::{base_url, build_client, classify_network_error, env_var, status_error};
use super::SecretClient;
use crate::error::{LoadError, StoreError};

const TOKEN_HEADER: &str = "X-Vault-Token";
const NAMESPACE_HEADER: &str = "X-Vault-Namespace";

const DEFAULT_MOUNT: &str = "secret";

#[derive(Debug, Deserialize)]
struct SecretEnvelope {
    data: SecretData,
}

#[derive(Debug, Deserialize)]
struct SecretData {
    data: Option<Map<String, Value>>,
}

/// Vault client reading a KV v2 mount.
#[derive(Debug, Clone)]
pub struct VaultHttp {
    address: String,
    base: Url,
    token: String,
    namespace: Option<String>,
    mount: String,
    client: Client,
}

impl VaultHttp {
    /// Builds a client for `address` authenticating with `token`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the address is not a valid URL or the HTTP
    /// client cannot be built.
    pub fn new(address: impl Into<String>, token: impl Into<String>) -> Result<Self, StoreError> {
        Self::build(address.into(), token.into(), None)
    }

    fn build(address: String, token: String, ca_cert: Option<PathBuf>) -> Result<Self, StoreError> {
        let base = base_url(&address)?;
        let client = build_client(&address, ca_cert.as_deref())?;
        Ok(Self {
            address,
            base,
            token,
            namespace: None,
            mount: String::from(DEFAULT_MOUNT),
            client,
        })
    }

    /// Builds a client from the standard Vault environment variables.
    ///
    /// Reads `VAULT_ADDR`, `VAULT_TOKEN`, `VAULT_NAMESPACE` and
    /// `VAULT_CACERT`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::NoClient`] when `VAULT_ADDR` or `VAULT_TOKEN` is
    /// unset and [`LoadError::Remote`] when the client cannot be built.
    pub fn from_env() -> Result<Self, LoadError> {
        let address =
            env_var("VAULT_ADDR").ok_or_else(|| LoadError::no_client("VAULT_ADDR is not set"))?;
        let token =
            env_var("VAULT_TOKEN").ok_or_else(|| LoadError::no_client("VAULT_TOKEN is not set"))?;
        let mut client = Self::build(address, token, env_var("VAULT_CACERT").map(PathBuf::from))?;
        client.namespace = env_var("VAULT_NAMESPACE");
        Ok(client)
    }

    /// Reads from `mount` instead of `secret`.
    #[must_use]
    pub fn with_mount(mut self, mount: impl Into<String>) -> Self {
        self.mount = mount.into();
        self
    }

    /// Sends requests to an enterprise namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    fn secret_url(&self, path: &str) -> Result<Url, StoreError> {
        let mount = self.mount.trim_matches('/');
        let path = path.trim_matches('/');
        self.base
            .join(&format!("v1/{mount}/data/{path}"))
            .map_err(|err| StoreError::InvalidResponse {
                address: self.address.clone(),
                message: format!("invalid secret path {path:?}: {err}"),
            })
    }
}

#[async_trait]
impl SecretClient for VaultHttp {
    async fn read(&self, path: &str) -> Result<Option<Map<String, Value>>, StoreError> {
        let mut request = self
            .client
            .get(self.secret_url(path)?)
            .header(TOKEN_HEADER, &self.token);
        if let Some(namespace) = &self.namespace {
            request = request.header(NAMESPACE_HEADER, namespace);
        }
        let response = request
            .send()
            .await
            .map_err(|err| classify_network_error(&err, &self.address))?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let envelope: SecretEnvelope = response
                    .json()
                    .await
                    .map_err(|err| classify_network_error(&err, &self.address))?;
                Ok(envelope.data.data)
            }
            _ => Err(status_error(response, &self.address).await),
        }
    }
}

#[cfg(test)]
mod tests {
    #![expect(clippy::expect_used, reason = "tests panic on unexpected failures")]

    use super::*;

    #[test]
    fn secret_paths_use_the_kv2_data_prefix() {
        let client = VaultHttp::new("https://vault.internal:8200", "token")
            .expect("client builds")
            .with_mount("/kv/");
        let url = client.secret_url("finops/app").expect("url builds");
        assert_eq!(url.as_str(), "https://vault.internal:8200/v1/kv/data/finops/app");
    }

    #[test]
    fn envelopes_unwrap_to_the_secret_map() {
        let envelope: SecretEnvelope = serde_json::from_str(
            r#"{"data":{"data":{"password":"hunter2"},"metadata":{"version":3}}}"#,
        )
        .expect("envelope parses");
        let data = envelope.data.data.expect("secret has data");
        assert_eq!(data.get("password"), Some(&Value::from("hunter2")));
    }
}
