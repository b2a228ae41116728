//! Consul key/value client over the HTTP API.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;

use super::network::{base_url, build_client, classify_network_error, env_var, status_error};
use super::{BlockingQuery, KvClient, KvResponse};
use crate::error::{LoadError, StoreError};

const INDEX_HEADER: &str = "X-Consul-Index";
const TOKEN_HEADER: &str = "X-Consul-Token";
const PLAIN_TIMEOUT: Duration = Duration::from_secs(30);
const TIMEOUT_SLACK: Duration = Duration::from_secs(5);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct KvEntry {
    value: Option<String>,
}

/// Consul HTTP client.
///
/// # Examples
///
/// ```
/// use layered_config::ConsulHttp;
///
/// let client = ConsulHttp::new("127.0.0.1:8500")?.with_token("s3cr3t");
/// assert_eq!(client.address(), "127.0.0.1:8500");
/// # Ok::<(), layered_config::StoreError>(())
/// ```
#[derive(Debug, Clone)]
pub struct ConsulHttp {
    address: String,
    base: Url,
    token: Option<String>,
    namespace: Option<String>,
    client: Client,
}

impl ConsulHttp {
    /// Builds a client for `address` without credentials.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the address is not a valid URL or the HTTP
    /// client cannot be built.
    pub fn new(address: impl Into<String>) -> Result<Self, StoreError> {
        Self::build(address.into(), None)
    }

    fn build(address: String, ca_cert: Option<PathBuf>) -> Result<Self, StoreError> {
        let base = base_url(&address)?;
        let client = build_client(&address, ca_cert.as_deref())?;
        Ok(Self {
            address,
            base,
            token: None,
            namespace: None,
            client,
        })
    }

    /// Builds a client from the standard Consul environment variables.
    ///
    /// Reads `CONSUL_HTTP_ADDR`, `CONSUL_HTTP_TOKEN`, `CONSUL_NAMESPACE` and
    /// `CONSUL_CACERT`.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::NoClient`] when `CONSUL_HTTP_ADDR` is unset and
    /// [`LoadError::Remote`] when the client cannot be built.
    pub fn from_env() -> Result<Self, LoadError> {
        let address = env_var("CONSUL_HTTP_ADDR")
            .ok_or_else(|| LoadError::no_client("CONSUL_HTTP_ADDR is not set"))?;
        let mut client = Self::build(address, env_var("CONSUL_CACERT").map(PathBuf::from))?;
        client.token = env_var("CONSUL_HTTP_TOKEN");
        client.namespace = env_var("CONSUL_NAMESPACE");
        Ok(client)
    }

    /// Sends `token` with every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Scopes requests to an enterprise namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Address the client talks to.
    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }

    fn kv_url(&self, key: &str, query: BlockingQuery) -> Result<Url, StoreError> {
        let mut url = self
            .base
            .join(&format!("v1/kv/{}", key.trim_start_matches('/')))
            .map_err(|err| StoreError::InvalidResponse {
                address: self.address.clone(),
                message: format!("invalid key {key:?}: {err}"),
            })?;
        let mut pairs: Vec<(&str, String)> = Vec::new();
        if query.index > 0 {
            pairs.push(("index", query.index.to_string()));
        }
        if let Some(wait) = query.wait {
            pairs.push(("wait", format!("{}ms", wait.as_millis())));
        }
        if let Some(namespace) = &self.namespace {
            pairs.push(("ns", namespace.clone()));
        }
        if !pairs.is_empty() {
            url.query_pairs_mut().extend_pairs(pairs);
        }
        Ok(url)
    }

    fn decode_entry(&self, entries: &[KvEntry]) -> Result<Option<Vec<u8>>, StoreError> {
        let Some(encoded) = entries.first().and_then(|entry| entry.value.as_deref()) else {
            return Ok(None);
        };
        STANDARD
            .decode(encoded)
            .map(Some)
            .map_err(|err| StoreError::InvalidResponse {
                address: self.address.clone(),
                message: format!("value is not base64: {err}"),
            })
    }
}

/// Reads the index header.
///
/// A blocking query cannot continue without it, so a missing header is only
/// tolerated on plain reads. A header that is present must parse.
fn response_index(headers: &HeaderMap, address: &str, blocking: bool) -> Result<u64, StoreError> {
    let invalid = |message: String| StoreError::InvalidResponse {
        address: address.to_owned(),
        message,
    };
    match headers.get(INDEX_HEADER) {
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|text| text.trim().parse::<u64>().ok())
            .ok_or_else(|| invalid(format!("unparsable {INDEX_HEADER} header {value:?}"))),
        None if blocking => Err(invalid(format!("missing {INDEX_HEADER} header"))),
        None => Ok(0),
    }
}

#[async_trait]
impl KvClient for ConsulHttp {
    async fn get(&self, key: &str, query: BlockingQuery) -> Result<KvResponse, StoreError> {
        let url = self.kv_url(key, query)?;
        // Consul adds up to wait/16 of jitter to blocking queries.
        let timeout = query
            .wait
            .map_or(PLAIN_TIMEOUT, |wait| wait + wait / 16 + TIMEOUT_SLACK);
        let mut request = self.client.get(url).timeout(timeout);
        if let Some(token) = &self.token {
            request = request.header(TOKEN_HEADER, token);
        }
        let response = request
            .send()
            .await
            .map_err(|err| classify_network_error(&err, &self.address))?;
        let index = response_index(response.headers(), &self.address, query.wait.is_some())?;
        match response.status() {
            StatusCode::NOT_FOUND => Ok(KvResponse { value: None, index }),
            status if status.is_success() => {
                let entries: Vec<KvEntry> = response
                    .json()
                    .await
                    .map_err(|err| classify_network_error(&err, &self.address))?;
                Ok(KvResponse {
                    value: self.decode_entry(&entries)?,
                    index,
                })
            }
            _ => Err(status_error(response, &self.address).await),
        }
    }
}
