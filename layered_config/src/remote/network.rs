//! Shared HTTP plumbing for the store clients.

use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use reqwest::{Client, Response, Url};

use crate::error::StoreError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Reads a non-empty environment variable.
pub(crate) fn env_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

/// Builds a client trusting the optional PEM bundle at `ca_cert`.
pub(crate) fn build_client(address: &str, ca_cert: Option<&Path>) -> Result<Client, StoreError> {
    let mut builder = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(concat!("layered_config/", env!("CARGO_PKG_VERSION")));
    if let Some(path) = ca_cert {
        let pem = std::fs::read(path).map_err(|err| {
            StoreError::other(format!("cannot read CA bundle {}: {err}", path.display()))
        })?;
        let cert = reqwest::Certificate::from_pem(&pem).map_err(|err| {
            StoreError::other(format!("invalid CA bundle {}: {err}", path.display()))
        })?;
        builder = builder.add_root_certificate(cert);
    }
    builder
        .build()
        .map_err(|err| classify_network_error(&err, address))
}

/// Normalises a configured address into a base URL.
///
/// Bare `host:port` values gain an `http://` scheme.
pub(crate) fn base_url(address: &str) -> Result<Url, StoreError> {
    let with_scheme = if address.contains("://") {
        address.to_owned()
    } else {
        format!("http://{address}")
    };
    Url::parse(&with_scheme).map_err(|err| StoreError::InvalidResponse {
        address: address.to_owned(),
        message: format!("invalid address: {err}"),
    })
}

/// Whether `url` points at this host.
pub(crate) fn is_local(url: &Url) -> bool {
    match url.host_str() {
        Some(host) if host.eq_ignore_ascii_case("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback() || ip.is_unspecified()),
        None => false,
    }
}

/// Maps a transport failure onto [`StoreError`].
///
/// Connection failures become [`StoreError::Unreachable`], flagged local when
/// the address is a loopback host, so the orchestrator can skip a store that
/// simply is not running here.
pub(crate) fn classify_network_error(error: &reqwest::Error, address: &str) -> StoreError {
    let local = error
        .url()
        .map_or_else(|| base_url(address).is_ok_and(|url| is_local(&url)), is_local);
    if error.is_connect() {
        return StoreError::Unreachable {
            address: address.to_owned(),
            local,
            message: error.to_string(),
        };
    }
    if error.is_timeout() {
        return StoreError::Unreachable {
            address: address.to_owned(),
            local: false,
            message: String::from("request timed out"),
        };
    }
    if let Some(status) = error.status() {
        return StoreError::Status {
            address: address.to_owned(),
            status: status.as_u16(),
            message: error.to_string(),
        };
    }
    if error.is_decode() {
        return StoreError::InvalidResponse {
            address: address.to_owned(),
            message: error.to_string(),
        };
    }
    StoreError::other(format!("request to {address} failed: {error}"))
}

/// Turns a non-success response into [`StoreError::Status`] carrying the body.
pub(crate) async fn status_error(response: Response, address: &str) -> StoreError {
    let status = response.status().as_u16();
    let message = response
        .text()
        .await
        .map(|body| body.trim().to_owned())
        .unwrap_or_default();
    StoreError::Status {
        address: address.to_owned(),
        status,
        message,
    }
}
