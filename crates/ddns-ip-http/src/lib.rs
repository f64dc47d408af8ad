// # HTTP IP Source
//
// This crate provides an HTTP-based IP source for the DDNS system.
//
// ## Architecture
//
// Asks a lookup service (ipify by default) for the caller's public address:
//
// ```text
// GET {url}/?format=json  ──►  {"ip": "203.0.113.7"}
// ```
//
// The request goes through `ApiClient`, so it shares the engine's retry
// policy. The source keeps no cache: every `current()` call is one lookup.

use async_trait::async_trait;
use ddns_core::config::{IpSourceConfig, IpVersion};
use ddns_core::traits::IpSource;
use ddns_core::{ApiClient, ApiRequest, Error, Result, RetryPolicy};
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

/// Lookup timeout; the address is small and the service is fast
const DEFAULT_LOOKUP_TIMEOUT: Duration = Duration::from_secs(10);

/// Body of a `?format=json` lookup
#[derive(Debug, Deserialize)]
struct LookupResponse {
    ip: String,
}

/// HTTP lookup IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    client: ApiClient,

    /// Reject addresses of the other family
    version: Option<IpVersion>,
}

impl HttpIpSource {
    /// Create a source against `url` with default retries
    ///
    /// # Parameters
    ///
    /// - `url`: Lookup service base URL (e.g., "https://api.ipify.org")
    /// - `version`: Accepted IP version (None = either)
    pub fn new(url: impl Into<String>, version: Option<IpVersion>) -> Result<Self> {
        Self::with_retry(url, version, RetryPolicy::default())
    }

    /// Create a source with an explicit retry policy
    pub fn with_retry(
        url: impl Into<String>,
        version: Option<IpVersion>,
        retry_policy: RetryPolicy,
    ) -> Result<Self> {
        let client = ApiClient::builder("ipify", url)
            .timeout(DEFAULT_LOOKUP_TIMEOUT)
            .retry(retry_policy)
            .build()?;

        Ok(Self { client, version })
    }

    /// Create a source from configuration
    pub fn from_config(config: &IpSourceConfig, retry_policy: RetryPolicy) -> Result<Self> {
        match config {
            IpSourceConfig::Http { url, version } => {
                Self::with_retry(url.clone(), *version, retry_policy)
            }
        }
    }

    fn check_version(&self, ip: IpAddr) -> Result<IpAddr> {
        match self.version {
            Some(IpVersion::V4) if !ip.is_ipv4() => {
                Err(Error::ip_source(format!("Expected IPv4, got: {}", ip)))
            }
            Some(IpVersion::V6) if !ip.is_ipv6() => {
                Err(Error::ip_source(format!("Expected IPv6, got: {}", ip)))
            }
            _ => Ok(ip),
        }
    }
}

#[async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        let request = ApiRequest::get("/").query("format", "json");
        let response: LookupResponse = self
            .client
            .invoke(&request)
            .await
            .map_err(|e| {
                Error::ip_source(format!(
                    "Lookup via {} failed: {}",
                    self.client.base_url(),
                    e
                ))
            })?;

        let ip_text = response.ip.trim();
        let ip: IpAddr = ip_text
            .parse()
            .map_err(|_| Error::ip_source(format!("Invalid IP address: {}", ip_text)))?;
        debug!(%ip, "Lookup service reported address");

        self.check_version(ip)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
