//! Configuration types for the DDNS system
//!
//! This module defines all configuration structures used throughout the crate.

use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Vercel API base URL
pub const DEFAULT_VERCEL_API_BASE: &str = "https://api.vercel.com";

/// Default IP lookup service
pub const DEFAULT_IP_LOOKUP_URL: &str = "https://api.ipify.org";

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Domain whose records are managed (e.g. "example.com")
    pub domain: String,

    /// Subdomain labels to point at the current IP, in processing order
    pub subdomains: Vec<String>,

    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// IP source configuration
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a configuration with default provider, IP source and engine settings
    pub fn new(
        domain: impl Into<String>,
        subdomains: Vec<String>,
        provider: ProviderConfig,
    ) -> Self {
        Self {
            domain: domain.into(),
            subdomains,
            provider,
            ip_source: IpSourceConfig::default(),
            engine: EngineConfig::default(),
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.domain.trim().is_empty() {
            return Err(crate::Error::config("Domain cannot be empty"));
        }

        if self.subdomains.is_empty() {
            return Err(crate::Error::config("No subdomains configured"));
        }

        if self.subdomains.iter().any(|s| s.trim().is_empty()) {
            return Err(crate::Error::config("Subdomain cannot be empty"));
        }

        self.provider.validate()?;
        self.ip_source.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Vercel DNS
    Vercel {
        /// Vercel API token
        api_token: String,
        /// API base URL
        #[serde(default = "default_vercel_api_base")]
        api_base: String,
    },
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Vercel { api_base, .. } => f
                .debug_struct("Vercel")
                .field("api_token", &"<REDACTED>")
                .field("api_base", api_base)
                .finish(),
        }
    }
}

impl ProviderConfig {
    /// Vercel provider against the public API
    pub fn vercel(api_token: impl Into<String>) -> Self {
        ProviderConfig::Vercel {
            api_token: api_token.into(),
            api_base: default_vercel_api_base(),
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Vercel { api_token, api_base } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Vercel API token cannot be empty"));
                }
                if api_base.is_empty() {
                    return Err(crate::Error::config("Vercel API base URL cannot be empty"));
                }
                Ok(())
            }
        }
    }
}

fn default_vercel_api_base() -> String {
    DEFAULT_VERCEL_API_BASE.to_string()
}

/// IP source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IpSourceConfig {
    /// HTTP lookup service answering `{"ip": "..."}` to `?format=json`
    Http {
        /// Lookup service base URL
        #[serde(default = "default_ip_lookup_url")]
        url: String,
        /// Reject addresses of the other family
        #[serde(default)]
        version: Option<IpVersion>,
    },
}

impl IpSourceConfig {
    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            IpSourceConfig::Http { url, .. } => {
                if url.is_empty() {
                    return Err(crate::Error::config("HTTP IP source URL cannot be empty"));
                }
                Ok(())
            }
        }
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        IpSourceConfig::Http {
            url: default_ip_lookup_url(),
            version: None,
        }
    }
}

fn default_ip_lookup_url() -> String {
    DEFAULT_IP_LOOKUP_URL.to_string()
}

/// IP version accepted from the IP source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpVersion {
    /// IPv4 only
    V4,
    /// IPv6 only
    V6,
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Maximum number of upserts in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Read and decide, but never create or update records
    #[serde(default)]
    pub dry_run: bool,

    /// Capacity of the internal event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 1000 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,

    /// Retry settings for every outbound call
    #[serde(default)]
    pub retry: RetryConfig,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.concurrency == 0 {
            return Err(crate::Error::config("Engine concurrency must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            dry_run: false,
            event_channel_capacity: default_event_channel_capacity(),
            retry: RetryConfig::default(),
        }
    }
}

fn default_concurrency() -> usize {
    5
}

fn default_event_channel_capacity() -> usize {
    1000
}

/// Retry configuration, in serializable units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Retries after the initial attempt
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Delay before the first retry, in milliseconds
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Upper bound for a single delay, in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Also retry connect errors and timeouts
    #[serde(default)]
    pub retry_transport_errors: bool,
}

impl RetryConfig {
    /// Convert into the runtime policy
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
            retry_transport_errors: self.retry_transport_errors,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            retry_transport_errors: false,
        }
    }
}

fn default_max_retries() -> usize {
    crate::retry::DEFAULT_MAX_RETRIES
}

fn default_initial_backoff_ms() -> u64 {
    crate::retry::DEFAULT_INITIAL_BACKOFF.as_millis() as u64
}

fn default_max_backoff_ms() -> u64 {
    crate::retry::DEFAULT_MAX_BACKOFF.as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> DdnsConfig {
        DdnsConfig::new(
            "example.com",
            vec!["home".to_string(), "nas".to_string()],
            ProviderConfig::vercel("token"),
        )
    }

    #[test]
    fn defaults_follow_engine_contract() {
        let config = config();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.concurrency, 5);
        assert!(!config.engine.dry_run);
        assert_eq!(config.engine.retry.to_policy(), RetryPolicy::default());
    }

    #[test]
    fn rejects_missing_pieces() {
        let mut no_subdomains = config();
        no_subdomains.subdomains.clear();
        assert!(no_subdomains.validate().is_err());

        let mut blank_subdomain = config();
        blank_subdomain.subdomains.push("  ".to_string());
        assert!(blank_subdomain.validate().is_err());

        let mut no_domain = config();
        no_domain.domain = String::new();
        assert!(no_domain.validate().is_err());

        let mut no_token = config();
        no_token.provider = ProviderConfig::vercel("");
        assert!(no_token.validate().is_err());

        let mut no_concurrency = config();
        no_concurrency.engine.concurrency = 0;
        assert!(no_concurrency.validate().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let config: DdnsConfig = serde_json::from_value(serde_json::json!({
            "domain": "example.com",
            "subdomains": ["home"],
            "provider": { "type": "vercel", "api_token": "abc" }
        }))
        .unwrap();

        assert!(matches!(
            config.provider,
            ProviderConfig::Vercel { ref api_base, .. } if api_base == DEFAULT_VERCEL_API_BASE
        ));
        assert!(matches!(
            config.ip_source,
            IpSourceConfig::Http { ref url, version: None } if url == DEFAULT_IP_LOOKUP_URL
        ));
        assert_eq!(config.engine.retry.max_retries, 5);
        assert_eq!(config.engine.retry.initial_backoff_ms, 100);
    }

    #[test]
    fn debug_redacts_token() {
        let debug = format!("{:?}", ProviderConfig::vercel("very-secret"));
        assert!(!debug.contains("very-secret"));
        assert!(debug.contains("<REDACTED>"));
    }
}
