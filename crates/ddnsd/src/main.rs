// # ddnsd - DDNS updater
//
// This binary is a THIN integration layer: all DNS logic lives in ddns-core.
//
// One invocation is one run:
// 1. Read configuration from environment variables
// 2. Initialize logging and the runtime
// 3. Build the Vercel provider and the ipify IP source
// 4. Point every configured subdomain at the current public IP, then exit
//
// Schedule it with cron or a systemd timer for periodic updates.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Records
// - `DDNS_DOMAIN`: Domain the records live under (e.g. example.com)
// - `DDNS_SUBDOMAIN`: Comma-separated subdomain labels, processed in order
//
// ### DNS Provider
// - `VERCEL_TOKEN`: Vercel API token
// - `VERCEL_API_BASE`: API base URL (default: https://api.vercel.com)
//
// ### IP Source
// - `DDNS_IP_SOURCE_URL`: Lookup service URL (default: https://api.ipify.org)
//
// ### Engine
// - `DDNS_CONCURRENCY`: Maximum records reconciled at once (default: 5)
// - `DDNS_MAX_RETRIES`: Retries per HTTP call (default: 5)
// - `DDNS_RETRY_BASE_DELAY_MS`: Delay before the first retry (default: 100)
// - `DDNS_MODE`: Set to `dry-run` to log changes without writing them
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default: info)
//
// ## Example
//
// ```bash
// export DDNS_DOMAIN=example.com
// export DDNS_SUBDOMAIN=home,nas
// export VERCEL_TOKEN=your_token
//
// ddnsd
// ```

use anyhow::{Context, Result};
use ddns_core::config::{
    DEFAULT_IP_LOOKUP_URL, DEFAULT_VERCEL_API_BASE, DdnsConfig, EngineConfig, IpSourceConfig,
    ProviderConfig, RetryConfig,
};
use ddns_core::{DdnsEngine, EngineEvent};
use ddns_ip_http::HttpIpSource;
use ddns_provider_vercel::VercelProvider;
use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for different termination scenarios
///
/// - 0: Every record points at the current IP
/// - 1: Configuration or startup error
/// - 2: Runtime error (IP lookup or a record failed)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    domain: String,
    subdomains: Vec<String>,
    vercel_token: String,
    vercel_api_base: String,
    ip_source_url: String,
    concurrency: usize,
    max_retries: usize,
    retry_base_delay_ms: u64,
    dry_run: bool,
    log_level: String,
}

// Custom Debug implementation that hides the Vercel token
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("domain", &self.domain)
            .field("subdomains", &self.subdomains)
            .field("vercel_token", &"<REDACTED>")
            .field("vercel_api_base", &self.vercel_api_base)
            .field("ip_source_url", &self.ip_source_url)
            .field("concurrency", &self.concurrency)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay_ms", &self.retry_base_delay_ms)
            .field("dry_run", &self.dry_run)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .with_context(|| format!("{} is required. Set it via: export {}=...", key, key))
        };

        Ok(Self {
            domain: required("DDNS_DOMAIN")?.trim().to_string(),
            subdomains: required("DDNS_SUBDOMAIN")?
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            vercel_token: required("VERCEL_TOKEN")?,
            vercel_api_base: lookup("VERCEL_API_BASE")
                .unwrap_or_else(|| DEFAULT_VERCEL_API_BASE.to_string()),
            ip_source_url: lookup("DDNS_IP_SOURCE_URL")
                .unwrap_or_else(|| DEFAULT_IP_LOOKUP_URL.to_string()),
            concurrency: parse_or(&lookup, "DDNS_CONCURRENCY", 5)?,
            max_retries: parse_or(&lookup, "DDNS_MAX_RETRIES", 5)?,
            retry_base_delay_ms: parse_or(&lookup, "DDNS_RETRY_BASE_DELAY_MS", 100)?,
            dry_run: lookup("DDNS_MODE")
                .is_some_and(|mode| mode.trim().eq_ignore_ascii_case("dry-run")),
            log_level: lookup("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// - Domain and subdomain label syntax
    /// - URL schemes
    /// - Numeric ranges
    /// - Log level
    fn validate(&self) -> Result<()> {
        validate_domain_name(&self.domain)?;

        for subdomain in &self.subdomains {
            if subdomain.is_empty() {
                anyhow::bail!(
                    "DDNS_SUBDOMAIN contains an empty entry. Got: '{}'",
                    self.subdomains.join(",")
                );
            }
            validate_domain_name(subdomain)?;
        }

        validate_url("VERCEL_API_BASE", &self.vercel_api_base)?;
        validate_url("DDNS_IP_SOURCE_URL", &self.ip_source_url)?;

        if !(1..=64).contains(&self.concurrency) {
            anyhow::bail!(
                "DDNS_CONCURRENCY must be between 1 and 64. Got: {}",
                self.concurrency
            );
        }

        if self.max_retries > 10 {
            anyhow::bail!(
                "DDNS_MAX_RETRIES must be between 0 and 10. Got: {}",
                self.max_retries
            );
        }

        if !(1..=60_000).contains(&self.retry_base_delay_ms) {
            anyhow::bail!(
                "DDNS_RETRY_BASE_DELAY_MS must be between 1 and 60000. Got: {}",
                self.retry_base_delay_ms
            );
        }

        self.log_level()?;

        Ok(())
    }

    fn log_level(&self) -> Result<Level> {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Ok(Level::TRACE),
            "debug" => Ok(Level::DEBUG),
            "info" => Ok(Level::INFO),
            "warn" => Ok(Level::WARN),
            "error" => Ok(Level::ERROR),
            _ => anyhow::bail!(
                "DDNS_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }
    }

    /// Build the library configuration
    fn to_ddns_config(&self) -> DdnsConfig {
        DdnsConfig {
            domain: self.domain.clone(),
            subdomains: self.subdomains.clone(),
            provider: ProviderConfig::Vercel {
                api_token: self.vercel_token.clone(),
                api_base: self.vercel_api_base.clone(),
            },
            ip_source: IpSourceConfig::Http {
                url: self.ip_source_url.clone(),
                version: None,
            },
            engine: EngineConfig {
                concurrency: self.concurrency,
                dry_run: self.dry_run,
                retry: RetryConfig {
                    max_retries: self.max_retries,
                    initial_backoff_ms: self.retry_base_delay_ms,
                    ..RetryConfig::default()
                },
                ..EngineConfig::default()
            },
        }
    }
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} must be a number. Got '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

fn validate_url(key: &str, url: &str) -> Result<()> {
    if !url.starts_with("https://") && !url.starts_with("http://") {
        anyhow::bail!("{} must use HTTP or HTTPS scheme. Got: {}", key, url);
    }
    Ok(())
}

/// Validate that a string is a valid domain name (or relative label sequence)
///
/// This implements basic DNS name validation per RFC 1035.
/// It's not comprehensive but catches common errors.
fn validate_domain_name(domain: &str) -> Result<()> {
    if domain.is_empty() {
        anyhow::bail!("Domain name cannot be empty");
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        anyhow::bail!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        );
    }

    for label in domain.split('.') {
        // Wildcard record
        if label == "*" {
            continue;
        }

        if label.is_empty() {
            anyhow::bail!("Domain name has empty label: '{}'", domain);
        }

        if label.len() > 63 {
            anyhow::bail!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            );
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            anyhow::bail!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            );
        }

        if label.starts_with('-') || label.ends_with('-') {
            anyhow::bail!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            );
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let log_level = config.log_level().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!(
        "Managing {} record(s) under {}",
        config.subdomains.len(),
        config.domain
    );

    let engine = match build_engine(&config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(run(engine));

    match result {
        Ok(()) => DdnsExitCode::Success.into(),
        Err(e) => {
            error!("Run failed: {:#}", e);
            DdnsExitCode::RuntimeError.into()
        }
    }
}

/// Engine plus the receiving end of its event channel
type EngineHandle = (DdnsEngine, tokio::sync::mpsc::Receiver<EngineEvent>);

/// Composition root: build every client once and hand them to the engine
fn build_engine(config: &Config) -> Result<EngineHandle> {
    let ddns_config = config.to_ddns_config();
    let retry_policy = ddns_config.engine.retry.to_policy();

    let provider = VercelProvider::from_config(&ddns_config.provider, retry_policy.clone())
        .context("Failed to create Vercel provider")?;
    let ip_source = HttpIpSource::from_config(&ddns_config.ip_source, retry_policy)
        .context("Failed to create IP source")?;

    let engine = DdnsEngine::new(Box::new(ip_source), Box::new(provider), ddns_config)?;
    Ok(engine)
}

/// Run the engine once, logging its events
async fn run((engine, mut events): EngineHandle) -> Result<()> {
    let monitor = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!(?event, "Engine event");
        }
    });

    let result = engine.run_once().await;

    // Dropping the engine closes the channel and ends the monitor
    drop(engine);
    if let Err(e) = monitor.await {
        error!("Event monitor task failed: {}", e);
    }

    let report = result?;
    info!(
        "Done: {} created, {} updated, {} unchanged",
        report.created(),
        report.updated(),
        report.unchanged()
    );

    Ok(())
}
