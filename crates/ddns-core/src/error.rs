//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// IP source-related errors
    #[error("IP source error: {0}")]
    IpSource(String),

    /// DNS provider-related errors
    #[error("DNS provider error: {0}")]
    DnsProvider(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-level HTTP errors (connect, timeout, body read)
    #[error("HTTP error: {0}")]
    Http(String),

    /// The remote API answered with a status outside the ok range
    #[error("{provider} API returned status {status}: {message}")]
    Api {
        /// Client name
        provider: String,
        /// HTTP status code
        status: u16,
        /// Response body (or a summary of it)
        message: String,
    },

    /// A successful response body did not match the expected schema
    #[error("{provider} response did not match the expected schema: {message}")]
    Decode {
        /// Client name
        provider: String,
        /// Decoder message
        message: String,
    },

    /// A transient failure persisted through every retry
    #[error("{operation} failed after {attempts} attempts: {source}")]
    RetriesExhausted {
        /// Human-readable operation label
        operation: String,
        /// Total number of attempts made (initial call included)
        attempts: usize,
        /// The error returned by the final attempt
        #[source]
        source: Box<Error>,
    },

    /// Reconciling a single record failed
    #[error("Failed to reconcile {record}: {source}")]
    Upsert {
        /// Fully-qualified record name
        record: String,
        /// Underlying failure
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create a DNS provider error
    pub fn dns_provider(msg: impl Into<String>) -> Self {
        Self::DnsProvider(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP transport error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an API status error
    pub fn api(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Create a schema/decoding error
    pub fn decode(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Attach the record being reconciled to an error
    pub fn upsert(record: impl Into<String>, source: Error) -> Self {
        Self::Upsert {
            record: record.into(),
            source: Box::new(source),
        }
    }

    /// HTTP status carried by this error, looking through retry and upsert wrappers
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::RetriesExhausted { source, .. } | Self::Upsert { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Whether the provider signalled rate limiting or overload (status >= 429)
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Api { status, .. } if *status >= 429)
    }

    /// Whether this is a transport failure rather than an API answer
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_))
    }
}
