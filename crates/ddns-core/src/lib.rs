// # ddns-core
//
// Core library for the DDNS record reconciliation system.
//
// ## Architecture Overview
//
// This library keeps a set of DNS records pointed at the machine's public IP:
// - **IpSource**: Trait for discovering the current public IP
// - **DnsProvider**: Trait for listing, creating and updating records via provider APIs
// - **ApiClient**: HTTP call wrapper (base URL, auth, JSON, bounded retry)
// - **DdnsEngine**: Paginated lookup, upsert decision and bounded fan-out
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from provider implementations
// 2. **Stateless**: Every run re-reads provider state; nothing is persisted locally
// 3. **Idempotency**: A record that already holds the desired value is never written
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Explicit Composition**: Clients are built once and passed in by the caller

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod http;
pub mod retry;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider};
pub use engine::{DdnsEngine, EngineEvent, ReconcileReport, RecordType, UpsertOutcome, UpsertTarget};
pub use config::{DdnsConfig, EngineConfig, IpSourceConfig, ProviderConfig, RetryConfig};
pub use error::{Error, Result};
pub use http::{ApiClient, ApiRequest};
pub use retry::RetryPolicy;
