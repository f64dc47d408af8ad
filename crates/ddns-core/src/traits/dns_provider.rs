// # DNS Provider Trait
//
// Defines the interface the engine uses to read and write DNS records.
//
// ## Implementations
//
// - Vercel: `ddns-provider-vercel` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     // First page of records
//     let page = provider.list_records_page("example.com", None).await?;
//
//     // Follow the cursor
//     if let Some(next) = page.pagination.next {
//         let page = provider.list_records_page("example.com", Some(next)).await?;
//     }
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Opaque pagination cursor handed back by the provider
///
/// The engine never interprets the value; it only passes `next` back as
/// `since` for the following page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageCursor(pub u64);

impl std::fmt::Display for PageCursor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A DNS record as listed by the provider
#[derive(Debug, Clone, PartialEq)]
pub struct DnsRecord {
    /// The record ID (provider-specific)
    pub id: String,
    /// The record name, relative to the domain (e.g. "home")
    pub name: String,
    /// The record type as reported by the provider (e.g. "A")
    pub record_type: String,
    /// The current record value (e.g. an IP address)
    pub value: String,
    /// Time-to-live for the record
    pub ttl: Option<u64>,
    /// Any additional provider-specific metadata
    pub extra: serde_json::Value,
}

/// Pagination block of a listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pagination {
    /// Total number of records
    pub count: u64,
    /// Cursor of the following page; `None` on the last page
    pub next: Option<PageCursor>,
    /// Cursor of the preceding page
    pub prev: Option<PageCursor>,
}

/// One page of records
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordsPage {
    /// Records in provider order
    pub records: Vec<DnsRecord>,
    /// Cursor information
    pub pagination: Pagination,
}

/// Payload for creating a record under a domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    /// Record name, relative to the domain
    pub name: String,
    /// Record type
    #[serde(rename = "type")]
    pub record_type: String,
    /// Record value
    pub value: String,
}

/// Trait for DNS provider implementations
///
/// Implementations must be thread-safe: the engine calls them from up to
/// `concurrency` upserts at once through a shared reference.
///
/// # Responsibilities
///
/// - ✅ Map each method to one provider API call (through the shared `ApiClient`,
///   which owns retry and backoff)
/// - ✅ Translate provider wire formats into [`DnsRecord`] / [`RecordsPage`]
/// - ❌ Decide whether a write is needed (owned by `DdnsEngine`)
/// - ❌ Walk pagination (owned by `engine::list_records`)
/// - ❌ Keep state between calls
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Fetch one page of records for `domain`
    ///
    /// `since = None` requests the first page. The returned
    /// `pagination.next` is `None` on the last page.
    async fn list_records_page(
        &self,
        domain: &str,
        since: Option<PageCursor>,
    ) -> Result<RecordsPage, crate::Error>;

    /// Create a record under `domain`
    async fn create_record(&self, domain: &str, record: &NewRecord) -> Result<(), crate::Error>;

    /// Set the value of an existing record
    async fn update_record(&self, record_id: &str, value: &str) -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

#[async_trait]
impl<T: DnsProvider + ?Sized> DnsProvider for std::sync::Arc<T> {
    async fn list_records_page(
        &self,
        domain: &str,
        since: Option<PageCursor>,
    ) -> Result<RecordsPage, crate::Error> {
        (**self).list_records_page(domain, since).await
    }

    async fn create_record(&self, domain: &str, record: &NewRecord) -> Result<(), crate::Error> {
        (**self).create_record(domain, record).await
    }

    async fn update_record(&self, record_id: &str, value: &str) -> Result<(), crate::Error> {
        (**self).update_record(record_id, value).await
    }

    fn provider_name(&self) -> &'static str {
        (**self).provider_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_record_serializes_type_field() {
        let record = NewRecord {
            name: "home".to_string(),
            record_type: "A".to_string(),
            value: "203.0.113.7".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&record).unwrap(),
            serde_json::json!({"name": "home", "type": "A", "value": "203.0.113.7"})
        );
    }

    #[test]
    fn cursor_is_transparent() {
        let cursor: PageCursor = serde_json::from_str("1700000000000").unwrap();
        assert_eq!(cursor, PageCursor(1_700_000_000_000));
        assert_eq!(cursor.to_string(), "1700000000000");
    }
}
