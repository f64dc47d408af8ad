//! Test doubles and common utilities for engine contract tests
//!
//! This module provides an in-memory paginating provider and a static IP
//! source, both instrumented with counters so tests can assert exactly which
//! calls the engine made.

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::traits::{
    DnsProvider, DnsRecord, IpSource, NewRecord, PageCursor, Pagination, RecordsPage,
};
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Page size used by the real provider
pub const PAGE_SIZE: usize = 50;

/// An in-memory DnsProvider that paginates by record offset
///
/// Cursors are record offsets into the stored list. Writes are applied to
/// the stored records so a second run observes the first run's effects.
pub struct InMemoryProvider {
    records: Mutex<Vec<DnsRecord>>,
    page_size: usize,
    /// Delay before each page response (to observe concurrency)
    page_delay: Duration,
    /// Delay before each create/update response
    write_delay: Duration,
    /// Domain whose listing fails permanently
    failing_domain: Option<String>,
    /// Record name whose create/update fails permanently
    failing_name: Option<String>,
    /// Cursors requested, in order (`None` = first page)
    requested_pages: Mutex<Vec<Option<PageCursor>>>,
    created: Mutex<Vec<(String, NewRecord)>>,
    updated: Mutex<Vec<(String, String)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    next_id: AtomicUsize,
}

impl InMemoryProvider {
    pub fn new(records: Vec<DnsRecord>) -> Self {
        Self {
            next_id: AtomicUsize::new(records.len()),
            records: Mutex::new(records),
            page_size: PAGE_SIZE,
            page_delay: Duration::ZERO,
            write_delay: Duration::ZERO,
            failing_domain: None,
            failing_name: None,
            requested_pages: Mutex::new(Vec::new()),
            created: Mutex::new(Vec::new()),
            updated: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = delay;
        self
    }

    pub fn with_failing_domain(mut self, domain: impl Into<String>) -> Self {
        self.failing_domain = Some(domain.into());
        self
    }

    pub fn with_failing_name(mut self, name: impl Into<String>) -> Self {
        self.failing_name = Some(name.into());
        self
    }

    /// Number of pages fetched so far
    pub fn pages_fetched(&self) -> usize {
        self.requested_pages.lock().unwrap().len()
    }

    /// Cursors requested, in order
    pub fn requested_pages(&self) -> Vec<Option<PageCursor>> {
        self.requested_pages.lock().unwrap().clone()
    }

    /// `(domain, record)` pairs passed to create_record()
    pub fn created(&self) -> Vec<(String, NewRecord)> {
        self.created.lock().unwrap().clone()
    }

    /// `(record_id, value)` pairs passed to update_record()
    pub fn updated(&self) -> Vec<(String, String)> {
        self.updated.lock().unwrap().clone()
    }

    /// Total write calls
    pub fn write_count(&self) -> usize {
        self.created.lock().unwrap().len() + self.updated.lock().unwrap().len()
    }

    /// Highest number of concurrent upserts observed
    ///
    /// An upsert is counted from its first page request until its write
    /// returns, so the figure is exact only when every upsert writes (or
    /// its listing fails).
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Current stored records
    pub fn records(&self) -> Vec<DnsRecord> {
        self.records.lock().unwrap().clone()
    }

    fn begin_upsert(&self) {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
    }

    fn end_upsert(&self) {
        // Saturating: unchanged upserts never reach a write
        let _ = self
            .in_flight
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
    }

    /// Wait out the write delay, then close the upsert that issued the write
    async fn finish_write(&self) {
        if !self.write_delay.is_zero() {
            tokio::time::sleep(self.write_delay).await;
        }
        self.end_upsert();
    }
}

#[async_trait::async_trait]
impl DnsProvider for InMemoryProvider {
    async fn list_records_page(
        &self,
        domain: &str,
        since: Option<PageCursor>,
    ) -> Result<RecordsPage> {
        self.requested_pages.lock().unwrap().push(since);
        if since.is_none() {
            self.begin_upsert();
        }

        if !self.page_delay.is_zero() {
            tokio::time::sleep(self.page_delay).await;
        }

        if self.failing_domain.as_deref() == Some(domain) {
            self.end_upsert();
            return Err(Error::api("memory", 403, "forbidden"));
        }

        let records = self.records.lock().unwrap();
        let start = since.map(|c| c.0 as usize).unwrap_or(0).min(records.len());
        let end = (start + self.page_size).min(records.len());

        Ok(RecordsPage {
            records: records[start..end].to_vec(),
            pagination: Pagination {
                count: records.len() as u64,
                next: (end < records.len()).then_some(PageCursor(end as u64)),
                prev: (start > 0)
                    .then_some(PageCursor(start.saturating_sub(self.page_size) as u64)),
            },
        })
    }

    async fn create_record(&self, domain: &str, record: &NewRecord) -> Result<()> {
        self.finish_write().await;
        if self.failing_name.as_deref() == Some(record.name.as_str()) {
            return Err(Error::api("memory", 400, "invalid record"));
        }
        self.created
            .lock()
            .unwrap()
            .push((domain.to_string(), record.clone()));

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.records.lock().unwrap().push(DnsRecord {
            id: format!("rec_{}", id),
            name: record.name.clone(),
            record_type: record.record_type.clone(),
            value: record.value.clone(),
            ttl: None,
            extra: serde_json::json!({}),
        });
        Ok(())
    }

    async fn update_record(&self, record_id: &str, value: &str) -> Result<()> {
        self.finish_write().await;
        self.updated
            .lock()
            .unwrap()
            .push((record_id.to_string(), value.to_string()));

        let mut records = self.records.lock().unwrap();
        match records.iter_mut().find(|r| r.id == record_id) {
            Some(record) => {
                record.value = value.to_string();
                Ok(())
            }
            None => Err(Error::api("memory", 404, "record not found")),
        }
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// An IP source that always returns the same address
pub struct StaticIpSource {
    ip: IpAddr,
    call_count: Arc<AtomicUsize>,
}

impl StaticIpSource {
    pub fn new(ip: IpAddr) -> Self {
        Self {
            ip,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Shared handle to the current() call counter
    pub fn call_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.call_count)
    }
}

#[async_trait::async_trait]
impl IpSource for StaticIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip)
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}

/// An IP source whose lookup always fails
pub struct FailingIpSource;

#[async_trait::async_trait]
impl IpSource for FailingIpSource {
    async fn current(&self) -> Result<IpAddr> {
        Err(Error::ip_source("lookup service unavailable"))
    }

    fn source_name(&self) -> &'static str {
        "failing"
    }
}

/// Build a record with the given identity and value
pub fn record(id: &str, name: &str, record_type: &str, value: &str) -> DnsRecord {
    DnsRecord {
        id: id.to_string(),
        name: name.to_string(),
        record_type: record_type.to_string(),
        value: value.to_string(),
        ttl: Some(60),
        extra: serde_json::json!({ "creator": "test" }),
    }
}

/// `count` filler TXT records named `filler-N`
pub fn filler_records(count: usize) -> Vec<DnsRecord> {
    (0..count)
        .map(|i| record(&format!("rec_f{}", i), &format!("filler-{}", i), "TXT", "v=spf1 -all"))
        .collect()
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config(domain: &str, subdomains: &[&str]) -> ddns_core::config::DdnsConfig {
    ddns_core::config::DdnsConfig::new(
        domain,
        subdomains.iter().map(|s| s.to_string()).collect(),
        ddns_core::config::ProviderConfig::vercel("test-token"),
    )
}

/// Build an engine over a shared provider
pub fn engine_with(
    provider: Arc<InMemoryProvider>,
    ip: IpAddr,
    config: ddns_core::config::DdnsConfig,
) -> ddns_core::DdnsEngine {
    let (engine, _event_rx) =
        ddns_core::DdnsEngine::new(Box::new(StaticIpSource::new(ip)), Box::new(provider), config)
            .expect("engine construction succeeds");
    engine
}
