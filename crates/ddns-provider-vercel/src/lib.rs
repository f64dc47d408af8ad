// # Vercel DNS Provider
//
// This crate provides a Vercel DNS provider implementation for the DDNS system.
//
// Each trait method maps to exactly one Vercel API call made through the
// shared `ApiClient`, which owns auth, retry and backoff. Pagination is
// walked by the engine, not here.
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - List records:  GET   `/v4/domains/:domain/records?limit=50&since=:cursor`
// - Create record: POST  `/v2/domains/:domain/records`
// - Update record: PATCH `/v1/domains/records/:record_id`

pub mod models;

use async_trait::async_trait;
use ddns_core::config::{DEFAULT_VERCEL_API_BASE, ProviderConfig};
use ddns_core::traits::{DnsProvider, NewRecord, PageCursor, RecordsPage};
use ddns_core::{ApiClient, ApiRequest, Error, Result, RetryPolicy};
use models::{ListRecordsResponse, UpdateRecordRequest};
use tracing::debug;

/// Records requested per listing page
pub const PAGE_LIMIT: u32 = 50;

const PROVIDER_NAME: &str = "vercel";

/// Vercel DNS provider
///
/// Stateless and cheap to share: the engine calls it from several upserts
/// at once through a shared reference.
#[derive(Debug, Clone)]
pub struct VercelProvider {
    client: ApiClient,
}

impl VercelProvider {
    /// Create a provider against the public Vercel API with default retries
    pub fn new(api_token: impl Into<String>) -> Result<Self> {
        Self::builder(api_token).build()
    }

    /// Start building a provider
    pub fn builder(api_token: impl Into<String>) -> VercelProviderBuilder {
        VercelProviderBuilder {
            api_token: api_token.into(),
            api_base: DEFAULT_VERCEL_API_BASE.to_string(),
            retry_policy: RetryPolicy::default(),
        }
    }

    /// Create a provider from configuration
    pub fn from_config(config: &ProviderConfig, retry_policy: RetryPolicy) -> Result<Self> {
        match config {
            ProviderConfig::Vercel { api_token, api_base } => Self::builder(api_token.clone())
                .api_base(api_base.clone())
                .retry(retry_policy)
                .build(),
        }
    }

    /// Underlying API client
    pub fn client(&self) -> &ApiClient {
        &self.client
    }
}

/// Builder for [`VercelProvider`]
pub struct VercelProviderBuilder {
    api_token: String,
    api_base: String,
    retry_policy: RetryPolicy,
}

impl VercelProviderBuilder {
    /// Override the API base URL
    pub fn api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set the retry policy for every call
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Build the provider
    pub fn build(self) -> Result<VercelProvider> {
        if self.api_token.is_empty() {
            return Err(Error::config("Vercel API token cannot be empty"));
        }

        let client = ApiClient::builder(PROVIDER_NAME, self.api_base)
            .bearer_token(self.api_token)
            .retry(self.retry_policy)
            .build()?;

        Ok(VercelProvider { client })
    }
}

#[async_trait]
impl DnsProvider for VercelProvider {
    async fn list_records_page(
        &self,
        domain: &str,
        since: Option<PageCursor>,
    ) -> Result<RecordsPage> {
        let request = ApiRequest::get(format!("/v4/domains/{}/records", domain))
            .query("limit", PAGE_LIMIT)
            .query_opt("since", since);

        let response: ListRecordsResponse = self.client.invoke(&request).await?;
        debug!(
            domain,
            records = response.records.len(),
            count = response.pagination.count,
            "Listed Vercel records"
        );

        Ok(response.into())
    }

    async fn create_record(&self, domain: &str, record: &NewRecord) -> Result<()> {
        let request = ApiRequest::post(format!("/v2/domains/{}/records", domain)).json(record)?;
        self.client.invoke_empty(&request).await
    }

    async fn update_record(&self, record_id: &str, value: &str) -> Result<()> {
        let request = ApiRequest::patch(format!("/v1/domains/records/{}", record_id))
            .json(&UpdateRecordRequest { value })?;
        self.client.invoke_empty(&request).await
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER_NAME
    }
}
