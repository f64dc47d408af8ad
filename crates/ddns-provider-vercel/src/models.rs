//! Vercel DNS wire types
//!
//! Only the fields the engine needs are required; everything else Vercel
//! reports is optional so new or missing metadata never breaks a listing.

use ddns_core::traits::{DnsRecord, PageCursor, Pagination, RecordsPage};
use serde::{Deserialize, Serialize};

/// A record as returned by `GET /v4/domains/{domain}/records`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VercelRecord {
    pub id: String,
    #[serde(default)]
    pub slug: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub value: String,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub created: Option<u64>,
    #[serde(default)]
    pub updated: Option<u64>,
    #[serde(default)]
    pub created_at: Option<u64>,
    #[serde(default)]
    pub updated_at: Option<u64>,
    #[serde(default)]
    pub ttl: Option<u64>,
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub mx_priority: Option<u64>,
}

impl From<VercelRecord> for DnsRecord {
    fn from(record: VercelRecord) -> Self {
        let extra = serde_json::json!({
            "slug": record.slug,
            "creator": record.creator,
            "created": record.created,
            "updated": record.updated,
            "createdAt": record.created_at,
            "updatedAt": record.updated_at,
            "comment": record.comment,
            "mxPriority": record.mx_priority,
        });

        DnsRecord {
            id: record.id,
            name: record.name,
            record_type: record.record_type,
            value: record.value,
            ttl: record.ttl,
            extra,
        }
    }
}

/// Cursor block of a listing response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VercelPagination {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<u64>,
    #[serde(default)]
    pub prev: Option<u64>,
}

impl From<VercelPagination> for Pagination {
    fn from(p: VercelPagination) -> Self {
        Pagination {
            count: p.count,
            next: p.next.map(PageCursor),
            prev: p.prev.map(PageCursor),
        }
    }
}

/// Body of `GET /v4/domains/{domain}/records`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRecordsResponse {
    pub records: Vec<VercelRecord>,
    #[serde(default)]
    pub pagination: VercelPagination,
}

impl From<ListRecordsResponse> for RecordsPage {
    fn from(response: ListRecordsResponse) -> Self {
        RecordsPage {
            records: response.records.into_iter().map(DnsRecord::from).collect(),
            pagination: response.pagination.into(),
        }
    }
}

/// Body of `PATCH /v1/domains/records/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateRecordRequest<'a> {
    pub value: &'a str,
}
