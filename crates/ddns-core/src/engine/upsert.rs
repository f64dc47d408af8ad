//! Record matching and the create / update / no-op decision

use super::{DdnsEngine, EngineEvent, list_records};
use crate::error::Result;
use crate::traits::{DnsRecord, NewRecord};
use std::net::IpAddr;
use tokio_stream::StreamExt;
use tracing::{debug, info};

/// DNS record type managed by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    /// A record (IPv4)
    A,
    /// AAAA record (IPv6)
    Aaaa,
}

impl RecordType {
    /// Record type that holds `ip`
    pub fn for_ip(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::Aaaa,
        }
    }

    /// Wire name ("A" / "AAAA")
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl std::fmt::Display for RecordType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired state of one record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertTarget {
    /// Domain the record lives under
    pub domain: String,
    /// Record name relative to the domain
    pub subdomain: String,
    /// Record type
    pub record_type: RecordType,
    /// Desired value
    pub value: String,
}

impl UpsertTarget {
    /// Target pointing `subdomain.domain` at `ip`
    pub fn for_ip(domain: impl Into<String>, subdomain: impl Into<String>, ip: IpAddr) -> Self {
        Self {
            domain: domain.into(),
            subdomain: subdomain.into(),
            record_type: RecordType::for_ip(ip),
            value: ip.to_string(),
        }
    }

    /// Fully-qualified name, for logs and errors
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.subdomain, self.domain)
    }

    /// Whether `record` is the record this target manages
    pub fn matches(&self, record: &DnsRecord) -> bool {
        record.record_type == self.record_type.as_str() && record.name == self.subdomain
    }
}

/// What an upsert did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No matching record existed; one was created
    Created,
    /// A matching record had a different value and was updated
    Updated {
        /// ID of the updated record
        record_id: String,
        /// Value before the update
        previous_value: String,
    },
    /// A matching record already had the desired value
    Unchanged,
}

impl DdnsEngine {
    /// Make the provider hold exactly `target` for its (name, type) pair
    ///
    /// The first matching record in listing order is authoritative; the
    /// listing stops as soon as it is found. Running this again against
    /// unchanged provider state yields [`UpsertOutcome::Unchanged`].
    pub async fn upsert(&self, target: &UpsertTarget) -> Result<UpsertOutcome> {
        let existing = {
            let mut records = list_records(self.provider.as_ref(), &target.domain);
            let mut found = None;
            while let Some(record) = records.next().await {
                let record = record?;
                if target.matches(&record) {
                    found = Some(record);
                    break;
                }
            }
            found
        };

        match existing {
            Some(record) if record.value == target.value => {
                debug!("{} already points at {}", target.fqdn(), target.value);
                self.emit_event(EngineEvent::RecordUnchanged {
                    record_name: target.fqdn(),
                    value: target.value.clone(),
                });
                Ok(UpsertOutcome::Unchanged)
            }
            Some(record) => {
                info!(
                    "{} {} -> {} (was: {})",
                    if self.dry_run { "Would update" } else { "Updating" },
                    target.fqdn(),
                    target.value,
                    record.value
                );
                if !self.dry_run {
                    self.provider.update_record(&record.id, &target.value).await?;
                }
                self.emit_event(EngineEvent::RecordUpdated {
                    record_name: target.fqdn(),
                    value: target.value.clone(),
                    previous_value: record.value.clone(),
                });
                Ok(UpsertOutcome::Updated {
                    record_id: record.id,
                    previous_value: record.value,
                })
            }
            None => {
                info!(
                    "{} {} {} -> {}",
                    if self.dry_run { "Would create" } else { "Creating" },
                    target.record_type,
                    target.fqdn(),
                    target.value
                );
                if !self.dry_run {
                    let record = NewRecord {
                        name: target.subdomain.clone(),
                        record_type: target.record_type.as_str().to_string(),
                        value: target.value.clone(),
                    };
                    self.provider.create_record(&target.domain, &record).await?;
                }
                self.emit_event(EngineEvent::RecordCreated {
                    record_name: target.fqdn(),
                    value: target.value.clone(),
                });
                Ok(UpsertOutcome::Created)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, record_type: &str) -> DnsRecord {
        DnsRecord {
            id: "rec_1".to_string(),
            name: name.to_string(),
            record_type: record_type.to_string(),
            value: "198.51.100.1".to_string(),
            ttl: None,
            extra: serde_json::Value::Null,
        }
    }

    #[test]
    fn record_type_follows_address_family() {
        assert_eq!(RecordType::for_ip("203.0.113.7".parse().unwrap()), RecordType::A);
        assert_eq!(RecordType::for_ip("2001:db8::1".parse().unwrap()), RecordType::Aaaa);
        assert_eq!(RecordType::Aaaa.to_string(), "AAAA");
    }

    #[test]
    fn target_matches_on_name_and_type_only() {
        let target = UpsertTarget::for_ip("example.com", "home", "203.0.113.7".parse().unwrap());
        assert_eq!(target.value, "203.0.113.7");
        assert_eq!(target.fqdn(), "home.example.com");

        assert!(target.matches(&record("home", "A")));
        assert!(!target.matches(&record("home", "AAAA")));
        assert!(!target.matches(&record("home", "TXT")));
        assert!(!target.matches(&record("nas", "A")));
    }
}
