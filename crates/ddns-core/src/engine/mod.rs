//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Fetching the current IP once per run via IpSource
//! - Walking the provider's record listing to find each target record
//! - Creating, updating or leaving each record as it is
//! - Bounding how many records are reconciled at once
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  IpSource   │─── current IP ──────┐
//! └─────────────┘                     │
//!                                     ▼
//!                            ┌──────────────┐
//!                            │ DdnsEngine   │  reconcile(): ≤ concurrency upserts
//!                            └──────────────┘
//!                                     │
//!         ┌───────────────────────────┼───────────────────────────┐
//!         │                           │                           │
//!         ▼                           ▼                           ▼
//! ┌──────────────┐          ┌──────────────┐           ┌─────────────┐
//! │ list_records │          │ DnsProvider  │           │   Events    │
//! │ (find match) │          │ (create/upd) │           │  (notify)   │
//! └──────────────┘          └──────────────┘           └─────────────┘
//! ```
//!
//! ## Run Flow
//!
//! 1. Resolve the current IP (fatal on failure, before any DNS work)
//! 2. For each subdomain, in configured order, start an upsert
//! 3. Each upsert streams the listing until the first (name, type) match
//! 4. Create, update or skip
//! 5. The first failed upsert fails the run; upserts still in flight are dropped

pub mod lister;
pub mod upsert;

pub use lister::{RecordStream, list_records};
pub use upsert::{RecordType, UpsertOutcome, UpsertTarget};

use crate::config::DdnsConfig;
use crate::error::{Error, Result};
use crate::traits::{DnsProvider, IpSource};
use futures_util::{StreamExt, TryStreamExt, stream};
use std::net::IpAddr;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Run started
    Started {
        records_count: usize,
    },

    /// Current IP resolved
    IpResolved {
        ip: IpAddr,
    },

    /// Upsert of one record started
    UpsertStarted {
        record_name: String,
    },

    /// Record created
    RecordCreated {
        record_name: String,
        value: String,
    },

    /// Record updated
    RecordUpdated {
        record_name: String,
        value: String,
        previous_value: String,
    },

    /// Record already correct
    RecordUnchanged {
        record_name: String,
        value: String,
    },

    /// Upsert failed
    UpsertFailed {
        record_name: String,
        error: String,
    },

    /// Run finished successfully
    Finished {
        created: usize,
        updated: usize,
        unchanged: usize,
    },
}

/// Outcome of a reconciliation pass, in configured subdomain order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// `(subdomain, outcome)` pairs
    pub outcomes: Vec<(String, UpsertOutcome)>,
}

impl ReconcileReport {
    /// Number of records created
    pub fn created(&self) -> usize {
        self.count(|o| matches!(o, UpsertOutcome::Created))
    }

    /// Number of records updated
    pub fn updated(&self) -> usize {
        self.count(|o| matches!(o, UpsertOutcome::Updated { .. }))
    }

    /// Number of records left as they were
    pub fn unchanged(&self) -> usize {
        self.count(|o| matches!(o, UpsertOutcome::Unchanged))
    }

    /// Outcome for `subdomain`
    pub fn outcome(&self, subdomain: &str) -> Option<&UpsertOutcome> {
        self.outcomes
            .iter()
            .find(|(name, _)| name == subdomain)
            .map(|(_, outcome)| outcome)
    }

    fn count(&self, pred: impl Fn(&UpsertOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Core DDNS engine
///
/// The engine is stateless between runs: every run re-reads the provider,
/// so repeating a run against unchanged state performs no writes.
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`]
/// 2. Call [`DdnsEngine::run_once()`] (or [`DdnsEngine::reconcile()`] with a known IP)
/// 3. Drop
///
/// ## Concurrency
///
/// Up to `engine.concurrency` upserts run at once, multiplexed on the calling
/// task. The provider is shared by reference and must be `Sync`.
pub struct DdnsEngine {
    /// IP source for the current address
    ip_source: Box<dyn IpSource>,

    /// DNS provider for reading and writing records
    provider: Box<dyn DnsProvider>,

    /// Domain under which records are managed
    domain: String,

    /// Subdomains to reconcile, in order
    subdomains: Vec<String>,

    /// Maximum upserts in flight
    concurrency: usize,

    /// Skip writes, log what would change
    dry_run: bool,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `config`: DDNS configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        if config.engine.dry_run {
            warn!("Engine running in DRY-RUN mode - no records will be created or updated");
        }

        let engine = Self {
            ip_source,
            provider,
            domain: config.domain,
            subdomains: config.subdomains,
            concurrency: config.engine.concurrency,
            dry_run: config.engine.dry_run,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run one full pass: resolve the IP, then reconcile every configured subdomain
    ///
    /// # Returns
    ///
    /// - `Ok(ReconcileReport)`: Every record now points at the current IP
    /// - `Err(Error)`: IP lookup failed, or the first record that failed
    pub async fn run_once(&self) -> Result<ReconcileReport> {
        self.emit_event(EngineEvent::Started {
            records_count: self.subdomains.len(),
        });

        // Fatal errors are returned, not logged; the caller reports them once
        let ip = self.ip_source.current().await.map_err(|e| {
            debug!(
                "Failed to resolve current IP via {}: {}",
                self.ip_source.source_name(),
                e
            );
            e
        })?;
        info!("Current IP: {}", ip);
        self.emit_event(EngineEvent::IpResolved { ip });

        let report = self.reconcile(&self.domain, &self.subdomains, ip).await?;

        info!(
            "Reconciled {} record(s): {} created, {} updated, {} unchanged",
            report.outcomes.len(),
            report.created(),
            report.updated(),
            report.unchanged()
        );
        self.emit_event(EngineEvent::Finished {
            created: report.created(),
            updated: report.updated(),
            unchanged: report.unchanged(),
        });

        Ok(report)
    }

    /// Point `subdomain.domain` at `ip` for every subdomain
    ///
    /// Upserts are started in `subdomains` order with at most `concurrency`
    /// in flight. The first failure is returned immediately and the upserts
    /// still in flight are dropped, so no further requests are issued for them.
    pub async fn reconcile(
        &self,
        domain: &str,
        subdomains: &[String],
        ip: IpAddr,
    ) -> Result<ReconcileReport> {
        let mut outcomes: Vec<(usize, String, UpsertOutcome)> = stream::iter(
            subdomains.iter().enumerate(),
        )
        .map(|(index, subdomain)| async move {
            let target = UpsertTarget::for_ip(domain, subdomain.as_str(), ip);
            let outcome = self.upsert_logged(&target).await?;
            Ok::<_, Error>((index, subdomain.clone(), outcome))
        })
        .buffer_unordered(self.concurrency)
        .try_collect()
        .await?;

        outcomes.sort_by_key(|(index, _, _)| *index);

        Ok(ReconcileReport {
            outcomes: outcomes
                .into_iter()
                .map(|(_, subdomain, outcome)| (subdomain, outcome))
                .collect(),
        })
    }

    /// Upsert with progress logging and error context
    async fn upsert_logged(&self, target: &UpsertTarget) -> Result<UpsertOutcome> {
        let record_name = target.fqdn();
        info!("Processing {}...", record_name);
        self.emit_event(EngineEvent::UpsertStarted {
            record_name: record_name.clone(),
        });

        self.upsert(target).await.map_err(|e| {
            debug!("Failed to reconcile {}: {}", record_name, e);
            self.emit_event(EngineEvent::UpsertFailed {
                record_name: record_name.clone(),
                error: e.to_string(),
            });
            Error::upsert(record_name, e)
        })
    }

    /// Emit an engine event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event");
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                debug!("Event receiver dropped, event discarded");
            }
        }
    }
}
