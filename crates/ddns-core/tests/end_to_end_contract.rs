//! Contract Test: End-to-End Run
//!
//! Constraints verified:
//! - The IP is resolved exactly once per run
//! - An empty record set gets one create per subdomain
//! - A failed IP lookup aborts before any DNS call
//! - Engine events describe the run

mod common;

use common::*;
use ddns_core::traits::NewRecord;
use ddns_core::{DdnsEngine, EngineEvent, Error};
use std::net::IpAddr;
use std::sync::Arc;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn empty_zone_gets_one_create_per_subdomain() {
    let provider = Arc::new(InMemoryProvider::empty());
    let ip_source = StaticIpSource::new("203.0.113.7".parse().unwrap());
    let ip_calls = ip_source.call_counter();

    let (engine, _event_rx) = DdnsEngine::new(
        Box::new(ip_source),
        Box::new(Arc::clone(&provider)),
        minimal_config("example.com", &["home", "nas"]),
    )
    .expect("engine construction succeeds");

    let report = engine.run_once().await.unwrap();

    assert_eq!(ip_calls.load(Ordering::SeqCst), 1);
    assert_eq!(report.created(), 2);

    let mut created = provider.created();
    created.sort_by(|a, b| a.1.name.cmp(&b.1.name));
    assert_eq!(
        created,
        vec![
            (
                "example.com".to_string(),
                NewRecord {
                    name: "home".to_string(),
                    record_type: "A".to_string(),
                    value: "203.0.113.7".to_string(),
                }
            ),
            (
                "example.com".to_string(),
                NewRecord {
                    name: "nas".to_string(),
                    record_type: "A".to_string(),
                    value: "203.0.113.7".to_string(),
                }
            ),
        ]
    );
    assert!(provider.updated().is_empty());
}

#[tokio::test]
async fn failed_ip_lookup_aborts_before_dns_work() {
    let provider = Arc::new(InMemoryProvider::empty());

    let (engine, _event_rx) = DdnsEngine::new(
        Box::new(FailingIpSource),
        Box::new(Arc::clone(&provider)),
        minimal_config("example.com", &["home"]),
    )
    .expect("engine construction succeeds");

    let err = engine.run_once().await.unwrap_err();

    assert!(matches!(err, Error::IpSource(_)));
    assert_eq!(provider.pages_fetched(), 0);
    assert_eq!(provider.write_count(), 0);
}

#[tokio::test]
async fn listing_failure_is_fatal() {
    let provider = Arc::new(InMemoryProvider::empty().with_failing_domain("example.com"));
    let ip: IpAddr = "203.0.113.7".parse().unwrap();
    let engine = engine_with(
        Arc::clone(&provider),
        ip,
        minimal_config("example.com", &["home"]),
    );

    let err = engine.run_once().await.unwrap_err();

    assert_eq!(err.status(), Some(403));
    assert_eq!(provider.write_count(), 0);
}

#[tokio::test]
async fn invalid_config_is_rejected() {
    let result = DdnsEngine::new(
        Box::new(StaticIpSource::new("203.0.113.7".parse().unwrap())),
        Box::new(InMemoryProvider::empty()),
        minimal_config("example.com", &[]),
    );

    assert!(matches!(result, Err(Error::Config(_))));
}

#[tokio::test]
async fn events_describe_the_run() {
    let provider = Arc::new(InMemoryProvider::new(vec![record(
        "rec_nas",
        "nas",
        "A",
        "203.0.113.7",
    )]));
    let ip: IpAddr = "203.0.113.7".parse().unwrap();

    let (engine, mut event_rx) = DdnsEngine::new(
        Box::new(StaticIpSource::new(ip)),
        Box::new(Arc::clone(&provider)),
        minimal_config("example.com", &["home", "nas"]),
    )
    .expect("engine construction succeeds");

    engine.run_once().await.unwrap();
    drop(engine);

    let mut events = Vec::new();
    while let Some(event) = event_rx.recv().await {
        events.push(event);
    }

    assert_eq!(events.first(), Some(&EngineEvent::Started { records_count: 2 }));
    assert!(events.contains(&EngineEvent::IpResolved { ip }));
    assert!(events.contains(&EngineEvent::RecordCreated {
        record_name: "home.example.com".to_string(),
        value: "203.0.113.7".to_string(),
    }));
    assert!(events.contains(&EngineEvent::RecordUnchanged {
        record_name: "nas.example.com".to_string(),
        value: "203.0.113.7".to_string(),
    }));
    assert_eq!(
        events.last(),
        Some(&EngineEvent::Finished {
            created: 1,
            updated: 0,
            unchanged: 1,
        })
    );
}
