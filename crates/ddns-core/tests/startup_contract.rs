//! Contract Test: Startup Is All-or-Nothing
//!
//! Constraints verified:
//! - Missing configuration stops the process before any network call
//! - An unresolvable zone or record prevents the engine from existing
//! - A successful start seeds state from exactly one lookup

mod common;

use common::*;
use ddns_core::{DdnsConfig, DdnsEngine, EngineSettings, Error};

const A: &str = "192.0.2.1";

/// Same order the daemon uses: configuration first, then the engine
async fn boot<F>(
    lookup: F,
    source: &ScriptedIpSource,
    provider: &MockDnsProvider,
) -> ddns_core::Result<DdnsEngine>
where
    F: Fn(&str) -> Option<String>,
{
    let config = DdnsConfig::from_lookup(lookup)?;
    DdnsEngine::start(
        Box::new(ScriptedIpSource::sharing_counters_with(source)),
        Box::new(MockDnsProvider::sharing_counters_with(provider)),
        EngineSettings::from(&config),
    )
    .await
}

fn env_without(absent: &'static str) -> impl Fn(&str) -> Option<String> {
    move |key| {
        if key == absent {
            return None;
        }
        match key {
            "CF_API_TOKEN" => Some("test-token".to_string()),
            "CF_ZONE_NAME" => Some(ZONE_NAME.to_string()),
            "CF_RECORD_NAME" => Some(RECORD_NAME.to_string()),
            _ => None,
        }
    }
}

#[tokio::test]
async fn missing_required_config_makes_no_network_calls() {
    for absent in ["CF_API_TOKEN", "CF_ZONE_NAME", "CF_RECORD_NAME"] {
        let source = ScriptedIpSource::new([A]);
        let provider = MockDnsProvider::new(A);

        let result = boot(env_without(absent), &source, &provider).await;

        match result {
            Err(Error::MissingConfig(missing)) => assert_eq!(missing, vec![absent.to_string()]),
            Err(other) => panic!("expected MissingConfig, got {:?}", other),
            Ok(_) => panic!("engine must not start without {}", absent),
        }
        assert_eq!(provider.network_call_count(), 0);
        assert_eq!(source.fetch_call_count(), 0);
    }
}

#[tokio::test]
async fn complete_config_boots_engine() {
    let source = ScriptedIpSource::new([A]);
    let provider = MockDnsProvider::new(A);

    let engine = boot(env_without("NOTHING"), &source, &provider)
        .await
        .expect("engine starts");

    assert_eq!(engine.interval(), std::time::Duration::from_secs(300));
    assert_eq!(source.fetch_call_count(), 0, "startup never fetches the IP");
}

#[tokio::test]
async fn unknown_zone_is_fatal() {
    let source = ScriptedIpSource::new([A]);
    let provider = MockDnsProvider::new(A).without_zone();

    let result = DdnsEngine::start(
        Box::new(ScriptedIpSource::sharing_counters_with(&source)),
        Box::new(MockDnsProvider::sharing_counters_with(&provider)),
        default_settings(),
    )
    .await;

    assert!(matches!(result, Err(Error::NotFound(_))));
    assert_eq!(provider.resolve_call_count(), 1);
    assert_eq!(provider.lookup_call_count(), 0);
    assert_eq!(source.fetch_call_count(), 0);
}

#[tokio::test]
async fn missing_record_is_fatal() {
    let source = ScriptedIpSource::new([A]);
    let provider = MockDnsProvider::new(A).without_record();

    let result = DdnsEngine::start(
        Box::new(ScriptedIpSource::sharing_counters_with(&source)),
        Box::new(MockDnsProvider::sharing_counters_with(&provider)),
        default_settings(),
    )
    .await;

    assert!(matches!(result, Err(Error::NotFound(_))));
    assert_eq!(provider.lookup_call_count(), 1, "no retry at startup");
    assert_eq!(source.fetch_call_count(), 0);
}

#[tokio::test]
async fn start_seeds_state_from_lookup() {
    let source = ScriptedIpSource::new([A]);
    let provider = MockDnsProvider::new(A);

    let engine = DdnsEngine::start(
        Box::new(ScriptedIpSource::sharing_counters_with(&source)),
        Box::new(MockDnsProvider::sharing_counters_with(&provider)),
        default_settings(),
    )
    .await
    .expect("engine starts");

    assert_eq!(engine.zone_id(), ZONE_ID);
    assert_eq!(engine.record_id(), RECORD_ID);
    assert_eq!(engine.last_known_ip(), A);
    assert_eq!(provider.resolve_call_count(), 1);
    assert_eq!(provider.lookup_call_count(), 1);
    assert_eq!(provider.update_call_count(), 0);
}
