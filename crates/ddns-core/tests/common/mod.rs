//! Test doubles and common utilities for engine contract tests
//!
//! The doubles make no network calls. Each one counts its calls through
//! shared atomics so a test can keep a handle after the engine has taken
//! ownership of the boxed trait object.

#![allow(dead_code)]

use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, DnsRecord, IpSource};
use ddns_core::EngineSettings;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const ZONE_NAME: &str = "example.com";
pub const ZONE_ID: &str = "zone-123";
pub const RECORD_NAME: &str = "home.example.com";
pub const RECORD_ID: &str = "record-456";

/// One scripted resolver response
#[derive(Debug, Clone)]
pub enum Step {
    Ip(String),
    Fail,
}

impl From<&str> for Step {
    fn from(ip: &str) -> Self {
        Step::Ip(ip.to_string())
    }
}

/// An IpSource that replays a fixed script, repeating the last step forever
pub struct ScriptedIpSource {
    script: Arc<Vec<Step>>,
    fetch_call_count: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    pub fn new<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Step>,
    {
        let script: Vec<Step> = steps.into_iter().map(Into::into).collect();
        assert!(!script.is_empty(), "script needs at least one step");

        Self {
            script: Arc::new(script),
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times fetch() was called
    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }

    /// Create a new ScriptedIpSource that shares script and counters
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            script: Arc::clone(&other.script),
            fetch_call_count: Arc::clone(&other.fetch_call_count),
        }
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn fetch(&self) -> Result<String> {
        let call = self.fetch_call_count.fetch_add(1, Ordering::SeqCst);
        let step = self
            .script
            .get(call)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or(Step::Fail);

        match step {
            Step::Ip(ip) => Ok(ip),
            Step::Fail => Err(Error::network("scripted failure")),
        }
    }
}

/// A mock DnsProvider holding a single A-record
pub struct MockDnsProvider {
    initial_content: String,
    zone_exists: bool,
    record_exists: bool,
    resolve_call_count: Arc<AtomicUsize>,
    lookup_call_count: Arc<AtomicUsize>,
    /// Contents passed to update(), in call order, failed calls included
    update_calls: Arc<Mutex<Vec<String>>>,
    /// Number of upcoming update() calls that fail
    failing_updates: Arc<AtomicUsize>,
}

impl MockDnsProvider {
    pub fn new(initial_content: &str) -> Self {
        Self {
            initial_content: initial_content.to_string(),
            zone_exists: true,
            record_exists: true,
            resolve_call_count: Arc::new(AtomicUsize::new(0)),
            lookup_call_count: Arc::new(AtomicUsize::new(0)),
            update_calls: Arc::new(Mutex::new(Vec::new())),
            failing_updates: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn without_zone(mut self) -> Self {
        self.zone_exists = false;
        self
    }

    pub fn without_record(mut self) -> Self {
        self.record_exists = false;
        self
    }

    /// Make the next `n` update() calls fail
    pub fn fail_next_updates(&self, n: usize) {
        self.failing_updates.store(n, Ordering::SeqCst);
    }

    pub fn resolve_call_count(&self) -> usize {
        self.resolve_call_count.load(Ordering::SeqCst)
    }

    pub fn lookup_call_count(&self) -> usize {
        self.lookup_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of times update() was called
    pub fn update_call_count(&self) -> usize {
        self.update_calls.lock().unwrap().len()
    }

    /// Contents passed to update(), in call order
    pub fn update_calls(&self) -> Vec<String> {
        self.update_calls.lock().unwrap().clone()
    }

    pub fn network_call_count(&self) -> usize {
        self.resolve_call_count() + self.lookup_call_count() + self.update_call_count()
    }

    /// Create a new MockDnsProvider that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            initial_content: other.initial_content.clone(),
            zone_exists: other.zone_exists,
            record_exists: other.record_exists,
            resolve_call_count: Arc::clone(&other.resolve_call_count),
            lookup_call_count: Arc::clone(&other.lookup_call_count),
            update_calls: Arc::clone(&other.update_calls),
            failing_updates: Arc::clone(&other.failing_updates),
        }
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn resolve_zone(&self, zone_name: &str) -> Result<String> {
        self.resolve_call_count.fetch_add(1, Ordering::SeqCst);
        if self.zone_exists && zone_name == ZONE_NAME {
            Ok(ZONE_ID.to_string())
        } else {
            Err(Error::not_found(format!("Zone not found: {}", zone_name)))
        }
    }

    async fn lookup(&self, zone_id: &str, record_name: &str) -> Result<DnsRecord> {
        self.lookup_call_count.fetch_add(1, Ordering::SeqCst);
        assert_eq!(zone_id, ZONE_ID);
        if !self.record_exists || record_name != RECORD_NAME {
            return Err(Error::not_found(format!(
                "no A record found for {}",
                record_name
            )));
        }

        Ok(DnsRecord {
            id: RECORD_ID.to_string(),
            name: record_name.to_string(),
            content: self.initial_content.clone(),
        })
    }

    async fn update(&self, zone_id: &str, record_id: &str, content: &str) -> Result<()> {
        assert_eq!(zone_id, ZONE_ID);
        assert_eq!(record_id, RECORD_ID);
        self.update_calls.lock().unwrap().push(content.to_string());

        let should_fail = self
            .failing_updates
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if should_fail {
            return Err(Error::provider("mock", "Provider unavailable"));
        }

        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Settings pointing at the mock zone and record
pub fn test_settings(interval: Duration) -> EngineSettings {
    EngineSettings {
        zone_name: ZONE_NAME.to_string(),
        record_name: RECORD_NAME.to_string(),
        interval,
    }
}

/// Default five-minute settings
pub fn default_settings() -> EngineSettings {
    test_settings(Duration::from_secs(5 * 60))
}
