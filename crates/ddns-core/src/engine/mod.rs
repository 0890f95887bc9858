//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Resolving the zone and seeding the last known record content at startup
//! - Fetching the public IP on every tick
//! - Validating it and comparing it to the last known content
//! - Updating the record via DnsProvider when the two differ
//!
//! ## Architecture
//!
//! ```text
//!   ticker ──tick──▶ ┌──────────────┐
//!                    │  DdnsEngine  │ owns RecordState
//!                    └──────────────┘
//!                       │         │
//!                       ▼         ▼
//!               ┌──────────┐  ┌─────────────┐
//!               │ IpSource │  │ DnsProvider │
//!               │ (fetch)  │  │ (update)    │
//!               └──────────┘  └─────────────┘
//! ```
//!
//! ## Tick Flow
//!
//! 1. Fetch candidate address (failure: log, skip)
//! 2. Validate it (invalid: log, skip)
//! 3. Equal to last known content: log, skip
//! 4. Otherwise update; only a successful update moves the last known content
//!
//! Comparison is plain string equality. Two spellings of the same IPv6
//! address count as a change.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{debug, error, info, warn};

use crate::config::DdnsConfig;
use crate::error::Result;
use crate::traits::{DnsProvider, IpSource};
use crate::validate::is_valid_ip;

/// What the engine needs to know about the record it manages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    /// Zone name resolved once at startup
    pub zone_name: String,
    /// A-record name looked up once at startup
    pub record_name: String,
    /// Delay between ticks
    pub interval: Duration,
}

impl From<&DdnsConfig> for EngineSettings {
    fn from(config: &DdnsConfig) -> Self {
        Self {
            zone_name: config.zone_name.clone(),
            record_name: config.record_name.clone(),
            interval: config.update_interval,
        }
    }
}

/// In-memory view of the managed record
///
/// `last_known_ip` equals the provider's content as of the startup lookup
/// or the last successful update. It is never re-read from the provider.
#[derive(Debug, Clone, PartialEq, Eq)]
struct RecordState {
    zone_id: String,
    record_id: String,
    last_known_ip: String,
}

/// Result of one evaluation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The IP-echo call failed
    FetchFailed(String),

    /// The resolver returned something that is not an IP literal
    InvalidIp(String),

    /// Public IP equals the last known record content
    Unchanged,

    /// Record updated
    Updated {
        previous: String,
        current: String,
    },

    /// The provider rejected the update; state left as it was
    UpdateFailed {
        attempted: String,
        error: String,
    },
}

/// Core DDNS engine
///
/// ## Lifecycle
///
/// 1. [`DdnsEngine::start()`] resolves the zone and record (fatal on error)
/// 2. [`DdnsEngine::run()`] ticks forever, or [`DdnsEngine::run_until()`]
///    ticks until the given future completes
///
/// Ticks are evaluated one at a time on the calling task. The engine spawns
/// nothing.
pub struct DdnsEngine {
    /// IP source for discovering the public address
    ip_source: Box<dyn IpSource>,

    /// DNS provider for updating the record
    provider: Box<dyn DnsProvider>,

    /// Record name, for log lines
    record_name: String,

    /// Delay between ticks
    interval: Duration,

    /// Mutated only by `tick`
    state: RecordState,
}

impl DdnsEngine {
    /// Resolve the zone, look up the record and seed the last known content
    ///
    /// # Errors
    ///
    /// Any provider error. Nothing is retried; callers treat a failure here
    /// as fatal.
    pub async fn start(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        settings: EngineSettings,
    ) -> Result<Self> {
        debug!(
            "Resolving zone {} via {}",
            settings.zone_name,
            provider.provider_name()
        );
        let zone_id = provider.resolve_zone(&settings.zone_name).await?;

        let record = provider.lookup(&zone_id, &settings.record_name).await?;
        info!(
            "Current DNS record {} points to {}",
            settings.record_name, record.content
        );

        Ok(Self {
            ip_source,
            provider,
            record_name: settings.record_name,
            interval: settings.interval,
            state: RecordState {
                zone_id,
                record_id: record.id,
                last_known_ip: record.content,
            },
        })
    }

    /// Last record content known to be live at the provider
    pub fn last_known_ip(&self) -> &str {
        &self.state.last_known_ip
    }

    pub fn zone_id(&self) -> &str {
        &self.state.zone_id
    }

    pub fn record_id(&self) -> &str {
        &self.state.record_id
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one fetch, validate, compare, update pass
    pub async fn tick(&mut self) -> TickOutcome {
        let current_ip = match self.ip_source.fetch().await {
            Ok(ip) => ip,
            Err(e) => {
                warn!("Error fetching public IP: {}", e);
                return TickOutcome::FetchFailed(e.to_string());
            }
        };

        if !is_valid_ip(&current_ip) {
            warn!("Invalid IP address: '{}'", current_ip);
            return TickOutcome::InvalidIp(current_ip);
        }

        info!("Current public IP: {}", current_ip);

        if current_ip == self.state.last_known_ip {
            info!("IP address has not changed. No update needed.");
            return TickOutcome::Unchanged;
        }

        info!(
            "IP has changed from {} to {}. Updating DNS record {}...",
            self.state.last_known_ip, current_ip, self.record_name
        );

        match self
            .provider
            .update(&self.state.zone_id, &self.state.record_id, &current_ip)
            .await
        {
            Ok(()) => {
                info!("Successfully updated DNS record to {}", current_ip);
                let previous =
                    std::mem::replace(&mut self.state.last_known_ip, current_ip.clone());
                TickOutcome::Updated {
                    previous,
                    current: current_ip,
                }
            }
            Err(e) => {
                error!("Error updating DNS record {}: {}", self.record_name, e);
                TickOutcome::UpdateFailed {
                    attempted: current_ip,
                    error: e.to_string(),
                }
            }
        }
    }

    /// Tick forever
    pub async fn run(self) {
        self.run_until(std::future::pending()).await;
    }

    /// Tick every `interval` until `shutdown` completes, then hand the
    /// engine back
    ///
    /// The first tick fires one interval after the call. A tick that takes
    /// longer than the interval pushes the next one back instead of causing
    /// a burst. `shutdown` is observed between ticks and wins over a tick
    /// that is due at the same moment.
    pub async fn run_until<F>(mut self, shutdown: F) -> Self
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = IntervalStream::new(ticker);

        info!("Watching {} every {:?}", self.record_name, self.interval);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;

                _ = &mut shutdown => {
                    info!("Shutdown signal received");
                    break;
                }

                Some(_) = ticks.next() => {
                    let outcome = self.tick().await;
                    debug!("Tick finished: {:?}", outcome);
                }
            }
        }

        self
    }
}
