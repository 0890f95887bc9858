//! Configuration for the DDNS updater
//!
//! Everything is read once from the process environment at startup. Required
//! values are the provider token, the zone name and the record name; the rest
//! fall back to defaults.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::{Error, Result};

/// Cloudflare API token (required)
pub const ENV_API_TOKEN: &str = "CF_API_TOKEN";
/// Zone name, e.g. `example.com` (required)
pub const ENV_ZONE_NAME: &str = "CF_ZONE_NAME";
/// A-record name, e.g. `home.example.com` (required)
pub const ENV_RECORD_NAME: &str = "CF_RECORD_NAME";
/// Poll period in minutes
pub const ENV_UPDATE_INTERVAL: &str = "UPDATE_INTERVAL";
/// IP-echo endpoint
pub const ENV_IP_ECHO_URL: &str = "DDNS_IP_ECHO_URL";
/// Per-request timeout in seconds, `0` disables it
pub const ENV_HTTP_TIMEOUT_SECS: &str = "DDNS_HTTP_TIMEOUT_SECS";
/// `first` or `error`
pub const ENV_DUPLICATE_RECORDS: &str = "DDNS_DUPLICATE_RECORDS";
/// `live` or `dry-run`
pub const ENV_MODE: &str = "DDNS_MODE";

/// Poll period used when `UPDATE_INTERVAL` is absent or unusable
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Longest accepted polling interval; anything above falls back to the default
pub const MAX_UPDATE_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// IP-echo service returning the caller's address as plain text
pub const DEFAULT_IP_ECHO_URL: &str = "https://api.ipify.org?format=text";

/// Default timeout applied to every outbound request
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// What to do when more than one A-record carries the configured name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// Use the first record in the order the provider returned them
    #[default]
    First,
    /// Refuse to start
    Error,
}

impl FromStr for DuplicatePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "first" => Ok(Self::First),
            "error" => Ok(Self::Error),
            other => Err(Error::config(format!(
                "{ENV_DUPLICATE_RECORDS} '{other}' is not valid. Valid values: first, error"
            ))),
        }
    }
}

/// Whether record writes are actually sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunMode {
    /// Send updates
    #[default]
    Live,
    /// Look everything up, log the update that would have been sent
    DryRun,
}

impl RunMode {
    pub fn is_dry_run(self) -> bool {
        self == Self::DryRun
    }
}

impl FromStr for RunMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "dry-run" | "dry_run" | "dryrun" => Ok(Self::DryRun),
            other => Err(Error::config(format!(
                "{ENV_MODE} '{other}' is not valid. Valid values: live, dry-run"
            ))),
        }
    }
}

/// Complete process configuration
#[derive(Clone)]
pub struct DdnsConfig {
    /// Provider API token
    /// ⚠️ NEVER log this value
    pub api_token: String,

    /// Zone to resolve at startup
    pub zone_name: String,

    /// A-record kept in sync with the public IP
    pub record_name: String,

    /// Delay between evaluations
    pub update_interval: Duration,

    /// IP-echo endpoint
    pub ip_echo_url: String,

    /// Timeout for each outbound request; `None` leaves requests unbounded
    pub http_timeout: Option<Duration>,

    /// Behaviour when the record name is ambiguous
    pub duplicate_policy: DuplicatePolicy,

    /// Live or dry-run
    pub mode: RunMode,
}

// Custom Debug implementation that hides the API token
impl fmt::Debug for DdnsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DdnsConfig")
            .field("api_token", &"<REDACTED>")
            .field("zone_name", &self.zone_name)
            .field("record_name", &self.record_name)
            .field("update_interval", &self.update_interval)
            .field("ip_echo_url", &self.ip_echo_url)
            .field("http_timeout", &self.http_timeout)
            .field("duplicate_policy", &self.duplicate_policy)
            .field("mode", &self.mode)
            .finish()
    }
}

impl DdnsConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    ///
    /// Empty values are treated as absent. Every missing required variable
    /// is reported in a single [`Error::MissingConfig`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_token = get(ENV_API_TOKEN);
        let zone_name = get(ENV_ZONE_NAME);
        let record_name = get(ENV_RECORD_NAME);

        let (Some(api_token), Some(zone_name), Some(record_name)) =
            (api_token.clone(), zone_name.clone(), record_name.clone())
        else {
            let missing = [
                (ENV_API_TOKEN, api_token.is_none()),
                (ENV_ZONE_NAME, zone_name.is_none()),
                (ENV_RECORD_NAME, record_name.is_none()),
            ]
            .into_iter()
            .filter(|(_, absent)| *absent)
            .map(|(key, _)| key.to_string())
            .collect();
            return Err(Error::MissingConfig(missing));
        };

        let ip_echo_url = get(ENV_IP_ECHO_URL).unwrap_or_else(|| DEFAULT_IP_ECHO_URL.to_string());
        if !ip_echo_url.starts_with("https://") && !ip_echo_url.starts_with("http://") {
            return Err(Error::config(format!(
                "{ENV_IP_ECHO_URL} must use HTTP or HTTPS scheme. Got: {ip_echo_url}"
            )));
        }

        let duplicate_policy = get(ENV_DUPLICATE_RECORDS)
            .map(|v| v.parse::<DuplicatePolicy>())
            .transpose()?
            .unwrap_or_default();
        let mode = get(ENV_MODE)
            .map(|v| v.parse::<RunMode>())
            .transpose()?
            .unwrap_or_default();

        Ok(Self {
            api_token: api_token.trim().to_string(),
            zone_name: zone_name.trim().to_string(),
            record_name: record_name.trim().to_string(),
            update_interval: parse_interval(get(ENV_UPDATE_INTERVAL).as_deref()),
            ip_echo_url,
            http_timeout: parse_timeout(get(ENV_HTTP_TIMEOUT_SECS).as_deref()),
            duplicate_policy,
            mode,
        })
    }
}

/// Interpret `UPDATE_INTERVAL` as a number of minutes
///
/// Fractions are allowed. Absent values give the default silently; values
/// that are not a positive finite number, or exceed [`MAX_UPDATE_INTERVAL`],
/// give the default with a warning.
pub fn parse_interval(raw: Option<&str>) -> Duration {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_UPDATE_INTERVAL;
    };

    let interval = raw
        .parse::<f64>()
        .ok()
        .filter(|minutes| minutes.is_finite() && *minutes > 0.0)
        .and_then(|minutes| Duration::try_from_secs_f64(minutes * 60.0).ok())
        .filter(|d| !d.is_zero() && *d <= MAX_UPDATE_INTERVAL);

    match interval {
        Some(interval) => interval,
        None => {
            warn!("Invalid {ENV_UPDATE_INTERVAL} '{raw}', using default 5 minutes");
            DEFAULT_UPDATE_INTERVAL
        }
    }
}

/// Interpret `DDNS_HTTP_TIMEOUT_SECS`; `0` means no timeout
pub fn parse_timeout(raw: Option<&str>) -> Option<Duration> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Some(DEFAULT_HTTP_TIMEOUT);
    };

    match raw.parse::<u64>() {
        Ok(0) => None,
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            warn!(
                "Invalid {ENV_HTTP_TIMEOUT_SECS} '{raw}', using default {}s",
                DEFAULT_HTTP_TIMEOUT.as_secs()
            );
            Some(DEFAULT_HTTP_TIMEOUT)
        }
    }
}
