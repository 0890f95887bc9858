// # ddnsd - DDNS Daemon
//
// Keeps one Cloudflare A-record pointed at this host's public IPv4 address.
//
// The ddnsd daemon is responsible for:
// 1. Installing logging
// 2. Reading configuration from environment variables
// 3. Building the IP source and the Cloudflare provider
// 4. Starting the DDNS engine and running it until SIGINT/SIGTERM
//
// ## Configuration
//
// ### Required
// - `CF_API_TOKEN`: Cloudflare API token
// - `CF_ZONE_NAME`: Zone name (e.g. example.com)
// - `CF_RECORD_NAME`: A-record to keep updated (e.g. home.example.com)
//
// ### Optional
// - `UPDATE_INTERVAL`: Poll period in minutes (default 5)
// - `DDNS_IP_ECHO_URL`: IP-echo endpoint (default https://api.ipify.org?format=text)
// - `DDNS_HTTP_TIMEOUT_SECS`: Request timeout, 0 for none (default 30)
// - `DDNS_DUPLICATE_RECORDS`: `first` or `error` (default first)
// - `DDNS_MODE`: `live` or `dry-run` (default live)
// - `DDNS_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export CF_API_TOKEN=your_token
// export CF_ZONE_NAME=example.com
// export CF_RECORD_NAME=home.example.com
// export UPDATE_INTERVAL=10
//
// ddnsd
// ```

use anyhow::{Context, Result};
use ddns_core::{DdnsConfig, DdnsEngine, EngineSettings};
use ddns_ip_http::HttpIpSource;
use ddns_provider_cloudflare::CloudflareProvider;
use std::env;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

const ENV_LOG_LEVEL: &str = "DDNS_LOG_LEVEL";

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Terminated by signal
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Terminated by SIGINT/SIGTERM
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Map `DDNS_LOG_LEVEL` to a tracing level; `None` means unrecognised
fn parse_log_level(raw: Option<&str>) -> Option<Level> {
    match raw.map(|s| s.trim().to_lowercase()).as_deref() {
        None | Some("") | Some("info") => Some(Level::INFO),
        Some("trace") => Some(Level::TRACE),
        Some("debug") => Some(Level::DEBUG),
        Some("warn") => Some(Level::WARN),
        Some("error") => Some(Level::ERROR),
        Some(_) => None,
    }
}

fn main() -> ExitCode {
    // Initialize tracing first so configuration warnings are visible
    let raw_level = env::var(ENV_LOG_LEVEL).ok();
    let log_level = parse_log_level(raw_level.as_deref());

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level.unwrap_or(Level::INFO))
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    if log_level.is_none() {
        warn!(
            "{} '{}' is not valid, using info. Valid levels: trace, debug, info, warn, error",
            ENV_LOG_LEVEL,
            raw_level.unwrap_or_default()
        );
    }

    info!("Starting ddnsd daemon");

    // Load configuration from environment
    let config = match DdnsConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    info!(
        "Managing record {} in zone {} every {:?}",
        config.record_name, config.zone_name, config.update_interval
    );

    // One logical thread of control: a current-thread runtime is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(config)).into()
}

/// Run the daemon
async fn run_daemon(config: DdnsConfig) -> DdnsExitCode {
    let engine = match start_engine(&config).await {
        Ok(engine) => engine,
        Err(e) => {
            error!("Startup failed: {:#}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    engine.run_until(wait_for_shutdown()).await;
    info!("Shutting down daemon");

    DdnsExitCode::CleanShutdown
}

/// Build the collaborators and perform the startup lookups
async fn start_engine(config: &DdnsConfig) -> Result<DdnsEngine> {
    let ip_source = HttpIpSource::new(config.ip_echo_url.clone(), config.http_timeout)
        .context("Failed to create IP source")?;
    info!("Using IP-echo service {}", ip_source.url());

    let provider = CloudflareProvider::from_config(config)
        .context("Failed to create Cloudflare API client")?;

    DdnsEngine::start(
        Box::new(ip_source),
        Box::new(provider),
        EngineSettings::from(config),
    )
    .await
    .with_context(|| {
        format!(
            "Failed to resolve DNS record {} in zone {}",
            config.record_name, config.zone_name
        )
    })
}

/// Wait for SIGTERM or SIGINT
///
/// If the handlers cannot be installed the daemon keeps running and can
/// only be stopped by SIGKILL.
#[cfg(unix)]
async fn wait_for_shutdown() {
    let (mut sigterm, mut sigint) =
        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(term), Ok(int)) => (term, int),
            (Err(e), _) | (_, Err(e)) => {
                error!("Failed to set up signal handlers: {}", e);
                return std::future::pending().await;
            }
        };

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    info!("Received shutdown signal: {}", name);
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal: SIGINT"),
        Err(e) => {
            error!("Failed to wait for CTRL-C: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
