// # Cloudflare DNS Provider
//
// This crate provides the DNS record accessor for the DDNS updater, backed
// by Cloudflare API v4.
//
// - ✅ One HTTP request per trait call
// - ✅ Full error propagation to the engine (no retry, no backoff)
// - ✅ HTTP timeout configurable (30 seconds by default)
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 429, 5xx)
// - ✅ Dry-run mode for safe testing
// - ✅ Explicit policy for ambiguous record names
//
// ## Security Requirements
//
// - API token NEVER appears in logs
// - API token is provided via environment variables only
// - Provider fails fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?type=A&name=...`
// - Patch DNS Record: PATCH `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_core::config::{DdnsConfig, DuplicatePolicy};
use ddns_core::traits::{DnsProvider, DnsRecord};
use ddns_core::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

const PROVIDER: &str = "cloudflare";

/// Envelope wrapped around every Cloudflare v4 response
#[derive(Debug, Deserialize)]
struct ApiEnvelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct Zone {
    id: String,
}

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (zone lookup, record lookup)
/// - Log the intended PATCH payload
/// - **NOT** actually modify DNS records
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API root, overridable for tests
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// What lookup() does when several A-records share the name
    duplicate_policy: DuplicatePolicy,

    /// Dry-run mode: if true, perform GET requests but skip PATCH updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("duplicate_policy", &self.duplicate_policy)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:Read and DNS:Edit permissions
    /// - `timeout`: per-request timeout, `None` for none
    /// - `duplicate_policy`: behaviour when a record name is ambiguous
    /// - `dry_run`: If true, perform GET requests but skip writes
    ///
    /// # Errors
    ///
    /// `Error::Config` if the token is empty or the HTTP client cannot be built.
    pub fn new(
        api_token: impl Into<String>,
        timeout: Option<Duration>,
        duplicate_policy: DuplicatePolicy,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            base_url: CLOUDFLARE_API_BASE.to_string(),
            client,
            duplicate_policy,
            dry_run,
        })
    }

    /// Build a provider from the process configuration
    pub fn from_config(config: &DdnsConfig) -> Result<Self> {
        if config.mode.is_dry_run() {
            tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
        }

        Self::new(
            config.api_token.clone(),
            config.http_timeout,
            config.duplicate_policy,
            config.mode.is_dry_run(),
        )
    }

    /// Point the provider at another API root
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Turn a response into its envelope's `result`, mapping failures
    async fn read_result<T: DeserializeOwned>(
        response: reqwest::Response,
        context: &str,
    ) -> Result<Option<T>> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(status_error(status, context, &error_text));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to read response: {}", e)))?;
        let envelope: ApiEnvelope<T> = serde_json::from_str(&body)?;

        if !envelope.success {
            let errors: Vec<String> = envelope
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.code, e.message))
                .collect();
            return Err(Error::provider(
                PROVIDER,
                format!("{} rejected: {}", context, errors.join(", ")),
            ));
        }

        Ok(envelope.result)
    }
}

/// Map a non-2xx status to the matching error variant
fn status_error(status: reqwest::StatusCode, context: &str, error_text: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions. Status: {}",
            status
        )),
        404 => Error::not_found(format!("{}: {}", context, status)),
        429 => Error::rate_limited(format!("Please retry later. Status: {}", status)),
        500..=599 => Error::provider(
            PROVIDER,
            format!("Cloudflare server error (transient): {} - {}", status, error_text),
        ),
        _ => Error::provider(
            PROVIDER,
            format!("{} failed: {} - {}", context, status, error_text),
        ),
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    /// ```http
    /// GET /zones?name=example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn resolve_zone(&self, zone_name: &str) -> Result<String> {
        tracing::debug!("Looking up zone ID for: {}", zone_name);

        let response = self
            .client
            .get(format!("{}/zones", self.base_url))
            .bearer_auth(&self.api_token)
            .query(&[("name", zone_name)])
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        let zones: Vec<Zone> = Self::read_result(response, "Zone lookup")
            .await?
            .unwrap_or_default();

        let zone = zones
            .into_iter()
            .next()
            .ok_or_else(|| Error::not_found(format!("Zone not found: {}", zone_name)))?;

        tracing::debug!("Found zone ID: {}", zone.id);
        Ok(zone.id)
    }

    /// ```http
    /// GET /zones/:zone_id/dns_records?type=A&name=home.example.com
    /// Authorization: Bearer <token>
    /// ```
    async fn lookup(&self, zone_id: &str, record_name: &str) -> Result<DnsRecord> {
        tracing::debug!("Looking up A record: {}", record_name);

        let response = self
            .client
            .get(format!("{}/zones/{}/dns_records", self.base_url, zone_id))
            .bearer_auth(&self.api_token)
            .query(&[("type", "A"), ("name", record_name)])
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        let records: Vec<DnsRecord> = Self::read_result(response, "Record lookup")
            .await?
            .unwrap_or_default();

        let count = records.len();
        let Some(record) = records.into_iter().next() else {
            return Err(Error::not_found(format!(
                "no A record found for {}",
                record_name
            )));
        };

        if count > 1 {
            match self.duplicate_policy {
                DuplicatePolicy::First => tracing::warn!(
                    "{} A records match {}; using the first one (id {})",
                    count,
                    record_name,
                    record.id
                ),
                DuplicatePolicy::Error => {
                    return Err(Error::AmbiguousRecord {
                        name: record_name.to_string(),
                        count,
                    });
                }
            }
        }

        Ok(record)
    }

    /// ```http
    /// PATCH /zones/:zone_id/dns_records/:record_id
    /// { "content": "203.0.113.7" }
    /// ```
    async fn update(&self, zone_id: &str, record_id: &str, content: &str) -> Result<()> {
        let url = format!(
            "{}/zones/{}/dns_records/{}",
            self.base_url, zone_id, record_id
        );
        let payload = serde_json::json!({ "content": content });

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PATCH request to {} with payload: {}",
                url,
                payload
            );
            return Ok(());
        }

        let response = self
            .client
            .patch(&url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        Self::read_result::<serde_json::Value>(response, "Record update").await?;
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
