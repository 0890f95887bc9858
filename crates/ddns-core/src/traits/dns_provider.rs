// # DNS Provider Trait
//
// Defines the interface for reading and writing the tracked A-record.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::DnsProvider;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let zone_id = provider.resolve_zone("example.com").await?;
//     let record = provider.lookup(&zone_id, "home.example.com").await?;
//     provider.update(&zone_id, &record.id, "203.0.113.7").await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use serde::Deserialize;

/// A DNS record as the provider reports it
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned identifier, stable for the record's lifetime
    pub id: String,
    /// Fully qualified record name
    pub name: String,
    /// Record content (an IP address for A-records)
    pub content: String,
}

/// Trait for DNS provider implementations
///
/// Every method is a single-shot API call. Providers never retry, never
/// cache and never decide whether an update is needed; that is the
/// engine's job.
///
/// # Security
///
/// Implementations hold an API token and must keep it out of logs, error
/// messages and `Debug` output.
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// Resolve a human-readable zone name to the provider's zone ID
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` if no zone carries that name
    /// - any provider error on transport or authentication failure
    async fn resolve_zone(&self, zone_name: &str) -> Result<String, crate::Error>;

    /// Find the A-record called `record_name` inside the zone
    ///
    /// # Errors
    ///
    /// - `Error::NotFound` if no A-record matches
    /// - `Error::AmbiguousRecord` if several match and the provider is
    ///   configured to refuse
    /// - any provider error on transport or authentication failure
    async fn lookup(&self, zone_id: &str, record_name: &str) -> Result<DnsRecord, crate::Error>;

    /// Set the content of record `record_id` to `content`
    ///
    /// The write is not verified by reading the record back.
    async fn update(&self, zone_id: &str, record_id: &str, content: &str)
        -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
