// # IP Source Trait
//
// Defines the interface for discovering the host's current public address.
//
// ## Implementations
//
// - HTTP IP-echo service: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let candidate = source.fetch().await?;
//     println!("Public IP candidate: {}", candidate);
//
//     Ok(())
// }
// ```

use async_trait::async_trait;

/// Trait for public-IP resolvers
///
/// A resolver performs exactly one lookup per call. It does not retry, does
/// not cache and does not decide whether the result is a valid address:
/// the engine validates every candidate before acting on it.
///
/// # Errors
///
/// - [`Error::Network`](crate::Error::Network): the request could not complete
/// - [`Error::Parse`](crate::Error::Parse): the response held no usable token
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Fetch the current public address as the raw text the service returned
    async fn fetch(&self) -> Result<String, crate::Error>;
}
