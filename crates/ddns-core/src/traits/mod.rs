//! Seams between the engine and its two external collaborators
//!
//! - [`IpSource`]: discover the caller's public address
//! - [`DnsProvider`]: read and write the tracked A-record

pub mod ip_source;
pub mod dns_provider;

pub use ip_source::IpSource;
pub use dns_provider::{DnsProvider, DnsRecord};
