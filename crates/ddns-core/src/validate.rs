//! Sanity gate for resolver output

use std::net::IpAddr;

/// True iff `address` is a standard-form IPv4 or IPv6 literal
///
/// No trimming, no name resolution and no range checks.
pub fn is_valid_ip(address: &str) -> bool {
    address.parse::<IpAddr>().is_ok()
}
