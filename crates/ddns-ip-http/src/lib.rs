// # HTTP IP Source
//
// This crate provides the public-IP resolver for the DDNS updater.
//
// ## Architecture
//
// One GET to an IP-echo service (e.g. api.ipify.org, icanhazip.com) per
// call. The body is expected to be the caller's address as plain text; the
// first whitespace-delimited token is returned as-is. Deciding whether that
// token is a real IP is left to the engine.

use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};

use std::time::Duration;

/// Public-IP resolver backed by an HTTP IP-echo service
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch IP from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: IP-echo endpoint (e.g., "https://api.ipify.org?format=text")
    /// - `timeout`: per-request timeout, `None` for none
    ///
    /// # Errors
    ///
    /// `Error::Config` if the HTTP client cannot be built.
    pub fn new(url: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// First whitespace-delimited token of an IP-echo response body
fn first_token(body: &str) -> Result<String> {
    body.split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or_else(|| Error::parse("IP-echo response body is empty"))
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn fetch(&self) -> Result<String> {
        tracing::debug!("Fetching public IP from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::network(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(Error::network(format!(
                "IP-echo service returned HTTP {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::network(format!("Failed to read response: {}", e)))?;

        first_token(&body)
    }
}
