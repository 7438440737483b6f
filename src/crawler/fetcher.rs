//! HTTP fetcher implementation
//!
//! One GET per URL against a shared connection pool. Redirects are followed
//! by the client up to the configured cap, bodies are streamed under a size
//! cap, and every host resolves through the crawl's DNS cache. Errors fall
//! into the four kinds the rest of the engine counts by: dns, net, http,
//! cancelled. Nothing here retries; a lost URL is acceptable at crawl scale.

use crate::config::FetchConfig;
use crate::dns::{DnsCache, SharedDns};
use crate::url::host_of;
use async_trait::async_trait;
use reqwest::{redirect::Policy, Client};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Result of a successful fetch
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after any redirects
    pub final_url: Url,

    /// HTTP status code
    pub status: u16,

    /// Content-Type header value, empty if absent
    pub content_type: String,

    /// Decoded page body
    pub body: String,
}

/// Failure taxonomy for fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchErrorKind {
    /// Host resolution failed (or a cached failure is still fresh)
    Dns,
    /// Connect, TLS, read, or timeout failure
    Net,
    /// Non-2xx status, redirect cap, or oversized body
    Http,
    /// Shutdown cancelled the fetch mid-flight
    Cancelled,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Dns => "dns",
            Self::Net => "net",
            Self::Http => "http",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// A failed fetch with its kind and a human-readable cause
#[derive(Debug, Clone, Error)]
#[error("fetch failed ({kind}): {message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn cancelled() -> Self {
        Self::new(FetchErrorKind::Cancelled, "shutdown in progress")
    }
}

/// One HTTP GET with timeout, yielding the body or a classified error
///
/// The worker pool only sees this trait; the simulated fetcher plugs in
/// behind it for benchmarks and tests.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url, cancel: &CancellationToken)
        -> Result<FetchedPage, FetchError>;
}

/// Production fetcher over a shared reqwest client
pub struct HttpFetcher {
    client: Client,
    dns: Arc<DnsCache>,
    max_body_bytes: u64,
}

impl HttpFetcher {
    /// Builds the shared client
    ///
    /// The connection pool resolves hosts through `dns`, so transport
    /// lookups hit the same cache the crawler warms. reqwest bounds idle
    /// pooled connections per host; active per-host connections are already
    /// bounded by frontier admission.
    pub fn new(
        config: &FetchConfig,
        max_per_host: usize,
        dns: Arc<DnsCache>,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout())
            .redirect(Policy::limited(config.max_redirects))
            .gzip(true)
            .brotli(true)
            .pool_max_idle_per_host(max_per_host)
            .dns_resolver(Arc::new(SharedDns(dns.clone())))
            .build()?;

        Ok(Self {
            client,
            dns,
            max_body_bytes: config.max_body_bytes,
        })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<FetchedPage, FetchError> {
        // Resolve up front: classifies DNS failures and warms the entry the
        // connection pool will read.
        let host = host_of(url);
        tokio::select! {
            resolved = self.dns.resolve(&host) => {
                resolved.map_err(|e| FetchError::new(FetchErrorKind::Dns, e.to_string()))?;
            }
            _ = cancel.cancelled() => return Err(FetchError::cancelled()),
        }

        let response = tokio::select! {
            sent = self.client.get(url.clone()).send() => sent.map_err(classify)?,
            _ = cancel.cancelled() => return Err(FetchError::cancelled()),
        };

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FetchErrorKind::Http,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if let Some(len) = response.content_length() {
            if len > self.max_body_bytes {
                return Err(FetchError::new(
                    FetchErrorKind::Http,
                    format!("body of {len} bytes exceeds cap"),
                ));
            }
        }

        // Stream the body so an unbounded response cannot blow the cap
        let mut response = response;
        let mut body: Vec<u8> = Vec::new();
        loop {
            let chunk = tokio::select! {
                chunk = response.chunk() => chunk.map_err(classify)?,
                _ = cancel.cancelled() => return Err(FetchError::cancelled()),
            };
            match chunk {
                Some(bytes) => {
                    if body.len() as u64 + bytes.len() as u64 > self.max_body_bytes {
                        return Err(FetchError::new(
                            FetchErrorKind::Http,
                            format!("body exceeds {} byte cap", self.max_body_bytes),
                        ));
                    }
                    body.extend_from_slice(&bytes);
                }
                None => break,
            }
        }

        Ok(FetchedPage {
            final_url,
            status: status.as_u16(),
            content_type,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }
}

/// Maps a reqwest error onto the fetch taxonomy
fn classify(error: reqwest::Error) -> FetchError {
    let kind = if error.is_redirect() {
        // Redirect cap exhausted or loop detected by the policy
        FetchErrorKind::Http
    } else {
        FetchErrorKind::Net
    };
    FetchError::new(kind, error.to_string())
}
