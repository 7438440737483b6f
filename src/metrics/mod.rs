//! Metrics module
//!
//! Two layers: `CrawlCounters` are the atomic tallies the engine itself
//! reads (budget enforcement, final summary), and `MetricsSink` is the
//! event interface an embedding process can point at its own exporter.
//! The core emits events; it does not dictate transport.

use crate::crawler::FetchErrorKind;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use url::Url;

/// Atomic crawl tallies
///
/// Increments use relaxed ordering: readers only need eventual counts, and
/// the budget check tolerates the bounded overshoot of in-flight fetches.
#[derive(Debug, Default)]
pub struct CrawlCounters {
    fetched_ok: AtomicU64,
    dns_errors: AtomicU64,
    net_errors: AtomicU64,
    http_errors: AtomicU64,
    cancelled_fetches: AtomicU64,
    rejected_links: AtomicU64,
}

impl CrawlCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fetch_ok(&self) {
        self.fetched_ok.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_fetch_error(&self, kind: FetchErrorKind) {
        let counter = match kind {
            FetchErrorKind::Dns => &self.dns_errors,
            FetchErrorKind::Net => &self.net_errors,
            FetchErrorKind::Http => &self.http_errors,
            FetchErrorKind::Cancelled => &self.cancelled_fetches,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected_link(&self) {
        self.rejected_links.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fetched_ok(&self) -> u64 {
        self.fetched_ok.load(Ordering::Relaxed)
    }

    pub fn errors_for(&self, kind: FetchErrorKind) -> u64 {
        let counter = match kind {
            FetchErrorKind::Dns => &self.dns_errors,
            FetchErrorKind::Net => &self.net_errors,
            FetchErrorKind::Http => &self.http_errors,
            FetchErrorKind::Cancelled => &self.cancelled_fetches,
        };
        counter.load(Ordering::Relaxed)
    }

    /// Total failed fetches across all kinds
    pub fn fetch_errors(&self) -> u64 {
        self.errors_for(FetchErrorKind::Dns)
            + self.errors_for(FetchErrorKind::Net)
            + self.errors_for(FetchErrorKind::Http)
            + self.errors_for(FetchErrorKind::Cancelled)
    }

    pub fn rejected_links(&self) -> u64 {
        self.rejected_links.load(Ordering::Relaxed)
    }
}

/// Receiver for crawl events
///
/// Methods must not block or suspend; they run inline in the worker loop.
pub trait MetricsSink: Send + Sync {
    fn page_fetched(&self, _url: &Url, _status: u16, _duration: Duration) {}

    fn fetch_error(&self, _url: &Url, _kind: FetchErrorKind) {}

    fn frontier_size(&self, _queued: usize) {}

    fn request_started(&self) {}

    fn request_finished(&self) {}
}

/// Sink that drops every event
pub struct NullSink;

impl MetricsSink for NullSink {}

/// Sink that emits structured tracing events
pub struct TracingSink;

impl MetricsSink for TracingSink {
    fn page_fetched(&self, url: &Url, status: u16, duration: Duration) {
        tracing::debug!(
            target: "driftnet::metrics",
            %url,
            status,
            duration_ms = duration.as_millis() as u64,
            "page_fetched"
        );
    }

    fn fetch_error(&self, url: &Url, kind: FetchErrorKind) {
        tracing::debug!(target: "driftnet::metrics", %url, %kind, "fetch_error");
    }

    fn frontier_size(&self, queued: usize) {
        tracing::trace!(target: "driftnet::metrics", queued, "frontier_size");
    }

    fn request_started(&self) {
        tracing::trace!(target: "driftnet::metrics", "request_started");
    }

    fn request_finished(&self) {
        tracing::trace!(target: "driftnet::metrics", "request_finished");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let counters = CrawlCounters::new();
        assert_eq!(counters.fetched_ok(), 0);
        assert_eq!(counters.fetch_errors(), 0);
        assert_eq!(counters.rejected_links(), 0);
    }

    #[test]
    fn test_fetch_ok_counted() {
        let counters = CrawlCounters::new();
        counters.record_fetch_ok();
        counters.record_fetch_ok();
        assert_eq!(counters.fetched_ok(), 2);
    }

    #[test]
    fn test_errors_counted_by_kind() {
        let counters = CrawlCounters::new();
        counters.record_fetch_error(FetchErrorKind::Dns);
        counters.record_fetch_error(FetchErrorKind::Net);
        counters.record_fetch_error(FetchErrorKind::Net);
        counters.record_fetch_error(FetchErrorKind::Http);

        assert_eq!(counters.errors_for(FetchErrorKind::Dns), 1);
        assert_eq!(counters.errors_for(FetchErrorKind::Net), 2);
        assert_eq!(counters.errors_for(FetchErrorKind::Http), 1);
        assert_eq!(counters.errors_for(FetchErrorKind::Cancelled), 0);
        assert_eq!(counters.fetch_errors(), 4);
    }
}
