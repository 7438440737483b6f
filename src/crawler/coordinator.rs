//! Crawl coordination
//!
//! The coordinator owns the crawl lifecycle: it normalizes and enqueues the
//! seeds, spawns the worker pool, and runs the shutdown protocol. Shutdown
//! starts when the frontier closes, whichever trigger got there first: the
//! page budget (a worker closes it), an external cancellation (the listener
//! closes it), or natural exhaustion (the frontier closes itself). Workers
//! then get a grace period to finish in-flight fetches; at expiry the
//! cancellation token fires, and anything still running is abandoned.

use crate::config::Config;
use crate::crawler::fetcher::{Fetcher, FetchErrorKind, HttpFetcher};
use crate::crawler::simulated::SimulatedFetcher;
use crate::crawler::worker::{run_worker, WorkerContext};
use crate::dedup::VisitedSet;
use crate::dns::{DnsCache, SystemDnsBackend};
use crate::frontier::Frontier;
use crate::metrics::{CrawlCounters, MetricsSink, TracingSink};
use crate::url::normalize_seed;
use crate::{CrawlError, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

/// How long abandoned workers get after cancellation before being aborted
const CANCEL_DRAIN: Duration = Duration::from_secs(5);

/// Final accounting for a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    pub pages_fetched: u64,
    pub fetch_errors: u64,
    pub dns_errors: u64,
    pub net_errors: u64,
    pub http_errors: u64,
    pub cancelled_fetches: u64,
    pub rejected_links: u64,
    pub urls_discovered: usize,
    pub hosts_seen: usize,
    pub queued_remaining: usize,
    pub elapsed: Duration,
}

impl CrawlSummary {
    pub fn pages_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.pages_fetched as f64 / secs
        } else {
            0.0
        }
    }
}

/// Crawl lifecycle owner
pub struct Coordinator {
    config: Config,
    fetcher: Arc<dyn Fetcher>,
    sink: Arc<dyn MetricsSink>,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Builds a coordinator with the fetcher the configuration asks for
    pub fn new(config: Config) -> Result<Self> {
        let fetcher: Arc<dyn Fetcher> = if config.simulation.enabled {
            Arc::new(SimulatedFetcher::new(&config.simulation))
        } else {
            let dns = Arc::new(DnsCache::new(
                Arc::new(SystemDnsBackend::new()),
                config.dns.use_dns_cache,
                config.dns.negative_ttl(),
            ));
            Arc::new(HttpFetcher::new(
                &config.fetch,
                config.crawler.max_per_host,
                dns,
            )?)
        };

        Ok(Self::with_parts(config, fetcher, Arc::new(TracingSink)))
    }

    /// Builds a coordinator around explicit collaborators
    pub fn with_parts(
        config: Config,
        fetcher: Arc<dyn Fetcher>,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            config,
            fetcher,
            sink,
            cancel: CancellationToken::new(),
        }
    }

    /// Token that triggers external shutdown when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the crawl to completion and returns the final summary
    pub async fn run(self) -> Result<CrawlSummary> {
        let started = Instant::now();

        if self.config.seeds.is_empty() {
            return Err(CrawlError::NoSeeds);
        }

        let visited = if self.config.dedup.use_bloom {
            VisitedSet::bloom(self.config.crawler.max_pages, self.config.dedup.bloom_fpr)
        } else {
            VisitedSet::exact()
        };
        let frontier = Frontier::new(
            visited,
            self.config.crawler.max_per_host,
            self.config.crawler.min_interval_per_host(),
        );

        // Seeds go in before any worker exists, so an empty frontier at
        // startup cannot be mistaken for exhaustion.
        let mut seeded = 0usize;
        for seed in &self.config.seeds {
            match normalize_seed(seed, self.config.crawler.max_url_length) {
                Ok(url) => {
                    if frontier.enqueue(url) {
                        seeded += 1;
                    }
                }
                Err(error) => {
                    tracing::warn!(%seed, %error, "skipping invalid seed");
                }
            }
        }
        if seeded == 0 {
            return Err(CrawlError::NoSeeds);
        }

        tracing::info!(
            seeds = seeded,
            workers = self.config.crawler.num_workers,
            max_pages = self.config.crawler.max_pages,
            max_per_host = self.config.crawler.max_per_host,
            "starting crawl"
        );

        let counters = Arc::new(CrawlCounters::new());
        let ctx = WorkerContext {
            frontier: frontier.clone(),
            fetcher: self.fetcher.clone(),
            counters: counters.clone(),
            sink: self.sink.clone(),
            cancel: self.cancel.clone(),
            max_pages: self.config.crawler.max_pages,
            max_url_length: self.config.crawler.max_url_length,
        };

        let mut workers: JoinSet<()> = JoinSet::new();
        for worker_id in 0..self.config.crawler.num_workers {
            workers.spawn(run_worker(ctx.clone(), worker_id));
        }

        // External interrupt: stop admitting work the moment the token fires
        let closer = {
            let frontier = frontier.clone();
            let cancel = self.cancel.clone();
            tokio::spawn(async move {
                cancel.cancelled().await;
                frontier.close();
            })
        };

        // Wait for a shutdown trigger. Every termination path closes the
        // frontier; joining all workers first can only mean they panicked
        // before any of them could.
        loop {
            tokio::select! {
                _ = frontier.wait_closed() => break,
                joined = workers.join_next() => {
                    match joined {
                        Some(Ok(())) => continue,
                        Some(Err(error)) => {
                            tracing::error!(%error, "worker task failed");
                            continue;
                        }
                        None => break,
                    }
                }
            }
        }

        // Bounded drain: let in-flight fetches finish, then cut them off
        if timeout(self.config.crawler.shutdown_grace(), drain(&mut workers))
            .await
            .is_err()
        {
            tracing::warn!("grace period expired, cancelling in-flight fetches");
            self.cancel.cancel();
            if timeout(CANCEL_DRAIN, drain(&mut workers)).await.is_err() {
                tracing::warn!("abandoning workers that did not stop");
                workers.abort_all();
                drain(&mut workers).await;
            }
        }
        closer.abort();

        let summary = CrawlSummary {
            pages_fetched: counters.fetched_ok(),
            fetch_errors: counters.fetch_errors(),
            dns_errors: counters.errors_for(FetchErrorKind::Dns),
            net_errors: counters.errors_for(FetchErrorKind::Net),
            http_errors: counters.errors_for(FetchErrorKind::Http),
            cancelled_fetches: counters.errors_for(FetchErrorKind::Cancelled),
            rejected_links: counters.rejected_links(),
            urls_discovered: frontier.visited_len(),
            hosts_seen: frontier.host_count(),
            queued_remaining: frontier.queued_len(),
            elapsed: started.elapsed(),
        };

        tracing::info!(
            pages = summary.pages_fetched,
            errors = summary.fetch_errors,
            hosts = summary.hosts_seen,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "crawl finished"
        );

        Ok(summary)
    }
}

async fn drain(workers: &mut JoinSet<()>) {
    while let Some(result) = workers.join_next().await {
        if let Err(error) = result {
            if error.is_panic() {
                tracing::error!(%error, "worker task panicked");
            }
        }
    }
}
