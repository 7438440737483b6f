//! Worker loop
//!
//! Each worker repeats: check the budget, lease a URL from the frontier,
//! fetch it, extract and enqueue its links, release the lease. Fetch and
//! parse failures are counted and logged, never propagated; the lease
//! returns on every path because dropping it releases the slot.

use crate::crawler::fetcher::Fetcher;
use crate::crawler::parser::extract_links;
use crate::frontier::{Frontier, Outcome};
use crate::metrics::{CrawlCounters, MetricsSink};
use crate::url::normalize;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;

/// Everything one worker needs; clones share the same crawl
#[derive(Clone)]
pub(crate) struct WorkerContext {
    pub frontier: Frontier,
    pub fetcher: Arc<dyn Fetcher>,
    pub counters: Arc<CrawlCounters>,
    pub sink: Arc<dyn MetricsSink>,
    pub cancel: CancellationToken,
    pub max_pages: u64,
    pub max_url_length: usize,
}

impl WorkerContext {
    fn budget_reached(&self) -> bool {
        self.counters.fetched_ok() >= self.max_pages
    }
}

pub(crate) async fn run_worker(ctx: WorkerContext, worker_id: usize) {
    loop {
        if ctx.cancel.is_cancelled() {
            break;
        }

        if ctx.budget_reached() {
            tracing::debug!(worker_id, "page budget reached, closing frontier");
            ctx.frontier.close();
            break;
        }

        let Some((url, lease)) = ctx.frontier.next().await else {
            break;
        };

        // Re-check after the wait: the budget may have tripped while this
        // worker was parked, and it must not start another fetch past it.
        if ctx.budget_reached() {
            lease.release(Outcome::Cancelled);
            ctx.frontier.close();
            break;
        }

        let started = Instant::now();
        ctx.sink.request_started();
        let result = ctx.fetcher.fetch(&url, &ctx.cancel).await;
        ctx.sink.request_finished();

        match result {
            Ok(page) => {
                ctx.counters.record_fetch_ok();
                ctx.sink.page_fetched(&url, page.status, started.elapsed());

                let links = extract_links(&page.body, &page.content_type);
                let mut admitted = 0usize;
                for raw in &links {
                    match normalize(&page.final_url, raw, ctx.max_url_length) {
                        Ok(link) => {
                            if ctx.frontier.enqueue(link) {
                                admitted += 1;
                            }
                        }
                        Err(_) => ctx.counters.record_rejected_link(),
                    }
                }

                ctx.sink.frontier_size(ctx.frontier.queued_len());
                tracing::debug!(
                    worker_id,
                    url = %url,
                    status = page.status,
                    links = links.len(),
                    admitted,
                    "page fetched"
                );
                lease.release(Outcome::Success);
            }
            Err(error) => {
                ctx.counters.record_fetch_error(error.kind);
                ctx.sink.fetch_error(&url, error.kind);
                tracing::debug!(worker_id, url = %url, %error, "fetch failed");
                lease.release(Outcome::Error);
            }
        }
    }

    tracing::debug!(worker_id, "worker exiting");
}
