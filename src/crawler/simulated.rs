//! Simulated fetcher for benchmarks and engine tests
//!
//! Stands in for real HTTP: sleeps a configured latency, then fabricates an
//! HTML page whose links are drawn from a synthetic pool of hosts and
//! paths. Sampling picks a host first and a path second, so the link graph
//! keeps host diversity instead of collapsing onto one domain.

use crate::config::SimulationConfig;
use crate::crawler::fetcher::{FetchError, FetchErrorKind, FetchedPage, Fetcher};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Synthetic pool dimensions; large enough that a budgeted crawl never
/// exhausts the graph
const POOL_HOSTS: usize = 200;
const POOL_PATHS_PER_HOST: usize = 5_000;

/// Fetcher that fabricates pages instead of fetching them
pub struct SimulatedFetcher {
    delay: Duration,
    links_min: usize,
    links_max: usize,
}

impl SimulatedFetcher {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            delay: Duration::from_millis(config.delay_ms),
            links_min: config.links_min,
            links_max: config.links_max,
        }
    }

    /// Fabricates the page body for a fetch
    fn synthesize_body(&self) -> String {
        let mut rng = rand::thread_rng();
        let count = rng.gen_range(self.links_min..=self.links_max);

        let mut body = String::from("<html><body>\n");
        for _ in 0..count {
            let host = rng.gen_range(0..POOL_HOSTS);
            let path = rng.gen_range(0..POOL_PATHS_PER_HOST);
            body.push_str(&format!(
                "<a href=\"https://host-{host}.sim.test/page-{path}\">link</a>\n"
            ));
        }
        body.push_str("</body></html>");
        body
    }
}

#[async_trait]
impl Fetcher for SimulatedFetcher {
    async fn fetch(
        &self,
        url: &Url,
        cancel: &CancellationToken,
    ) -> Result<FetchedPage, FetchError> {
        tokio::select! {
            _ = tokio::time::sleep(self.delay) => {}
            _ = cancel.cancelled() => {
                return Err(FetchError::new(
                    FetchErrorKind::Cancelled,
                    "shutdown in progress",
                ));
            }
        }

        Ok(FetchedPage {
            final_url: url.clone(),
            status: 200,
            content_type: "text/html".to_string(),
            body: self.synthesize_body(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::parser::extract_links;

    fn config(delay_ms: u64, links_min: usize, links_max: usize) -> SimulationConfig {
        SimulationConfig {
            enabled: true,
            delay_ms,
            links_min,
            links_max,
        }
    }

    #[tokio::test]
    async fn test_link_count_within_bounds() {
        let fetcher = SimulatedFetcher::new(&config(0, 5, 20));
        let url = Url::parse("https://host-0.sim.test/page-0").unwrap();

        let page = fetcher.fetch(&url, &CancellationToken::new()).await.unwrap();
        assert_eq!(page.status, 200);

        let links = extract_links(&page.body, &page.content_type);
        assert!((5..=20).contains(&links.len()), "got {} links", links.len());
    }

    #[tokio::test]
    async fn test_links_parse_as_urls() {
        let fetcher = SimulatedFetcher::new(&config(0, 10, 10));
        let url = Url::parse("https://host-0.sim.test/").unwrap();

        let page = fetcher.fetch(&url, &CancellationToken::new()).await.unwrap();
        for link in extract_links(&page.body, &page.content_type) {
            let parsed = Url::parse(&link).unwrap();
            assert_eq!(parsed.scheme(), "https");
        }
    }

    #[tokio::test]
    async fn test_delay_is_applied() {
        let fetcher = SimulatedFetcher::new(&config(50, 1, 1));
        let url = Url::parse("https://host-0.sim.test/").unwrap();

        let start = std::time::Instant::now();
        fetcher.fetch(&url, &CancellationToken::new()).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_delay() {
        let fetcher = SimulatedFetcher::new(&config(10_000, 1, 1));
        let url = Url::parse("https://host-0.sim.test/").unwrap();

        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = fetcher.fetch(&url, &cancel).await.unwrap_err();
        assert_eq!(err.kind, FetchErrorKind::Cancelled);
    }
}
