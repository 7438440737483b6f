//! Crawler module
//!
//! The fetch/parse/enqueue pipeline and its coordination: the `Fetcher`
//! seam (HTTP and simulated implementations), HTML link extraction, the
//! worker loop, and the coordinator that runs the crawl lifecycle.

mod coordinator;
mod fetcher;
mod parser;
mod simulated;
mod worker;

pub use coordinator::{Coordinator, CrawlSummary};
pub use fetcher::{FetchError, FetchErrorKind, FetchedPage, Fetcher, HttpFetcher};
pub use parser::extract_links;
pub use simulated::SimulatedFetcher;
