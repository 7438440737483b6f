use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for driftnet
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub dns: DnsConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,

    /// Seed URLs to start crawling from
    #[serde(default)]
    pub seeds: Vec<String>,
}

/// Crawl engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Number of concurrent workers
    #[serde(rename = "num-workers", default = "default_num_workers")]
    pub num_workers: usize,

    /// Maximum concurrent fetches per host
    #[serde(rename = "max-per-host", default = "default_max_per_host")]
    pub max_per_host: usize,

    /// Minimum spacing between successive fetches to one host (milliseconds)
    #[serde(
        rename = "min-interval-per-host-ms",
        default = "default_min_interval_ms"
    )]
    pub min_interval_per_host_ms: u64,

    /// Page budget; the crawl shuts down once this many pages fetched
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u64,

    /// URLs longer than this are rejected by the normalizer
    #[serde(rename = "max-url-length", default = "default_max_url_length")]
    pub max_url_length: usize,

    /// Grace period for workers to drain on shutdown (seconds)
    #[serde(rename = "shutdown-grace-s", default = "default_shutdown_grace_s")]
    pub shutdown_grace_s: u64,
}

/// HTTP fetch configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-fetch total timeout (seconds)
    #[serde(rename = "request-timeout-s", default = "default_request_timeout_s")]
    pub request_timeout_s: u64,

    /// Redirect follow cap
    #[serde(rename = "max-redirects", default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Bodies larger than this are treated as fetch errors
    #[serde(rename = "max-body-bytes", default = "default_max_body_bytes")]
    pub max_body_bytes: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

/// URL deduplication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DedupConfig {
    /// Use the approximate Bloom-filter visited set instead of the exact one
    #[serde(rename = "use-bloom", default)]
    pub use_bloom: bool,

    /// Bloom filter false-positive rate
    #[serde(rename = "bloom-fpr", default = "default_bloom_fpr")]
    pub bloom_fpr: f64,
}

/// DNS resolution configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DnsConfig {
    /// Cache resolved addresses for the duration of the run
    #[serde(rename = "use-dns-cache", default = "default_true")]
    pub use_dns_cache: bool,

    /// How long failed resolutions are remembered (seconds)
    #[serde(rename = "dns-negative-ttl-s", default = "default_dns_negative_ttl_s")]
    pub dns_negative_ttl_s: u64,
}

/// Simulated-fetch mode configuration (no real HTTP traffic)
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationConfig {
    /// Replace the HTTP fetcher with the simulated one
    #[serde(default)]
    pub enabled: bool,

    /// Simulated request latency (milliseconds)
    #[serde(rename = "delay-ms", default = "default_sim_delay_ms")]
    pub delay_ms: u64,

    /// Minimum synthetic links per page
    #[serde(rename = "links-min", default = "default_sim_links_min")]
    pub links_min: usize,

    /// Maximum synthetic links per page
    #[serde(rename = "links-max", default = "default_sim_links_max")]
    pub links_max: usize,
}

impl CrawlerConfig {
    /// Minimum spacing between fetches to one host as a Duration
    pub fn min_interval_per_host(&self) -> Duration {
        Duration::from_millis(self.min_interval_per_host_ms)
    }

    /// Shutdown grace period as a Duration
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_s)
    }
}

impl FetchConfig {
    /// Per-fetch total timeout as a Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_s)
    }
}

impl DnsConfig {
    /// Negative-result TTL as a Duration
    pub fn negative_ttl(&self) -> Duration {
        Duration::from_secs(self.dns_negative_ttl_s)
    }
}

fn default_num_workers() -> usize {
    20
}

fn default_max_per_host() -> usize {
    10
}

fn default_min_interval_ms() -> u64 {
    500
}

fn default_max_pages() -> u64 {
    30_000
}

fn default_max_url_length() -> usize {
    2048
}

fn default_shutdown_grace_s() -> u64 {
    30
}

fn default_request_timeout_s() -> u64 {
    10
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_body_bytes() -> u64 {
    5 * 1024 * 1024
}

fn default_user_agent() -> String {
    format!("driftnet/{}", env!("CARGO_PKG_VERSION"))
}

fn default_bloom_fpr() -> f64 {
    0.01
}

fn default_true() -> bool {
    true
}

fn default_dns_negative_ttl_s() -> u64 {
    30
}

fn default_sim_delay_ms() -> u64 {
    50
}

fn default_sim_links_min() -> usize {
    5
}

fn default_sim_links_max() -> usize {
    20
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            num_workers: default_num_workers(),
            max_per_host: default_max_per_host(),
            min_interval_per_host_ms: default_min_interval_ms(),
            max_pages: default_max_pages(),
            max_url_length: default_max_url_length(),
            shutdown_grace_s: default_shutdown_grace_s(),
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_s: default_request_timeout_s(),
            max_redirects: default_max_redirects(),
            max_body_bytes: default_max_body_bytes(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            use_bloom: false,
            bloom_fpr: default_bloom_fpr(),
        }
    }
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            use_dns_cache: true,
            dns_negative_ttl_s: default_dns_negative_ttl_s(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_ms: default_sim_delay_ms(),
            links_min: default_sim_links_min(),
            links_max: default_sim_links_max(),
        }
    }
}
