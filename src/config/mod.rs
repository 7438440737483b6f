//! Configuration module for driftnet
//!
//! Handles loading, parsing, and validating TOML configuration files.
//! Every option has a default, so an empty file (or no file at all) yields
//! a usable configuration once seeds are supplied.

mod parser;
mod types;
mod validation;

pub use parser::load_config;
pub use types::{
    Config, CrawlerConfig, DedupConfig, DnsConfig, FetchConfig, SimulationConfig,
};
pub use validation::validate;
