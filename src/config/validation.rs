use crate::config::types::{Config, CrawlerConfig, DedupConfig, FetchConfig, SimulationConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_dedup_config(&config.dedup)?;
    validate_simulation_config(&config.simulation)?;
    validate_seeds(&config.seeds)?;
    Ok(())
}

fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.num_workers < 1 {
        return Err(ConfigError::Validation(format!(
            "num-workers must be >= 1, got {}",
            config.num_workers
        )));
    }

    if config.max_per_host < 1 {
        return Err(ConfigError::Validation(format!(
            "max-per-host must be >= 1, got {}",
            config.max_per_host
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max-pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.max_url_length < 16 {
        return Err(ConfigError::Validation(format!(
            "max-url-length must be >= 16, got {}",
            config.max_url_length
        )));
    }

    Ok(())
}

fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.request_timeout_s < 1 {
        return Err(ConfigError::Validation(format!(
            "request-timeout-s must be >= 1, got {}",
            config.request_timeout_s
        )));
    }

    if config.max_body_bytes < 1024 {
        return Err(ConfigError::Validation(format!(
            "max-body-bytes must be >= 1024, got {}",
            config.max_body_bytes
        )));
    }

    if config.user_agent.is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_dedup_config(config: &DedupConfig) -> Result<(), ConfigError> {
    if !(config.bloom_fpr > 0.0 && config.bloom_fpr < 1.0) {
        return Err(ConfigError::Validation(format!(
            "bloom-fpr must be in (0, 1), got {}",
            config.bloom_fpr
        )));
    }

    Ok(())
}

fn validate_simulation_config(config: &SimulationConfig) -> Result<(), ConfigError> {
    if config.links_min > config.links_max {
        return Err(ConfigError::Validation(format!(
            "simulation links-min ({}) must be <= links-max ({})",
            config.links_min, config.links_max
        )));
    }

    Ok(())
}

/// Checks that every seed parses as an absolute http(s) URL
fn validate_seeds(seeds: &[String]) -> Result<(), ConfigError> {
    for seed in seeds {
        let url = Url::parse(seed).map_err(|e| ConfigError::InvalidSeed {
            url: seed.clone(),
            reason: e.to_string(),
        })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidSeed {
                url: seed.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
    }

    Ok(())
}
