use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;

    let config: Config = toml::from_str(&content)?;

    validate(&config)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
seeds = ["https://example.com/"]

[crawler]
num-workers = 4
max-per-host = 2
min-interval-per-host-ms = 250
max-pages = 100

[fetch]
request-timeout-s = 5
max-redirects = 3
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.num_workers, 4);
        assert_eq!(config.crawler.max_per_host, 2);
        assert_eq!(config.crawler.min_interval_per_host_ms, 250);
        assert_eq!(config.fetch.request_timeout_s, 5);
        assert_eq!(config.seeds.len(), 1);
    }

    #[test]
    fn test_defaults_fill_missing_sections() {
        let file = create_temp_config(r#"seeds = ["https://example.com/"]"#);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawler.num_workers, 20);
        assert_eq!(config.crawler.max_per_host, 10);
        assert_eq!(config.crawler.max_pages, 30_000);
        assert_eq!(config.fetch.max_body_bytes, 5 * 1024 * 1024);
        assert!(!config.dedup.use_bloom);
        assert!(config.dns.use_dns_cache);
        assert_eq!(config.dns.dns_negative_ttl_s, 30);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
seeds = ["https://example.com/"]

[crawler]
num-workers = 0
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }
}
