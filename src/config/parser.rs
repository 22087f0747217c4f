use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// The returned configuration is NOT validated yet: command-line overrides
/// are applied on top of it first, then [`finalize_config`] runs validation.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded configuration
/// * `Err(ConfigError)` - Failed to read or parse the file
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses TOML configuration content
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    Ok(config)
}

/// Validates a configuration and enforces the `.csv` output suffix
///
/// # Example
///
/// ```no_run
/// use shootings_crawler::config::{finalize_config, Config};
///
/// let mut config = Config::default();
/// config.crawl.year = 2017;
/// config.output.path = "mass_shootings_2017".to_string();
///
/// let config = finalize_config(config).unwrap();
/// assert_eq!(config.output.path, "mass_shootings_2017.csv");
/// ```
pub fn finalize_config(mut config: Config) -> Result<Config, ConfigError> {
    validate(&mut config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so that an output file can be traced back to the
/// configuration that produced it.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
