use crate::config::types::{
    current_year, Config, CrawlConfig, OutputConfig, SiteConfig, UserAgentConfig,
    FIRST_REPORT_YEAR,
};
use crate::ConfigError;
use std::time::Duration;
use url::Url;

/// Validates the entire configuration and normalizes the output path
pub fn validate(config: &mut Config) -> Result<(), ConfigError> {
    validate_crawl_config(&config.crawl, current_year())?;
    validate_site_config(&config.site)?;
    validate_user_agent_config(&config.user_agent)?;
    normalize_output_config(&mut config.output)?;
    Ok(())
}

/// Validates crawl configuration against the given current year
fn validate_crawl_config(config: &CrawlConfig, this_year: i32) -> Result<(), ConfigError> {
    validate_year(config.year, this_year)?;

    if !config.delay_seconds.is_finite() || config.delay_seconds < 0.0 {
        return Err(ConfigError::Validation(format!(
            "delay_seconds must be a non-negative number, got {}",
            config.delay_seconds
        )));
    }

    if Duration::try_from_secs_f64(config.delay_seconds).is_err() {
        return Err(ConfigError::Validation(format!(
            "delay_seconds {} is too large",
            config.delay_seconds
        )));
    }

    if config.timeout_seconds == 0 {
        return Err(ConfigError::Validation(
            "timeout_seconds must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Checks that a report year lies in `[2013, this_year]`
pub fn validate_year(year: i32, this_year: i32) -> Result<(), ConfigError> {
    if year < FIRST_REPORT_YEAR || year > this_year {
        return Err(ConfigError::YearOutOfRange {
            year,
            min: FIRST_REPORT_YEAR,
            max: this_year,
        });
    }
    Ok(())
}

/// Validates the site base URL
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base_url '{}' must use http or https",
            config.base_url
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters, hyphens and underscores, got '{}'",
            config.crawler_name
        )));
    }

    if config.crawler_version.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_version cannot be empty".to_string(),
        ));
    }

    if !config.contact_url.is_empty() {
        Url::parse(&config.contact_url)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;
    }

    Ok(())
}

/// Rejects an empty output path and enforces the `.csv` suffix
fn normalize_output_config(config: &mut OutputConfig) -> Result<(), ConfigError> {
    if config.path.trim().is_empty() {
        return Err(ConfigError::Validation(
            "output path cannot be empty".to_string(),
        ));
    }

    config.path = with_csv_suffix(&config.path);
    Ok(())
}

/// Appends `.csv` unless the path already ends with it (case-insensitive)
pub fn with_csv_suffix(path: &str) -> String {
    if path.to_ascii_lowercase().ends_with(".csv") {
        path.to_string()
    } else {
        format!("{}.csv", path)
    }
}
