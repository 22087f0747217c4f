//! Shootings crawler: a polite incident-report harvester
//!
//! This crate walks the paginated mass-shooting reports of a public incident
//! archive, extracts one structured record per incident from the listing and
//! detail pages, and streams the records to CSV. Every record carries a
//! SHA-256 identity hash derived from its core fields, which makes runs
//! comparable and lets duplicates be dropped.

pub mod config;
pub mod crawler;
pub mod incident;
pub mod output;
pub mod robots;

use thiserror::Error;

/// Main error type for crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Fetch failed for {url}: HTTP {status} after {attempts} attempts")]
    FetchFailed {
        url: String,
        status: u16,
        attempts: u32,
    },

    #[error("Extraction failed for {url}: {source}")]
    Extract { url: String, source: ExtractError },

    #[error("URL disallowed by robots.txt: {url}")]
    RobotsDenied { url: String },

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("Output error: {0}")]
    Output(#[from] OutputError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CrawlError {
    /// Attaches the page URL to an extraction failure
    pub fn extract(url: impl Into<String>, source: ExtractError) -> Self {
        CrawlError::Extract {
            url: url.into(),
            source,
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Year {year} is outside the reported range {min}..={max}")]
    YearOutOfRange { year: i32, min: i32, max: i32 },
}

/// Structural errors raised while reading listing and detail pages
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Missing element: {0}")]
    MissingElement(String),

    #[error("Row {row}: missing column '{column}'")]
    MissingColumn { row: usize, column: &'static str },

    #[error("Row {row}: unparsable date '{text}'")]
    InvalidDate { row: usize, text: String },

    #[error("Row {row}: column '{column}' is not a count: '{value}'")]
    InvalidNumber {
        row: usize,
        column: &'static str,
        value: String,
    },

    #[error("Row {row}: no incident link")]
    MissingLink { row: usize },

    #[error("Missing page parameter in '{0}'")]
    MissingPageParameter(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector: {0}")]
    Selector(String),
}

/// Result type alias for crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for extraction operations
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Coordinator, Fetcher, RateLimiter};
pub use incident::{FieldMap, Incident, IncidentCore, IncidentDetails};
pub use output::{CsvSink, IncidentSink, OutputError};
