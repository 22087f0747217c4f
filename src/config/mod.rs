//! Configuration module
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every key has a default, so the crawler also runs without a file.
//!
//! # Example
//!
//! ```no_run
//! use shootings_crawler::config::{finalize_config, load_config};
//! use std::path::Path;
//!
//! let config = finalize_config(load_config(Path::new("crawler.toml")).unwrap()).unwrap();
//! println!("Crawling year {}", config.crawl.year);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    current_year, Config, CrawlConfig, OutputConfig, SiteConfig, UserAgentConfig,
    FIRST_REPORT_YEAR,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, finalize_config, load_config, load_config_with_hash, parse_config,
};
pub use validation::{validate_year, with_csv_suffix};
