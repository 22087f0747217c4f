use serde::Deserialize;

/// Earliest year the archive publishes mass-shooting reports for
pub const FIRST_REPORT_YEAR: i32 = 2013;

/// Main configuration structure for the crawler
///
/// Every section and key is optional in the TOML file; missing values fall
/// back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawl: CrawlConfig,
    pub site: SiteConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Report year to crawl
    pub year: i32,

    /// Minimum time between any two outbound requests (seconds)
    #[serde(rename = "delay-seconds")]
    pub delay_seconds: f64,

    /// Retries after the initial attempt for a non-success response
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Consult robots.txt before crawling
    #[serde(rename = "respect-robots")]
    pub respect_robots: bool,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-seconds")]
    pub timeout_seconds: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            year: current_year(),
            delay_seconds: 10.0,
            max_retries: 3,
            respect_robots: true,
            timeout_seconds: 30,
        }
    }
}

/// Source site configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Site root that report paths and incident links are resolved against
    #[serde(rename = "base-url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.gunviolencearchive.org".to_string(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler (optional)
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: String::new(),
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        if self.contact_url.is_empty() {
            format!("{}/{}", self.crawler_name, self.crawler_version)
        } else {
            format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, self.contact_url
            )
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the CSV file
    pub path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: "output.csv".to_string(),
        }
    }
}

/// The current calendar year in UTC
pub fn current_year() -> i32 {
    use chrono::Datelike;
    chrono::Utc::now().year()
}
