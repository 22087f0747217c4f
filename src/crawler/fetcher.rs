//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - Rate limiting every attempt through the shared [`RateLimiter`]
//! - Bounded retry of non-success responses and network errors

use crate::config::{Config, UserAgentConfig};
use crate::crawler::RateLimiter;
use crate::CrawlError;
use reqwest::Client;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects
    pub url: String,
    /// HTTP status code
    pub status: u16,
    /// Page body
    pub body: String,
}

/// Why a single attempt did not produce a page
enum AttemptFailure {
    Status(u16),
    Network(reqwest::Error),
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use shootings_crawler::config::UserAgentConfig;
/// use shootings_crawler::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     crawler_name: "shootings-crawler".to_string(),
///     crawler_version: "1.0.0".to_string(),
///     contact_url: "https://example.com/about".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Rate-limited GET with bounded retry
///
/// Every attempt, including retries, first acquires the shared rate limiter,
/// so consecutive requests are always separated by at least its interval.
pub struct Fetcher {
    client: Client,
    limiter: Arc<RateLimiter>,
    max_retries: u32,
    attempts: AtomicU64,
    retries: AtomicU64,
}

impl Fetcher {
    /// Creates a fetcher that retries up to `max_retries` times
    pub fn new(client: Client, limiter: Arc<RateLimiter>, max_retries: u32) -> Self {
        Self {
            client,
            limiter,
            max_retries,
            attempts: AtomicU64::new(0),
            retries: AtomicU64::new(0),
        }
    }

    /// Builds the client and rate limiter described by `config`
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawl.timeout_seconds),
        )?;
        let interval = Duration::try_from_secs_f64(config.crawl.delay_seconds).unwrap_or(Duration::MAX);
        let limiter = RateLimiter::new(interval);
        Ok(Self::new(client, Arc::new(limiter), config.crawl.max_retries))
    }

    /// The shared rate limiter
    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Total attempts issued so far, retries included
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    /// Retries issued so far
    pub fn retries(&self) -> u64 {
        self.retries.load(Ordering::Relaxed)
    }

    /// Fetches a URL, retrying on non-success status or network error
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 2xx | Return the page |
    /// | Any other status | Retry, up to `max_retries` times |
    /// | Network error / timeout | Retry, up to `max_retries` times |
    ///
    /// # Returns
    ///
    /// * `Ok(FetchedPage)` - A 2xx response and its body
    /// * `Err(CrawlError::FetchFailed)` - Still non-success after all retries
    /// * `Err(CrawlError::Http)` - Still failing at the network level after all retries
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, CrawlError> {
        let max_attempts = self.max_retries.saturating_add(1);
        let mut attempt = 0;

        loop {
            attempt += 1;

            let failure = match self.attempt(url).await {
                Ok(page) if (200..300).contains(&page.status) => return Ok(page),
                Ok(page) => AttemptFailure::Status(page.status),
                Err(e) => AttemptFailure::Network(e),
            };

            if attempt >= max_attempts {
                return Err(match failure {
                    AttemptFailure::Status(status) => CrawlError::FetchFailed {
                        url: url.to_string(),
                        status,
                        attempts: attempt,
                    },
                    AttemptFailure::Network(source) => CrawlError::Http {
                        url: url.to_string(),
                        source,
                    },
                });
            }

            match &failure {
                AttemptFailure::Status(status) => tracing::warn!(
                    "HTTP {} for {} (attempt {}/{}), retrying",
                    status,
                    url,
                    attempt,
                    max_attempts
                ),
                AttemptFailure::Network(e) => tracing::warn!(
                    "Request to {} failed (attempt {}/{}): {}, retrying",
                    url,
                    attempt,
                    max_attempts,
                    e
                ),
            }
            self.retries.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Performs a single rate-limited GET and returns the response whatever its status
    pub async fn fetch_once(&self, url: &str) -> Result<FetchedPage, reqwest::Error> {
        self.attempt(url).await
    }

    async fn attempt(&self, url: &str) -> Result<FetchedPage, reqwest::Error> {
        self.limiter.acquire().await;
        self.attempts.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("GET {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let body = response.text().await?;

        Ok(FetchedPage {
            url: final_url,
            status,
            body,
        })
    }
}
