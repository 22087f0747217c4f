//! Robots.txt handling module
//!
//! The crawler reads the site's robots.txt once before the first listing
//! request, refuses to crawl a disallowed report path, and honors a
//! `Crawl-delay` longer than its own configured delay.

mod parser;

pub use parser::ParsedRobots;

use crate::crawler::Fetcher;
use url::Url;

/// Fetches and parses `<base>/robots.txt`
///
/// A missing (non-2xx) or unreachable robots.txt is logged and treated as
/// allowing everything; the crawl goes on.
pub async fn fetch_robots(fetcher: &Fetcher, base_url: &Url) -> ParsedRobots {
    let robots_url = match base_url.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Cannot build robots.txt URL from {}: {}", base_url, e);
            return ParsedRobots::allow_all();
        }
    };

    match fetcher.fetch_once(robots_url.as_str()).await {
        Ok(page) if (200..300).contains(&page.status) => ParsedRobots::from_content(&page.body),
        Ok(page) => {
            tracing::info!("No robots.txt at {} (HTTP {})", robots_url, page.status);
            ParsedRobots::allow_all()
        }
        Err(e) => {
            tracing::warn!("Error checking robots.txt file {}: {}", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}

/// Checks if a URL is allowed by robots.txt
pub fn is_allowed(robots: &ParsedRobots, url: &str, user_agent: &str) -> bool {
    robots.is_allowed(url, user_agent)
}
