//! Crawler module for incident report fetching and extraction
//!
//! This module contains the core crawling logic, including:
//! - Rate-limited HTTP fetching with bounded retry
//! - HTML parsing and text-pattern section lookup
//! - Listing page pagination and row extraction
//! - Detail page extraction
//! - Overall crawl coordination

mod coordinator;
mod detail;
mod document;
mod fetcher;
mod listing;
mod pagination;
mod rate_limit;

pub use coordinator::{run_crawl, Coordinator, CrawlPhase};
pub use detail::{
    extract_characteristics, extract_coordinates, extract_details, extract_district,
    extract_guns_involved, extract_notes, extract_participants,
};
pub use document::{resolve_link, Document, TextPattern};
pub use fetcher::{build_http_client, FetchedPage, Fetcher};
pub use listing::{extract_incidents, parse_date};
pub use pagination::{ListingTemplate, PageWalker};
pub use rate_limit::RateLimiter;
