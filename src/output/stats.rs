//! Run statistics

use std::fmt;

/// Counters for one crawl run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlStatistics {
    /// Zero-based index of the last listing page
    pub last_page: u32,
    pub listing_pages_fetched: u64,
    pub detail_pages_fetched: u64,
    /// HTTP attempts, retries and robots.txt included
    pub requests: u64,
    pub retries: u64,
    pub incidents_written: u64,
    /// Listing rows skipped because their identity hash was already written
    pub duplicates_skipped: u64,
}

impl fmt::Display for CrawlStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Listing pages:      {}", self.listing_pages_fetched)?;
        writeln!(f, "Detail pages:       {}", self.detail_pages_fetched)?;
        writeln!(f, "Incidents written:  {}", self.incidents_written)?;
        writeln!(f, "Duplicates skipped: {}", self.duplicates_skipped)?;
        writeln!(f, "HTTP requests:      {}", self.requests)?;
        write!(f, "Retries:            {}", self.retries)
    }
}

/// Prints statistics to stdout
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");
    println!("{}", stats);
}
