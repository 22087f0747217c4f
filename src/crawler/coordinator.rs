//! Crawler coordinator - main crawl orchestration logic
//!
//! One run walks a single report year:
//!
//! ```text
//! INIT -> FETCH_FIRST_PAGE -> DETERMINE_PAGE_COUNT
//!      -> (EXTRACT_LISTING -> for each row: FETCH_DETAIL -> EXTRACT_DETAIL -> SINK)*
//!      -> NEXT_PAGE ... -> DONE
//! ```
//!
//! Any fatal error moves the run to FAILED. Records already handed to the
//! sink stay there. The coordinator never retries; that is the fetcher's job.

use crate::config::Config;
use crate::crawler::detail::extract_details;
use crate::crawler::document::Document;
use crate::crawler::listing::extract_incidents;
use crate::crawler::pagination::PageWalker;
use crate::crawler::Fetcher;
use crate::incident::Incident;
use crate::output::{CrawlStatistics, IncidentSink};
use crate::robots::{fetch_robots, is_allowed};
use crate::CrawlError;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Init,
    CheckRobots,
    FetchFirstPage,
    DeterminePageCount,
    ExtractListing { page: u32 },
    FetchDetail { page: u32 },
    ExtractDetail { page: u32 },
    Sink { page: u32 },
    NextPage { page: u32 },
    Done,
    Failed,
}

/// Main crawler coordinator structure
pub struct Coordinator<S: IncidentSink> {
    fetcher: Fetcher,
    walker: PageWalker,
    base_url: Url,
    sink: S,
    user_agent_token: String,
    respect_robots: bool,
    phase: CrawlPhase,
    seen: HashSet<String>,
    stats: CrawlStatistics,
}

impl<S: IncidentSink> Coordinator<S> {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - A validated crawler configuration
    /// * `sink` - Where finished incidents are written
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlError)` - Bad base URL or HTTP client setup failure
    pub fn new(config: &Config, sink: S) -> Result<Self, CrawlError> {
        let base_url = Url::parse(&config.site.base_url)?;
        let fetcher = Fetcher::from_config(config)?;
        Ok(Self::with_fetcher(config, fetcher, base_url, sink))
    }

    /// Creates a coordinator around an existing fetcher
    pub fn with_fetcher(config: &Config, fetcher: Fetcher, base_url: Url, sink: S) -> Self {
        Self {
            fetcher,
            walker: PageWalker::new(base_url.clone(), config.crawl.year),
            base_url,
            sink,
            user_agent_token: config.user_agent.crawler_name.clone(),
            respect_robots: config.crawl.respect_robots,
            phase: CrawlPhase::Init,
            seen: HashSet::new(),
            stats: CrawlStatistics::default(),
        }
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    /// Statistics so far, with the fetcher's request counters folded in
    pub fn statistics(&self) -> CrawlStatistics {
        CrawlStatistics {
            requests: self.fetcher.attempts(),
            retries: self.fetcher.retries(),
            ..self.stats.clone()
        }
    }

    /// Runs the crawl to completion
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlStatistics)` - Every listing page and incident was processed
    /// * `Err(CrawlError)` - The first fatal error; the run is FAILED
    pub async fn run(&mut self) -> Result<CrawlStatistics, CrawlError> {
        tracing::info!(
            "Starting crawl of year {} ({:?} URL scheme)",
            self.walker.year(),
            self.walker.template()
        );

        match self.crawl().await {
            Ok(()) => {
                self.enter(CrawlPhase::Done);
                let stats = self.statistics();
                tracing::info!(
                    "Crawl completed: {} incidents from {} listing pages",
                    stats.incidents_written,
                    stats.listing_pages_fetched
                );
                Ok(stats)
            }
            Err(e) => {
                let failed_in = self.phase;
                self.enter(CrawlPhase::Failed);
                if let Err(flush) = self.sink.finish() {
                    tracing::warn!("Failed to flush output after error: {}", flush);
                }
                tracing::error!("Crawl failed during {:?}: {}", failed_in, e);
                Err(e)
            }
        }
    }

    async fn crawl(&mut self) -> Result<(), CrawlError> {
        if self.respect_robots {
            self.enter(CrawlPhase::CheckRobots);
            self.check_robots().await?;
        }

        self.enter(CrawlPhase::FetchFirstPage);
        let first_url = self.walker.page_url(0);
        let first_page = self.fetcher.fetch(&first_url).await?;
        self.stats.listing_pages_fetched += 1;

        self.enter(CrawlPhase::DeterminePageCount);
        let (last_page, first_incidents) = {
            let document = Document::parse(&first_page.body);
            let last_page = self
                .walker
                .last_page_index(&document)
                .map_err(|e| CrawlError::extract(&first_url, e))?;
            self.enter(CrawlPhase::ExtractListing { page: 0 });
            let incidents = extract_incidents(&document, &self.base_url)
                .map_err(|e| CrawlError::extract(&first_url, e))?;
            (last_page, incidents)
        };
        self.stats.last_page = last_page;
        tracing::info!(
            "Year {} has {} listing pages",
            self.walker.year(),
            last_page + 1
        );

        self.process_incidents(0, first_incidents).await?;

        for page in self.walker.pages(last_page).skip(1) {
            self.enter(CrawlPhase::NextPage { page });
            let url = self.walker.page_url(page);
            tracing::info!("Listing page {}/{}", page, last_page);
            let listing = self.fetcher.fetch(&url).await?;
            self.stats.listing_pages_fetched += 1;

            self.enter(CrawlPhase::ExtractListing { page });
            let incidents = extract_incidents(&Document::parse(&listing.body), &self.base_url)
                .map_err(|e| CrawlError::extract(&url, e))?;

            self.process_incidents(page, incidents).await?;
        }

        self.sink.finish()?;
        Ok(())
    }

    /// Fetches each incident's detail page, completes it, and sinks it
    async fn process_incidents(
        &mut self,
        page: u32,
        incidents: Vec<Incident>,
    ) -> Result<(), CrawlError> {
        tracing::debug!("Page {}: {} incidents", page, incidents.len());

        for mut incident in incidents {
            if self.seen.contains(incident.sha256()) {
                tracing::debug!("Skipping duplicate incident {}", incident);
                self.stats.duplicates_skipped += 1;
                continue;
            }

            self.enter(CrawlPhase::FetchDetail { page });
            let link = incident.incident_link().to_string();
            let detail = self.fetcher.fetch(&link).await?;
            self.stats.detail_pages_fetched += 1;

            self.enter(CrawlPhase::ExtractDetail { page });
            extract_details(&Document::parse(&detail.body), incident.details_mut())
                .map_err(|e| CrawlError::extract(&link, e))?;

            self.enter(CrawlPhase::Sink { page });
            self.sink.write_incident(&incident)?;
            self.seen.insert(incident.sha256().to_string());
            self.stats.incidents_written += 1;
        }

        Ok(())
    }

    async fn check_robots(&mut self) -> Result<(), CrawlError> {
        let robots = fetch_robots(&self.fetcher, &self.base_url).await;
        let report_url = self.walker.page_url(0);

        if !is_allowed(&robots, &report_url, &self.user_agent_token) {
            return Err(CrawlError::RobotsDenied { url: report_url });
        }

        if let Some(delay) = robots.crawl_delay(&self.user_agent_token) {
            if let Ok(delay) = Duration::try_from_secs_f64(delay) {
                self.fetcher.limiter().raise_interval(delay).await;
            }
        }

        Ok(())
    }

    fn enter(&mut self, phase: CrawlPhase) {
        tracing::trace!("{:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}

/// Runs a complete crawl, writing CSV to the configured output path
///
/// # Example
///
/// ```no_run
/// use shootings_crawler::config::{finalize_config, Config};
/// use shootings_crawler::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut config = Config::default();
/// config.crawl.year = 2015;
/// let stats = run_crawl(&finalize_config(config)?).await?;
/// println!("{} incidents", stats.incidents_written);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(config: &Config) -> Result<CrawlStatistics, CrawlError> {
    let sink = crate::output::CsvSink::create(std::path::Path::new(&config.output.path))?;
    let mut coordinator = Coordinator::new(config, sink)?;
    coordinator.run().await
}
