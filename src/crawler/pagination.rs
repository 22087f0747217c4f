//! Listing page URLs and page-count discovery
//!
//! The archive changed its report URLs in 2016. Reports before 2016 carry the
//! year as a path segment (`/reports/mass-shootings/2015?page=N`); reports
//! from 2016 on carry it in the query string
//! (`/reports/mass-shooting?year=2016&page=N`). Pages are zero-based.

use crate::crawler::document::{resolve_link, Document};
use crate::{ExtractError, ExtractResult};
use url::Url;

/// First year published under the query-string URL scheme
pub const QUERY_YEAR_SINCE: i32 = 2016;

/// The two historical listing URL schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingTemplate {
    /// `<base>/reports/mass-shootings/<year>?page=<n>` (before 2016)
    PathYear,
    /// `<base>/reports/mass-shooting?year=<year>&page=<n>` (2016 and later)
    QueryYear,
}

impl ListingTemplate {
    pub fn for_year(year: i32) -> Self {
        if year < QUERY_YEAR_SINCE {
            ListingTemplate::PathYear
        } else {
            ListingTemplate::QueryYear
        }
    }

    /// Path of the listing report, relative to the site root
    pub fn report_path(&self, year: i32) -> String {
        match self {
            ListingTemplate::PathYear => format!("/reports/mass-shootings/{}", year),
            ListingTemplate::QueryYear => "/reports/mass-shooting".to_string(),
        }
    }

    /// Fills the template for one page
    pub fn page_url(&self, base: &str, year: i32, page: u32) -> String {
        let base = base.trim_end_matches('/');
        match self {
            ListingTemplate::PathYear => {
                format!("{}{}?page={}", base, self.report_path(year), page)
            }
            ListingTemplate::QueryYear => format!(
                "{}{}?year={}&page={}",
                base,
                self.report_path(year),
                year,
                page
            ),
        }
    }
}

/// Builds listing page URLs for one year and reads the page count
#[derive(Debug, Clone)]
pub struct PageWalker {
    base: Url,
    year: i32,
    template: ListingTemplate,
}

impl PageWalker {
    pub fn new(base: Url, year: i32) -> Self {
        Self {
            base,
            year,
            template: ListingTemplate::for_year(year),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn template(&self) -> ListingTemplate {
        self.template
    }

    /// URL of listing page `page` (zero-based)
    pub fn page_url(&self, page: u32) -> String {
        self.template.page_url(self.base.as_str(), self.year, page)
    }

    /// Zero-based index of the final listing page
    ///
    /// Read from the `page` query parameter of the pager's "last" link. A
    /// missing control or parameter is a structural error; there is no
    /// single-page fallback.
    pub fn last_page_index(&self, document: &Document) -> ExtractResult<u32> {
        let link = document
            .select_first("li.pager-last a[href]")?
            .ok_or_else(|| ExtractError::MissingElement("pager 'last' link".to_string()))?;

        let href = link.value().attr("href").unwrap_or_default();
        let target = resolve_link(href, &self.base)
            .ok_or_else(|| ExtractError::InvalidUrl(href.to_string()))?;

        page_parameter(&target).ok_or_else(|| ExtractError::MissingPageParameter(href.to_string()))
    }

    /// Every page index from 0 through `last_page` inclusive
    pub fn pages(&self, last_page: u32) -> impl Iterator<Item = u32> {
        0..=last_page
    }
}

/// Integer value of the `page` query parameter
fn page_parameter(url: &Url) -> Option<u32> {
    url.query_pairs()
        .find(|(key, _)| key == "page")
        .and_then(|(_, value)| value.trim().parse().ok())
}
