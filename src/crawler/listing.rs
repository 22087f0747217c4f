//! Listing page extraction
//!
//! A listing page holds one table row per incident:
//!
//! | date | state | city or county | address | # killed | # injured | operations |
//!
//! The operations cell contains a list of links; the first one leads to the
//! incident's detail page. Rows are read in document order and any malformed
//! row fails the whole page.

use crate::crawler::document::{element_text, resolve_link, select_within, Document};
use crate::incident::{Incident, IncidentCore};
use crate::{ExtractError, ExtractResult};
use chrono::{Datelike, NaiveDate};
use scraper::ElementRef;
use url::Url;

/// Number of data columns a row must have
const COLUMNS: usize = 7;

/// Date layouts seen in the date column
const DATE_FORMATS: [&str; 6] = [
    "%B %d, %Y",
    "%b %d, %Y",
    "%b. %d, %Y",
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d %B %Y",
];

/// Extracts one partially-populated incident per table row
///
/// Only the core fields are set; the incident link is resolved against
/// `base_url`.
pub fn extract_incidents(document: &Document, base_url: &Url) -> ExtractResult<Vec<Incident>> {
    let body = document
        .select_first("table tbody")?
        .ok_or_else(|| ExtractError::MissingElement("listing table body".to_string()))?;

    select_within(body, "tr")?
        .into_iter()
        .enumerate()
        .map(|(index, row)| extract_row(row, index + 1, base_url))
        .collect()
}

/// Reads one `<tr>` into an incident
fn extract_row(row: ElementRef<'_>, row_number: usize, base_url: &Url) -> ExtractResult<Incident> {
    let cells = select_within(row, "td")?;
    if cells.len() < COLUMNS {
        return Err(ExtractError::MissingColumn {
            row: row_number,
            column: COLUMN_NAMES[cells.len()],
        });
    }
    // Some report years prepend an incident id column
    let cells = &cells[cells.len() - COLUMNS..];

    let date_text = element_text(cells[0]);
    let date = parse_date(&date_text).ok_or_else(|| ExtractError::InvalidDate {
        row: row_number,
        text: date_text.clone(),
    })?;

    let num_killed = parse_count(cells[4], row_number, "num_killed")?;
    let num_injured = parse_count(cells[5], row_number, "num_injured")?;

    let link = detail_link(cells[6], base_url).ok_or(ExtractError::MissingLink { row: row_number })?;

    Ok(Incident::from_core(IncidentCore {
        year: date.year(),
        month: date.month(),
        day: date.day(),
        state: element_text(cells[1]),
        city_or_county: element_text(cells[2]),
        address: element_text(cells[3]),
        num_killed,
        num_injured,
        incident_link: link.to_string(),
    }))
}

const COLUMN_NAMES: [&str; COLUMNS] = [
    "date",
    "state",
    "city_or_county",
    "address",
    "num_killed",
    "num_injured",
    "incident_link",
];

/// Parses a free-text date in any of the accepted layouts
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}

fn parse_count(cell: ElementRef<'_>, row: usize, column: &'static str) -> ExtractResult<u32> {
    let text = element_text(cell);
    text.replace(',', "")
        .parse()
        .map_err(|_| ExtractError::InvalidNumber {
            row,
            column,
            value: text,
        })
}

/// First link inside a list in the operations cell
fn detail_link(cell: ElementRef<'_>, base_url: &Url) -> Option<Url> {
    let links = select_within(cell, "ul li a[href]").ok()?;
    let href = links.first()?.value().attr("href")?;
    resolve_link(href, base_url)
}
