//! Detail page extraction
//!
//! An incident's detail page is a series of blocks, each opened by an `<h2>`
//! heading: Location, Participants, Incident Characteristics, Notes, Guns
//! Involved and District. Participants and characteristics are required;
//! everything else falls back to an empty value when its block is missing.

use crate::crawler::document::{
    collapse_whitespace, element_text, following_elements, parent_element, select_within,
    Document, TextPattern,
};
use crate::incident::{FieldMap, IncidentDetails};
use crate::{ExtractError, ExtractResult};
use scraper::ElementRef;

const SECTION_HEADING: &str = "h2";

/// Fills every secondary field of `details` from a detail page
pub fn extract_details(document: &Document, details: &mut IncidentDetails) -> ExtractResult<()> {
    let (latitude, longitude) = extract_coordinates(document).unwrap_or((0.0, 0.0));
    details.latitude = latitude;
    details.longitude = longitude;
    details.participants = extract_participants(document)?;
    details.characteristics = extract_characteristics(document)?;
    details.notes = extract_notes(document)?;
    details.guns_involved = extract_guns_involved(document)?;
    details.district = extract_district(document)?;
    Ok(())
}

/// Latitude and longitude from the "Geolocation: lat, lon" line
///
/// Returns None when the line is absent or unreadable.
pub fn extract_coordinates(document: &Document) -> Option<(f64, f64)> {
    let line = document.find_text(TextPattern::Prefix("Geolocation"))?;
    let coordinates = parse_geolocation(line);
    if coordinates.is_none() {
        tracing::warn!("Unreadable geolocation '{}'", line);
    }
    coordinates
}

fn parse_geolocation(line: &str) -> Option<(f64, f64)> {
    let (_, value) = line.split_once(':')?;
    let (lat, lon) = value.split_once(',')?;
    Some((lat.trim().parse().ok()?, lon.trim().parse().ok()?))
}

/// One field mapping per participant list
pub fn extract_participants(document: &Document) -> ExtractResult<Vec<FieldMap>> {
    let block = required_section(document, "Participants")?;
    field_map_lists(block)
}

/// One tag per list entry of the "Incident Characteristics" block
pub fn extract_characteristics(document: &Document) -> ExtractResult<Vec<String>> {
    let block = required_section(document, "Incident Characteristics")?;
    Ok(select_within(block, "li")?
        .into_iter()
        .map(element_text)
        .filter(|tag| !tag.is_empty())
        .collect())
}

/// Text of the first paragraph after the "Notes" heading; empty if absent
pub fn extract_notes(document: &Document) -> ExtractResult<String> {
    let Some(heading) = document.find_by_text(SECTION_HEADING, TextPattern::Prefix("Notes"))?
    else {
        return Ok(String::new());
    };

    Ok(following_elements(heading)
        .find(|element| element.value().name() == "p")
        .map(element_text)
        .unwrap_or_default())
}

/// One field mapping per gun list; empty if the block is absent
pub fn extract_guns_involved(document: &Document) -> ExtractResult<Vec<FieldMap>> {
    match section(document, "Guns Involved")? {
        Some(block) => field_map_lists(block),
        None => Ok(Vec::new()),
    }
}

/// `key: value` lines of the "District" block; empty if absent
pub fn extract_district(document: &Document) -> ExtractResult<FieldMap> {
    let Some(block) = section(document, "District")? else {
        return Ok(FieldMap::new());
    };

    Ok(block
        .text()
        .map(collapse_whitespace)
        .filter_map(|line| split_pair(&line))
        .collect())
}

/// The block enclosing the heading that starts with `title`
fn section<'a>(document: &'a Document, title: &str) -> ExtractResult<Option<ElementRef<'a>>> {
    Ok(document
        .find_by_text(SECTION_HEADING, TextPattern::Prefix(title))?
        .and_then(parent_element))
}

fn required_section<'a>(document: &'a Document, title: &str) -> ExtractResult<ElementRef<'a>> {
    section(document, title)?
        .ok_or_else(|| ExtractError::MissingElement(format!("'{}' section", title)))
}

/// Each `<ul>` in `block` becomes one mapping of its `key: value` entries
fn field_map_lists(block: ElementRef<'_>) -> ExtractResult<Vec<FieldMap>> {
    select_within(block, "ul")?
        .into_iter()
        .map(|list| {
            Ok(select_within(list, "li")?
                .into_iter()
                .filter_map(|item| split_pair(&element_text(item)))
                .collect())
        })
        .collect()
}

/// Splits `key: value` on the first colon
fn split_pair(line: &str) -> Option<(String, String)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key.to_string(), value.trim().to_string()))
}
