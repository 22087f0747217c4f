//! Parsed HTML documents and the lookups the extractors rely on
//!
//! The archive's pages have no stable ids or classes on their content
//! sections, so sections are found by the text of their headings. Those
//! text-pattern lookups live here and nowhere else.

use crate::{ExtractError, ExtractResult};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// How an element's text is matched
#[derive(Debug, Clone, Copy)]
pub enum TextPattern<'p> {
    /// Trimmed text starts with the given string
    Prefix(&'p str),
}

impl TextPattern<'_> {
    pub fn matches(&self, text: &str) -> bool {
        match self {
            TextPattern::Prefix(prefix) => text.trim_start().starts_with(prefix),
        }
    }
}

/// A parsed HTML page
pub struct Document {
    html: Html,
}

impl Document {
    /// Parses a page body; html5ever recovers from malformed markup
    pub fn parse(body: &str) -> Self {
        Self {
            html: Html::parse_document(body),
        }
    }

    /// First element matching a CSS selector
    pub fn select_first(&self, css: &str) -> ExtractResult<Option<ElementRef<'_>>> {
        let selector = selector(css)?;
        Ok(self.html.select(&selector).next())
    }

    /// First element of tag `tag` whose text matches `pattern`
    ///
    /// # Example
    ///
    /// ```
    /// use shootings_crawler::crawler::{Document, TextPattern};
    ///
    /// let doc = Document::parse("<div><h2>Notes</h2><p>Text</p></div>");
    /// let heading = doc.find_by_text("h2", TextPattern::Prefix("Notes")).unwrap();
    /// assert!(heading.is_some());
    /// ```
    pub fn find_by_text(
        &self,
        tag: &str,
        pattern: TextPattern<'_>,
    ) -> ExtractResult<Option<ElementRef<'_>>> {
        let selector = selector(tag)?;
        Ok(self
            .html
            .select(&selector)
            .find(|element| pattern.matches(&element_text(*element))))
    }

    /// First text node matching `pattern`, trimmed
    pub fn find_text(&self, pattern: TextPattern<'_>) -> Option<&str> {
        self.html
            .root_element()
            .text()
            .find(|text| pattern.matches(text))
            .map(str::trim)
    }
}

/// Parses a CSS selector into an extraction error on failure
pub fn selector(css: &str) -> ExtractResult<Selector> {
    Selector::parse(css).map_err(|e| ExtractError::Selector(format!("{}: {:?}", css, e)))
}

/// All elements below `element` matching a CSS selector
pub fn select_within<'a>(element: ElementRef<'a>, css: &str) -> ExtractResult<Vec<ElementRef<'a>>> {
    let selector = selector(css)?;
    Ok(element.select(&selector).collect())
}

/// The text content of an element with runs of whitespace collapsed
pub fn element_text(element: ElementRef<'_>) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

/// Trims and collapses internal whitespace runs to single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// The nearest ancestor element of `element`
pub fn parent_element(element: ElementRef<'_>) -> Option<ElementRef<'_>> {
    element.parent().and_then(ElementRef::wrap)
}

/// Sibling elements following `element`, in document order
pub fn following_elements(element: ElementRef<'_>) -> impl Iterator<Item = ElementRef<'_>> {
    element.next_siblings().filter_map(ElementRef::wrap)
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - empty or fragment-only hrefs
/// - javascript:, mailto:, tel: schemes and data: URIs
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    if href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with("data:")
    {
        return None;
    }

    match base_url.join(href) {
        Ok(absolute_url) => {
            if absolute_url.scheme() == "http" || absolute_url.scheme() == "https" {
                Some(absolute_url)
            } else {
                None
            }
        }
        Err(_) => None,
    }
}
