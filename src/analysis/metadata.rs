//! Parser for the four-line metadata template the model is asked to follow.
//!
//! ```text
//! **Title:** <title>
//! **Authors:** <a1>, <a2>, ...
//! **Publication Date:** <date>
//! **Abstract:** <abstract>
//! ```
//!
//! Each label is matched independently, so a reply that gets only some lines
//! right still yields those fields. Anything unmatched keeps its default
//! ([`crate::state::UNKNOWN`] or an empty author list); parsing never fails.

use crate::state::PaperMetadata;
use once_cell::sync::Lazy;
use regex::Regex;

static RE_TITLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*Title:\*\*\s*(.+)").unwrap());

static RE_AUTHORS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*Authors:\*\*\s*(.+)").unwrap());

static RE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*Publication Date:\*\*\s*(.+)").unwrap());

// The abstract runs to the end of the reply, across line breaks.
static RE_ABSTRACT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\*\*Abstract:\*\*\s*(.+)").unwrap());

/// Parse a model reply into [`PaperMetadata`].
pub fn parse_metadata(response: &str) -> PaperMetadata {
    let response = response.trim();
    let mut metadata = PaperMetadata::default();

    if let Some(title) = capture(&RE_TITLE, response) {
        metadata.title = title;
    }
    if let Some(authors) = capture(&RE_AUTHORS, response) {
        metadata.authors = split_authors(&authors);
    }
    if let Some(date) = capture(&RE_DATE, response) {
        metadata.publication_date = date;
    }
    if let Some(abstract_text) = capture(&RE_ABSTRACT, response) {
        metadata.abstract_text = abstract_text;
    }

    metadata
}

fn capture(re: &Regex, haystack: &str) -> Option<String> {
    re.captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
}

fn split_authors(line: &str) -> Vec<String> {
    line.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect()
}
