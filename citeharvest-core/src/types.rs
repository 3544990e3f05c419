//! Fundamental value types shared across the harvest pipeline.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token written in place of any field the upstream record does not carry.
pub const FALLBACK: &str = "N/A";

/// A document identifier (normally a DOI) that seeds one unit of work.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InputIdentifier(String);

impl InputIdentifier {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InputIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InputIdentifier {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for InputIdentifier {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Opaque handle the search index uses to enumerate the works citing one record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CitationGroupHandle(String);

impl CitationGroupHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CitationGroupHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One output row of the report. Every field is always populated.
///
/// Field order is the CSV column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedRow {
    pub original_doi: String,
    pub citing_title: String,
    pub citing_authors: String,
    pub citing_year: String,
    pub citing_venue: String,
    pub citing_link: String,
}

/// CSV header, in column order.
pub const REPORT_COLUMNS: [&str; 6] = [
    "original_doi",
    "citing_title",
    "citing_authors",
    "citing_year",
    "citing_venue",
    "citing_link",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_display_roundtrip() {
        let id = InputIdentifier::from("10.1007/BF03404373");
        assert_eq!(id.to_string(), "10.1007/BF03404373");
        assert_eq!(id.as_str(), "10.1007/BF03404373");
    }

    #[test]
    fn test_identifier_serializes_as_plain_string() {
        let id = InputIdentifier::new("10.1002/ajhb.23516");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"10.1002/ajhb.23516\"");
    }

    #[test]
    fn test_handle_display() {
        let handle = CitationGroupHandle::new("1234567890");
        assert_eq!(format!("cites_id: {}", handle), "cites_id: 1234567890");
    }
}
