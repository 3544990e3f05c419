//! Maps raw citing records onto the fixed report row shape.

use regex::Regex;
use std::sync::LazyLock;

use crate::scholar::RawCitingRecord;
use crate::types::{FALLBACK, InputIdentifier, NormalizedRow};

static YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("year pattern is valid"));

/// First standalone 19xx/20xx year in a publication summary.
pub fn extract_year(summary: &str) -> Option<&str> {
    YEAR_RE.find(summary).map(|m| m.as_str())
}

/// Author display names joined with ", ". `None` when the list is absent or empty.
pub fn join_authors(record: &RawCitingRecord) -> Option<String> {
    let authors = record
        .publication_info
        .as_ref()
        .and_then(|info| info.authors.as_ref())
        .filter(|authors| !authors.is_empty())?;
    Some(
        authors
            .iter()
            .map(|a| a.name.as_deref().unwrap_or(""))
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// Normalize one citing record. Never fails: absent fields become [`FALLBACK`].
pub fn normalize(record: &RawCitingRecord, origin: &InputIdentifier) -> NormalizedRow {
    let summary = record
        .publication_info
        .as_ref()
        .and_then(|info| info.summary.as_deref())
        .filter(|s| !s.is_empty());

    NormalizedRow {
        original_doi: origin.as_str().to_string(),
        citing_title: record
            .title
            .clone()
            .unwrap_or_else(|| FALLBACK.to_string()),
        citing_authors: join_authors(record).unwrap_or_else(|| FALLBACK.to_string()),
        citing_year: summary
            .and_then(extract_year)
            .unwrap_or(FALLBACK)
            .to_string(),
        citing_venue: summary.unwrap_or(FALLBACK).to_string(),
        citing_link: record
            .link
            .clone()
            .unwrap_or_else(|| FALLBACK.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scholar::{Author, PublicationInfo};
    use pretty_assertions::assert_eq;

    fn full_record() -> RawCitingRecord {
        RawCitingRecord {
            title: Some("Sea-level rise and coastal health".into()),
            link: Some("https://example.org/slr".into()),
            publication_info: Some(PublicationInfo {
                summary: Some("J Smith, K Lee - Estuarine, Coastal and Shelf Science, 2019 - Elsevier".into()),
                authors: Some(vec![
                    Author {
                        name: Some("J Smith".into()),
                        ..Author::default()
                    },
                    Author {
                        name: Some("K Lee".into()),
                        ..Author::default()
                    },
                ]),
            }),
            ..RawCitingRecord::default()
        }
    }

    #[test]
    fn test_full_record_reproduced() {
        let row = normalize(&full_record(), &InputIdentifier::from("D1"));
        assert_eq!(
            row,
            NormalizedRow {
                original_doi: "D1".into(),
                citing_title: "Sea-level rise and coastal health".into(),
                citing_authors: "J Smith, K Lee".into(),
                citing_year: "2019".into(),
                citing_venue: "J Smith, K Lee - Estuarine, Coastal and Shelf Science, 2019 - Elsevier"
                    .into(),
                citing_link: "https://example.org/slr".into(),
            }
        );
    }

    #[test]
    fn test_missing_title_only() {
        let mut record = full_record();
        record.title = None;
        let row = normalize(&record, &InputIdentifier::from("D1"));
        assert_eq!(row.citing_title, FALLBACK);
        assert_eq!(row.citing_link, "https://example.org/slr");
        assert_eq!(row.citing_authors, "J Smith, K Lee");
        assert_eq!(row.citing_year, "2019");
    }

    #[test]
    fn test_missing_link_only() {
        let mut record = full_record();
        record.link = None;
        let row = normalize(&record, &InputIdentifier::from("D1"));
        assert_eq!(row.citing_link, FALLBACK);
        assert_eq!(row.citing_title, "Sea-level rise and coastal health");
    }

    #[test]
    fn test_empty_author_list() {
        let mut record = full_record();
        if let Some(info) = record.publication_info.as_mut() {
            info.authors = Some(vec![]);
        }
        let row = normalize(&record, &InputIdentifier::from("D1"));
        assert_eq!(row.citing_authors, FALLBACK);
        assert_eq!(row.citing_year, "2019");
    }

    #[test]
    fn test_nameless_author_contributes_empty_name() {
        let mut record = full_record();
        if let Some(info) = record.publication_info.as_mut() {
            info.authors = Some(vec![
                Author::default(),
                Author {
                    name: Some("K Lee".into()),
                    ..Author::default()
                },
            ]);
        }
        assert_eq!(join_authors(&record).as_deref(), Some(", K Lee"));
    }

    #[test]
    fn test_missing_summary() {
        let mut record = full_record();
        if let Some(info) = record.publication_info.as_mut() {
            info.summary = None;
        }
        let row = normalize(&record, &InputIdentifier::from("D1"));
        assert_eq!(row.citing_year, FALLBACK);
        assert_eq!(row.citing_venue, FALLBACK);
        assert_eq!(row.citing_authors, "J Smith, K Lee");
    }

    #[test]
    fn test_empty_record() {
        let row = normalize(&RawCitingRecord::default(), &InputIdentifier::from("D9"));
        assert_eq!(row.original_doi, "D9");
        for field in [
            &row.citing_title,
            &row.citing_authors,
            &row.citing_year,
            &row.citing_venue,
            &row.citing_link,
        ] {
            assert_eq!(field, FALLBACK);
        }
    }

    #[test]
    fn test_extract_year() {
        assert_eq!(extract_year("J Smith - Journal, 2019"), Some("2019"));
        assert_eq!(extract_year("no digits here"), None);
        assert_eq!(extract_year("Vol 3412, pp 1-9 - Journal, 1998"), Some("1998"));
        assert_eq!(extract_year("2021 and 1999"), Some("2021"));
        assert_eq!(extract_year("ISBN 12019 only"), None);
    }

    #[test]
    fn test_summary_without_year_keeps_venue() {
        let mut record = full_record();
        if let Some(info) = record.publication_info.as_mut() {
            info.summary = Some("K Lee - Working paper".into());
        }
        let row = normalize(&record, &InputIdentifier::from("D1"));
        assert_eq!(row.citing_year, FALLBACK);
        assert_eq!(row.citing_venue, "K Lee - Working paper");
    }
}
