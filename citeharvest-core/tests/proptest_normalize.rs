//! Property-based tests for record normalization using proptest.

use proptest::prelude::*;

use citeharvest_core::normalize::{extract_year, normalize};
use citeharvest_core::scholar::{Author, OrganicResult, PublicationInfo};
use citeharvest_core::types::{FALLBACK, InputIdentifier};

fn record(
    title: Option<String>,
    link: Option<String>,
    summary: Option<String>,
    authors: Option<Vec<String>>,
) -> OrganicResult {
    OrganicResult {
        title,
        link,
        publication_info: Some(PublicationInfo {
            summary,
            authors: authors.map(|names| {
                names
                    .into_iter()
                    .map(|name| Author {
                        name: Some(name),
                        ..Author::default()
                    })
                    .collect()
            }),
        }),
        ..OrganicResult::default()
    }
}

proptest! {
    #[test]
    fn present_fields_are_reproduced(
        title in "[A-Za-z ,]{1,40}",
        link in "https://[a-z]{1,12}\\.org/[a-z0-9]{1,8}",
        venue in "[A-Za-z ]{1,30}",
        year in 1900u32..2100,
        names in prop::collection::vec("[A-Z] [A-Za-z]{1,10}", 1..5),
    ) {
        let summary = format!("{} - {}, {}", names[0], venue, year);
        let row = normalize(
            &record(Some(title.clone()), Some(link.clone()), Some(summary.clone()), Some(names.clone())),
            &InputIdentifier::from("D1"),
        );
        prop_assert_eq!(row.original_doi, "D1");
        prop_assert_eq!(row.citing_title, title);
        prop_assert_eq!(row.citing_link, link);
        prop_assert_eq!(row.citing_authors, names.join(", "));
        prop_assert_eq!(row.citing_year, year.to_string());
        prop_assert_eq!(row.citing_venue, summary);
    }

    #[test]
    fn missing_field_substitutes_only_that_field(
        title in "[A-Za-z ]{1,40}",
        link in "https://[a-z]{1,12}\\.org",
        drop_title in any::<bool>(),
        drop_link in any::<bool>(),
    ) {
        let row = normalize(
            &record(
                (!drop_title).then(|| title.clone()),
                (!drop_link).then(|| link.clone()),
                Some("X Doe - Journal, 2001".into()),
                Some(vec!["X Doe".into()]),
            ),
            &InputIdentifier::from("D1"),
        );
        if drop_title {
            prop_assert_eq!(&row.citing_title, FALLBACK);
        } else {
            prop_assert_eq!(&row.citing_title, &title);
        }
        if drop_link {
            prop_assert_eq!(&row.citing_link, FALLBACK);
        } else {
            prop_assert_eq!(&row.citing_link, &link);
        }
        prop_assert_eq!(row.citing_authors, "X Doe");
        prop_assert_eq!(row.citing_year, "2001");
    }

    #[test]
    fn summaries_without_digits_have_no_year(summary in "[A-Za-z ,.-]{0,60}") {
        prop_assert!(extract_year(&summary).is_none());
    }

    #[test]
    fn extracted_year_is_in_range(summary in "[A-Za-z0-9 ,.-]{0,60}") {
        if let Some(year) = extract_year(&summary) {
            prop_assert_eq!(year.len(), 4);
            prop_assert!(year.starts_with("19") || year.starts_with("20"));
        }
    }
}
