//! Cited-by pagination.
//!
//! Pages through the works citing one citation group, 20 records at a time,
//! until a short or empty page, the optional cap, or the first failed fetch.
//! A failed fetch keeps whatever was accumulated before it.

use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::scholar::{RawCitingRecord, ScholarIndex};
use crate::types::CitationGroupHandle;

/// Records requested per page.
pub const PAGE_SIZE: usize = 20;

/// Why pagination stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// A page came back with no records.
    EmptyPage,
    /// A page came back with fewer than [`PAGE_SIZE`] records.
    ShortPage,
    /// The accumulated records reached the cap.
    CapReached,
    /// A page fetch failed; earlier records are kept.
    FetchFailed,
}

/// Result of paging one citation group.
#[derive(Debug, Clone, PartialEq)]
pub struct CitingSet {
    pub records: Vec<RawCitingRecord>,
    pub pages_fetched: usize,
    pub stop: StopReason,
}

/// Walks the cited-by listing of a citation group.
pub struct CitingPaginator<'a> {
    index: &'a dyn ScholarIndex,
    page_delay: Duration,
}

impl<'a> CitingPaginator<'a> {
    pub fn new(index: &'a dyn ScholarIndex, page_delay: Duration) -> Self {
        Self { index, page_delay }
    }

    /// Collect the citing records of `handle`.
    ///
    /// The cap is checked only after a full page; it never shrinks the page size.
    pub async fn collect(
        &self,
        handle: &CitationGroupHandle,
        max_results: Option<usize>,
    ) -> CitingSet {
        let mut records: Vec<RawCitingRecord> = Vec::new();
        let mut start = 0usize;
        let mut pages_fetched = 0usize;

        loop {
            info!(
                page = start / PAGE_SIZE + 1,
                first = start,
                last = start + PAGE_SIZE - 1,
                "Fetching citing articles page"
            );

            let response = match self.index.cited_by_page(handle, start, PAGE_SIZE).await {
                Ok(response) => response,
                Err(e) => {
                    warn!(cites_id = %handle, error = %e, "Error fetching citing articles");
                    return CitingSet {
                        records,
                        pages_fetched,
                        stop: StopReason::FetchFailed,
                    };
                }
            };
            pages_fetched += 1;

            let page = response.organic_results;
            if page.is_empty() {
                if start == 0 {
                    info!(
                        cites_id = %handle,
                        provider_error = response.error.as_deref().unwrap_or(""),
                        "No citing articles found on first page"
                    );
                }
                return CitingSet {
                    records,
                    pages_fetched,
                    stop: StopReason::EmptyPage,
                };
            }

            let page_len = page.len();
            debug!(count = page_len, "Found articles on this page");
            records.extend(page);

            if page_len < PAGE_SIZE {
                debug!(count = page_len, page_size = PAGE_SIZE, "Reached end of results");
                return CitingSet {
                    records,
                    pages_fetched,
                    stop: StopReason::ShortPage,
                };
            }

            if let Some(cap) = max_results
                && records.len() >= cap
            {
                info!(cap, "Reached maximum results limit");
                records.truncate(cap);
                return CitingSet {
                    records,
                    pages_fetched,
                    stop: StopReason::CapReached,
                };
            }

            start += PAGE_SIZE;
            if !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }
    }
}
