//! Finds the search index's own record for a resolved title and extracts its
//! citation-group handle.
//!
//! The metadata service and the index share no identifier space, so an
//! exact-phrase title search stands in for a join; the first organic result
//! is taken as the match.

use std::fmt;
use tracing::{debug, info};

use crate::scholar::{CitedBy, OrganicResult, ScholarIndex};
use crate::types::CitationGroupHandle;

/// The located "cited by" group of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationTarget {
    pub handle: CitationGroupHandle,
    /// Citation count advertised by the index. Informational only.
    pub total_citations: u64,
    pub matched_title: Option<String>,
}

/// Why no citation group could be located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocateFailure {
    SearchFailed(String),
    NoResults { provider_error: Option<String> },
    NoCitationInfo,
    NoCitesId,
}

impl fmt::Display for LocateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocateFailure::SearchFailed(message) => write!(f, "title search failed: {}", message),
            LocateFailure::NoResults {
                provider_error: Some(message),
            } => write!(f, "no search results found for title ({})", message),
            LocateFailure::NoResults {
                provider_error: None,
            } => write!(f, "no search results found for title"),
            LocateFailure::NoCitationInfo => write!(f, "no citation information found"),
            LocateFailure::NoCitesId => write!(f, "no cites_id found"),
        }
    }
}

/// The citation block of a result: `inline_links.cited_by` when present and
/// non-empty, otherwise the top-level `cited_by`.
pub fn citation_block(result: &OrganicResult) -> Option<&CitedBy> {
    result
        .inline_links
        .as_ref()
        .and_then(|links| links.cited_by.as_ref())
        .filter(|block| !block.is_empty())
        .or_else(|| result.cited_by.as_ref().filter(|block| !block.is_empty()))
}

/// Search the index for `title` and extract the citation group of the top hit.
pub async fn locate_citations(
    index: &dyn ScholarIndex,
    title: &str,
) -> Result<CitationTarget, LocateFailure> {
    let response = index
        .search_title(title)
        .await
        .map_err(|e| LocateFailure::SearchFailed(e.to_string()))?;

    let Some(first) = response.organic_results.first() else {
        return Err(LocateFailure::NoResults {
            provider_error: response.error,
        });
    };

    info!(
        matched = first.title.as_deref().unwrap_or(crate::types::FALLBACK),
        "Found article"
    );

    let block = citation_block(first).ok_or(LocateFailure::NoCitationInfo)?;
    let total_citations = block.total.unwrap_or(0);
    let cites_id = block
        .cites_id
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or(LocateFailure::NoCitesId)?;

    debug!(cites_id, total_citations, "Located citation group");

    Ok(CitationTarget {
        handle: CitationGroupHandle::new(cites_id),
        total_citations,
        matched_title: first.title.clone(),
    })
}
