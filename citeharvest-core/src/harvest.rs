//! Harvest orchestration.
//!
//! Runs the per-identifier pipeline (title → citation group → citing pages →
//! rows) strictly in sequence. Every stage failure skips only the current
//! identifier; rows already collected are kept. The [`ReportTable`] is owned
//! by the run and handed back to the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::HarvestConfig;
use crate::error::Result;
use crate::locator::locate_citations;
use crate::metadata::{CrossrefClient, MetadataSource, resolve_title};
use crate::normalize::normalize;
use crate::paginator::{CitingPaginator, StopReason};
use crate::report::ReportTable;
use crate::scholar::{ScholarIndex, SerpApiClient};
use crate::types::InputIdentifier;

/// Knobs of one run.
#[derive(Debug, Clone, Default)]
pub struct HarvestOptions {
    /// Per-identifier cap on citing records.
    pub max_results: Option<usize>,
    pub page_delay: Duration,
    pub identifier_delay: Duration,
}

impl HarvestOptions {
    pub fn from_config(config: &HarvestConfig) -> Self {
        Self {
            max_results: config.search.effective_max_results(),
            page_delay: config.pacing.page_delay(),
            identifier_delay: config.pacing.identifier_delay(),
        }
    }
}

/// Pipeline stage at which an identifier was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    TitleResolution,
    CitationLookup,
    Pagination,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::TitleResolution => write!(f, "title resolution"),
            Stage::CitationLookup => write!(f, "citation lookup"),
            Stage::Pagination => write!(f, "pagination"),
        }
    }
}

/// What one identifier contributed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum IdentifierOutcome {
    Harvested {
        rows: usize,
        total_citations: u64,
        cites_id: String,
        /// Title of the index record the citation group was taken from.
        #[serde(skip_serializing_if = "Option::is_none")]
        matched_title: Option<String>,
        stop: StopReason,
    },
    Skipped {
        stage: Stage,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifierReport {
    pub identifier: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub outcome: IdentifierOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentifierCount {
    pub identifier: String,
    pub count: usize,
}

/// Serializable account of a run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_rows: usize,
    pub counts: Vec<IdentifierCount>,
    pub identifiers: Vec<IdentifierReport>,
}

impl RunSummary {
    /// Identifiers that contributed no rows.
    pub fn skipped(&self) -> impl Iterator<Item = &IdentifierReport> {
        self.identifiers
            .iter()
            .filter(|r| matches!(r.outcome, IdentifierOutcome::Skipped { .. }))
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Result of [`Harvester::run`].
#[derive(Debug, Clone)]
pub struct HarvestReport {
    pub table: ReportTable,
    pub summary: RunSummary,
}

/// Drives the pipeline over a list of identifiers.
pub struct Harvester {
    metadata: Arc<dyn MetadataSource>,
    index: Arc<dyn ScholarIndex>,
    options: HarvestOptions,
}

impl Harvester {
    pub fn new(
        metadata: Arc<dyn MetadataSource>,
        index: Arc<dyn ScholarIndex>,
        options: HarvestOptions,
    ) -> Self {
        Self {
            metadata,
            index,
            options,
        }
    }

    /// Build a harvester backed by Crossref and SerpApi.
    pub fn from_config(config: &HarvestConfig) -> Result<Self> {
        let metadata = CrossrefClient::new(&config.metadata)?;
        let index = SerpApiClient::new(&config.search)?;
        Ok(Self::new(
            Arc::new(metadata),
            Arc::new(index),
            HarvestOptions::from_config(config),
        ))
    }

    /// Process every identifier in order and return the collected table.
    pub async fn run(&self, identifiers: &[InputIdentifier]) -> HarvestReport {
        let started_at = Utc::now();
        let mut table = ReportTable::new();
        let mut reports = Vec::with_capacity(identifiers.len());

        for (i, id) in identifiers.iter().enumerate() {
            if i > 0 && !self.options.identifier_delay.is_zero() {
                tokio::time::sleep(self.options.identifier_delay).await;
            }
            reports.push(self.harvest_one(id, &mut table).await);
        }

        let counts = table
            .counts_by_identifier()
            .into_iter()
            .map(|(identifier, count)| IdentifierCount { identifier, count })
            .collect();

        let summary = RunSummary {
            started_at,
            finished_at: Utc::now(),
            total_rows: table.len(),
            counts,
            identifiers: reports,
        };
        HarvestReport { table, summary }
    }

    /// Run the pipeline for one identifier, appending its rows to `table`.
    pub async fn harvest_one(
        &self,
        id: &InputIdentifier,
        table: &mut ReportTable,
    ) -> IdentifierReport {
        info!(doi = %id, "Processing DOI");

        let Some(title) = resolve_title(self.metadata.as_ref(), id).await else {
            return skipped(id, None, Stage::TitleResolution, "could not find title");
        };
        info!(doi = %id, title = %title, "Found title");

        let target = match locate_citations(self.index.as_ref(), &title).await {
            Ok(target) => target,
            Err(failure) => {
                return skipped(id, Some(title), Stage::CitationLookup, &failure.to_string());
            }
        };
        info!(
            doi = %id,
            total_citations = target.total_citations,
            cites_id = %target.handle,
            "Found citation group"
        );

        let set = CitingPaginator::new(self.index.as_ref(), self.options.page_delay)
            .collect(&target.handle, self.options.max_results)
            .await;

        if set.records.is_empty() {
            let reason = if set.stop == StopReason::FetchFailed {
                "citing articles could not be fetched"
            } else {
                "no citing articles retrieved"
            };
            return skipped(id, Some(title), Stage::Pagination, reason);
        }

        let rows = set.records.len();
        info!(doi = %id, rows, "Retrieved citing articles");
        table.extend(set.records.iter().map(|record| normalize(record, id)));

        IdentifierReport {
            identifier: id.to_string(),
            title: Some(title),
            outcome: IdentifierOutcome::Harvested {
                rows,
                total_citations: target.total_citations,
                cites_id: target.handle.to_string(),
                matched_title: target.matched_title,
                stop: set.stop,
            },
        }
    }
}

fn skipped(
    id: &InputIdentifier,
    title: Option<String>,
    stage: Stage,
    reason: &str,
) -> IdentifierReport {
    warn!(doi = %id, stage = %stage, reason, "Skipping identifier");
    IdentifierReport {
        identifier: id.to_string(),
        title,
        outcome: IdentifierOutcome::Skipped {
            stage,
            reason: reason.to_string(),
        },
    }
}
