//! # citeharvest core
//!
//! Collects the works citing a list of DOIs. Each identifier is resolved to a
//! title through Crossref, matched to a Google Scholar record through SerpApi,
//! and its cited-by listing is paged and flattened into CSV rows.

pub mod config;
pub mod error;
pub mod harvest;
pub mod locator;
pub mod metadata;
pub mod normalize;
pub mod paginator;
pub mod report;
pub mod scholar;
pub mod types;

// Re-export commonly used types at the crate root.
pub use config::{HarvestConfig, config_exists, load_config};
pub use error::{HarvestError, Result};
pub use harvest::{HarvestOptions, HarvestReport, Harvester, IdentifierOutcome, RunSummary};
pub use metadata::{CrossrefClient, MetadataSource, MockMetadataSource};
pub use report::{ReportTable, WriteOutcome};
pub use scholar::{MockScholarIndex, ScholarIndex, SerpApiClient};
pub use types::{CitationGroupHandle, FALLBACK, InputIdentifier, NormalizedRow};
