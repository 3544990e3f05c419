//! Title resolution against a bibliographic metadata service.
//!
//! The production source is Crossref's REST API (`/works/{doi}`); the
//! [`MetadataSource`] trait lets the harvester run against an in-memory
//! double in tests.

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::MetadataConfig;
use crate::error::MetadataError;
use crate::types::InputIdentifier;

/// A service able to map a document identifier to its display title.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch the first listed title for `id`. `Ok(None)` means the record
    /// exists but carries no title.
    async fn fetch_title(&self, id: &InputIdentifier) -> Result<Option<String>, MetadataError>;
}

#[derive(Debug, Deserialize)]
struct CrossrefEnvelope {
    message: CrossrefWork,
}

#[derive(Debug, Deserialize)]
struct CrossrefWork {
    #[serde(default)]
    title: Vec<String>,
}

/// Crossref works API client.
pub struct CrossrefClient {
    client: reqwest::Client,
    endpoint: String,
    mailto: Option<String>,
}

impl CrossrefClient {
    pub fn new(config: &MetadataConfig) -> Result<Self, MetadataError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| MetadataError::ClientBuild {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            mailto: config.mailto.clone(),
        })
    }

    /// URL of the works record for `id`.
    pub fn work_url(&self, id: &InputIdentifier) -> String {
        format!("{}/{}", self.endpoint, id.as_str())
    }
}

#[async_trait]
impl MetadataSource for CrossrefClient {
    async fn fetch_title(&self, id: &InputIdentifier) -> Result<Option<String>, MetadataError> {
        let url = self.work_url(id);
        debug!(url = %url, "Requesting Crossref work");

        let mut request = self.client.get(&url);
        if let Some(ref mailto) = self.mailto {
            request = request.query(&[("mailto", mailto.as_str())]);
        }

        let response = request.send().await.map_err(|e| MetadataError::Request {
            message: e.to_string(),
        })?;

        if !response.status().is_success() {
            return Err(MetadataError::Status {
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| MetadataError::Request {
            message: e.to_string(),
        })?;
        parse_crossref_title(&body)
    }
}

/// Extract the first title from a Crossref `/works/{doi}` body.
pub fn parse_crossref_title(body: &str) -> Result<Option<String>, MetadataError> {
    let envelope: CrossrefEnvelope =
        serde_json::from_str(body).map_err(|e| MetadataError::ResponseParse {
            message: e.to_string(),
        })?;
    Ok(envelope.message.title.into_iter().next())
}

/// Resolve `id` to a title, treating every failure as absence.
///
/// Failures are logged; the caller only learns whether a usable title exists.
pub async fn resolve_title(source: &dyn MetadataSource, id: &InputIdentifier) -> Option<String> {
    match source.fetch_title(id).await {
        Ok(Some(title)) if !title.trim().is_empty() => Some(title),
        Ok(_) => {
            debug!(doi = %id, "Metadata record has no title");
            None
        }
        Err(e) => {
            warn!(doi = %id, error = %e, "Error fetching title");
            None
        }
    }
}

/// In-memory metadata source for tests.
#[derive(Default)]
pub struct MockMetadataSource {
    titles: HashMap<String, String>,
    failing: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl MockMetadataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, id: &str, title: &str) -> Self {
        self.titles.insert(id.to_string(), title.to_string());
        self
    }

    /// Make lookups of `id` fail with a transport error.
    pub fn with_failure(mut self, id: &str) -> Self {
        self.failing.insert(id.to_string());
        self
    }

    /// Identifiers looked up so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataSource for MockMetadataSource {
    async fn fetch_title(&self, id: &InputIdentifier) -> Result<Option<String>, MetadataError> {
        self.calls.lock().unwrap().push(id.as_str().to_string());
        if self.failing.contains(id.as_str()) {
            return Err(MetadataError::Request {
                message: "mock transport failure".into(),
            });
        }
        match self.titles.get(id.as_str()) {
            Some(title) => Ok(Some(title.clone())),
            None => Err(MetadataError::Status { status: 404 }),
        }
    }
}
