//! Citation search index: Google Scholar through SerpApi.
//!
//! Response bodies are modelled as optional-field types; nothing upstream is
//! assumed present. [`ScholarIndex`] is the seam between the pipeline and the
//! HTTP client, with [`MockScholarIndex`] standing in for it in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::types::CitationGroupHandle;

/// Top-level search response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub organic_results: Vec<OrganicResult>,
    /// Provider-side message, e.g. "Google hasn't returned any results for this query."
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One organic (non-sponsored) result. Also the raw citing record handed to
/// the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrganicResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub result_id: Option<String>,
    #[serde(default)]
    pub publication_info: Option<PublicationInfo>,
    #[serde(default)]
    pub inline_links: Option<InlineLinks>,
    #[serde(default)]
    pub cited_by: Option<CitedBy>,
}

pub type RawCitingRecord = OrganicResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublicationInfo {
    /// Free text such as "J Smith, A Lee - Journal of Things, 2019 - publisher.com".
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub authors: Option<Vec<Author>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub author_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InlineLinks {
    #[serde(default)]
    pub cited_by: Option<CitedBy>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CitedBy {
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub cites_id: Option<String>,
}

impl CitedBy {
    /// True when the block carries no field at all.
    pub fn is_empty(&self) -> bool {
        self.total.is_none() && self.link.is_none() && self.cites_id.is_none()
    }
}

/// A search index able to find a record by title and list the works citing it.
#[async_trait]
pub trait ScholarIndex: Send + Sync {
    /// Exact-phrase search for `title`.
    async fn search_title(&self, title: &str) -> Result<SearchResponse, SearchError>;

    /// One page of works citing `handle`, starting at offset `start`.
    async fn cited_by_page(
        &self,
        handle: &CitationGroupHandle,
        start: usize,
        num: usize,
    ) -> Result<SearchResponse, SearchError>;
}

/// SerpApi Google Scholar client.
pub struct SerpApiClient {
    client: reqwest::Client,
    config: SearchConfig,
}

impl SerpApiClient {
    pub fn new(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| SearchError::ClientBuild {
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Query parameters for an exact-phrase title search.
    pub fn title_query_params(&self, title: &str) -> Vec<(&'static str, String)> {
        vec![
            ("engine", self.config.engine.clone()),
            ("q", format!("\"{}\"", title)),
            ("api_key", self.config.api_key.clone()),
            ("hl", self.config.language.clone()),
        ]
    }

    /// Query parameters for one page of citing works.
    pub fn cited_by_params(
        &self,
        handle: &CitationGroupHandle,
        start: usize,
        num: usize,
    ) -> Vec<(&'static str, String)> {
        vec![
            ("engine", self.config.engine.clone()),
            ("cites", handle.as_str().to_string()),
            ("api_key", self.config.api_key.clone()),
            ("num", num.to_string()),
            ("start", start.to_string()),
            ("hl", self.config.language.clone()),
            ("as_sdt", self.config.as_sdt.clone()),
        ]
    }

    async fn get(&self, params: &[(&'static str, String)]) -> Result<SearchResponse, SearchError> {
        let response = self
            .client
            .get(&self.config.endpoint)
            .query(params)
            .send()
            .await
            .map_err(|e| SearchError::Request {
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| SearchError::Request {
            message: e.to_string(),
        })?;
        if !status.is_success() {
            return Err(status_error(status.as_u16(), &body));
        }
        parse_search_response(&body)
    }
}

#[async_trait]
impl ScholarIndex for SerpApiClient {
    async fn search_title(&self, title: &str) -> Result<SearchResponse, SearchError> {
        debug!(title = %title, "Searching index by title");
        self.get(&self.title_query_params(title)).await
    }

    async fn cited_by_page(
        &self,
        handle: &CitationGroupHandle,
        start: usize,
        num: usize,
    ) -> Result<SearchResponse, SearchError> {
        self.get(&self.cited_by_params(handle, start, num)).await
    }
}

/// Parse a SerpApi JSON body.
pub fn parse_search_response(body: &str) -> Result<SearchResponse, SearchError> {
    serde_json::from_str(body).map_err(|e| SearchError::ResponseParse {
        message: e.to_string(),
    })
}

/// Error for a non-2xx reply. SerpApi explains rejected keys and exhausted
/// quotas in the body's `error` field; that text is kept when present.
pub fn status_error(status: u16, body: &str) -> SearchError {
    SearchError::Status {
        status,
        message: parse_search_response(body).ok().and_then(|r| r.error),
    }
}

/// A request observed by [`MockScholarIndex`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScholarRequest {
    Title(String),
    CitedBy {
        handle: String,
        start: usize,
        num: usize,
    },
}

/// A scripted cited-by page.
#[derive(Debug, Clone)]
pub enum MockPage {
    Records(Vec<OrganicResult>),
    Failure,
}

/// Scripted reply to a title search.
enum TitleScript {
    Response(SearchResponse),
    Transport,
    Status { status: u16, body: String },
}

/// In-memory search index for tests.
///
/// Cited-by pages are scripted per handle; a page past the end of the script
/// is returned empty.
#[derive(Default)]
pub struct MockScholarIndex {
    titles: HashMap<String, TitleScript>,
    pages: HashMap<String, Vec<MockPage>>,
    requests: Mutex<Vec<ScholarRequest>>,
}

impl MockScholarIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title_response(mut self, title: &str, response: SearchResponse) -> Self {
        self.titles
            .insert(title.to_string(), TitleScript::Response(response));
        self
    }

    /// Title search for `title` returns a single result carrying `cites_id`.
    pub fn with_title_match(self, title: &str, cites_id: &str, total: u64) -> Self {
        let result = OrganicResult {
            title: Some(title.to_string()),
            inline_links: Some(InlineLinks {
                cited_by: Some(CitedBy {
                    total: Some(total),
                    link: None,
                    cites_id: Some(cites_id.to_string()),
                }),
            }),
            ..OrganicResult::default()
        };
        self.with_title_response(
            title,
            SearchResponse {
                organic_results: vec![result],
                error: None,
            },
        )
    }

    pub fn with_title_failure(mut self, title: &str) -> Self {
        self.titles.insert(title.to_string(), TitleScript::Transport);
        self
    }

    /// Title search for `title` is rejected with `status` and raw `body`.
    pub fn with_title_status(mut self, title: &str, status: u16, body: &str) -> Self {
        self.titles.insert(
            title.to_string(),
            TitleScript::Status {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    pub fn with_pages(mut self, handle: &str, pages: Vec<MockPage>) -> Self {
        self.pages.insert(handle.to_string(), pages);
        self
    }

    /// Requests observed so far, in call order.
    pub fn requests(&self) -> Vec<ScholarRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of cited-by page requests observed.
    pub fn page_requests(&self) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| matches!(r, ScholarRequest::CitedBy { .. }))
            .count()
    }
}

#[async_trait]
impl ScholarIndex for MockScholarIndex {
    async fn search_title(&self, title: &str) -> Result<SearchResponse, SearchError> {
        self.requests
            .lock()
            .unwrap()
            .push(ScholarRequest::Title(title.to_string()));
        match self.titles.get(title) {
            Some(TitleScript::Response(response)) => Ok(response.clone()),
            Some(TitleScript::Transport) => Err(SearchError::Request {
                message: "mock transport failure".into(),
            }),
            Some(TitleScript::Status { status, body }) => Err(status_error(*status, body)),
            None => Ok(SearchResponse::default()),
        }
    }

    async fn cited_by_page(
        &self,
        handle: &CitationGroupHandle,
        start: usize,
        num: usize,
    ) -> Result<SearchResponse, SearchError> {
        self.requests.lock().unwrap().push(ScholarRequest::CitedBy {
            handle: handle.as_str().to_string(),
            start,
            num,
        });
        let index = start / num.max(1);
        match self.pages.get(handle.as_str()).and_then(|p| p.get(index)) {
            Some(MockPage::Records(records)) => Ok(SearchResponse {
                organic_results: records.clone(),
                error: None,
            }),
            Some(MockPage::Failure) => Err(SearchError::ResponseParse {
                message: "mock malformed page".into(),
            }),
            None => Ok(SearchResponse::default()),
        }
    }
}

/// `count` distinct citing records labelled `{prefix}-{n}`.
pub fn synthetic_records(prefix: &str, count: usize) -> Vec<OrganicResult> {
    (0..count)
        .map(|n| OrganicResult {
            title: Some(format!("{}-{}", prefix, n)),
            link: Some(format!("https://example.org/{}/{}", prefix, n)),
            result_id: Some(format!("{}{}", prefix, n)),
            publication_info: Some(PublicationInfo {
                summary: Some(format!("A Author - Journal of {}, 2020", prefix)),
                authors: Some(vec![Author {
                    name: Some("A Author".to_string()),
                    ..Author::default()
                }]),
            }),
            ..OrganicResult::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SerpApiClient {
        SerpApiClient::new(&SearchConfig {
            api_key: "k".into(),
            ..SearchConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_title_query_is_exact_phrase() {
        let params = client().title_query_params("Heat waves and health");
        assert!(params.contains(&("q", "\"Heat waves and health\"".to_string())));
        assert!(params.contains(&("engine", "google_scholar".to_string())));
        assert!(params.contains(&("api_key", "k".to_string())));
        assert!(params.contains(&("hl", "en".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "start"));
    }

    #[test]
    fn test_cited_by_params() {
        let params = client().cited_by_params(&CitationGroupHandle::new("C1"), 40, 20);
        assert!(params.contains(&("cites", "C1".to_string())));
        assert!(params.contains(&("num", "20".to_string())));
        assert!(params.contains(&("start", "40".to_string())));
        assert!(params.contains(&("as_sdt", "0,5".to_string())));
    }

    #[test]
    fn test_parse_search_response_full_record() {
        let body = r#"{
            "search_metadata": {"status": "Success"},
            "organic_results": [{
                "position": 0,
                "title": "Flood risk perception",
                "result_id": "abc",
                "link": "https://example.org/paper",
                "publication_info": {
                    "summary": "J Smith, K Lee - Natural Hazards, 2016 - Springer",
                    "authors": [{"name": "J Smith", "author_id": "x1"}, {"name": "K Lee"}]
                },
                "inline_links": {"cited_by": {"total": 42, "link": "https://scholar", "cites_id": "987"}}
            }]
        }"#;
        let response = parse_search_response(body).unwrap();
        assert_eq!(response.organic_results.len(), 1);
        let record = &response.organic_results[0];
        assert_eq!(record.title.as_deref(), Some("Flood risk perception"));
        let cited_by = record
            .inline_links
            .as_ref()
            .and_then(|l| l.cited_by.as_ref())
            .unwrap();
        assert_eq!(cited_by.total, Some(42));
        assert_eq!(cited_by.cites_id.as_deref(), Some("987"));
        let authors = record
            .publication_info
            .as_ref()
            .and_then(|p| p.authors.as_ref())
            .unwrap();
        assert_eq!(authors.len(), 2);
    }

    #[test]
    fn test_parse_search_response_no_results() {
        let body = r#"{"error": "Google hasn't returned any results for this query."}"#;
        let response = parse_search_response(body).unwrap();
        assert!(response.organic_results.is_empty());
        assert!(response.error.unwrap().contains("any results"));
    }

    #[test]
    fn test_parse_search_response_malformed() {
        assert!(matches!(
            parse_search_response("not json"),
            Err(SearchError::ResponseParse { .. })
        ));
    }

    #[test]
    fn test_status_error_keeps_provider_message() {
        let err = status_error(
            401,
            r#"{"error": "Invalid API key. Your API key should be here: https://serpapi.com/manage-api-key"}"#,
        );
        assert!(matches!(err, SearchError::Status { status: 401, message: Some(_) }));
        assert!(err.to_string().contains("status 401: Invalid API key"));

        let err = status_error(429, r#"{"error": "Your account has run out of searches."}"#);
        assert!(err.to_string().ends_with("run out of searches."));
    }

    #[test]
    fn test_status_error_without_json_body() {
        let err = status_error(502, "<html>Bad Gateway</html>");
        assert!(matches!(err, SearchError::Status { status: 502, message: None }));
        assert_eq!(err.to_string(), "Search service returned status 502");
    }

    #[test]
    fn test_cited_by_is_empty() {
        assert!(CitedBy::default().is_empty());
        let block = CitedBy {
            total: Some(1),
            ..CitedBy::default()
        };
        assert!(!block.is_empty());
    }

    #[tokio::test]
    async fn test_mock_pages_past_script_are_empty() {
        let index = MockScholarIndex::new().with_pages(
            "C1",
            vec![MockPage::Records(synthetic_records("p0", 2))],
        );
        let handle = CitationGroupHandle::new("C1");
        assert_eq!(
            index.cited_by_page(&handle, 0, 20).await.unwrap().organic_results.len(),
            2
        );
        assert!(
            index
                .cited_by_page(&handle, 20, 20)
                .await
                .unwrap()
                .organic_results
                .is_empty()
        );
        assert_eq!(index.page_requests(), 2);
    }
}
