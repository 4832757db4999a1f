//! Web search over SerpAPI.
//!
//! Returns the top organic-result snippets joined with newlines. The two
//! soft conditions — no key configured, no results found — are success
//! values with fixed status strings so a workflow execution always has
//! usable web context text.

use crate::error::SearchError;
use serde::Deserialize;
use stackloom_workflow::{CollaboratorError, WebSearch};
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://serpapi.com";

/// Status string returned when no API key is configured.
pub const KEY_NOT_CONFIGURED: &str = "SerpAPI key not configured.";

/// Status string returned when the search produced no snippets.
pub const NO_RESULTS: &str = "No web search results found.";

/// How many organic results contribute snippets.
const SNIPPET_LIMIT: usize = 3;

/// A SerpAPI search client.
#[derive(Debug, Clone)]
pub struct SerpApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl SerpApiClient {
    /// Creates a client with the configured API key, if any.
    #[must_use]
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
        }
    }

    /// Overrides the API base URL (tests, proxies).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Searches for `query` and returns joined snippet text.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] for transport failures or unreadable
    /// responses. Missing-key and empty-result conditions are `Ok` with a
    /// fixed status string.
    pub async fn search_snippets(&self, query: &str) -> Result<String, SearchError> {
        let Some(key) = self.api_key.as_deref() else {
            return Ok(KEY_NOT_CONFIGURED.to_owned());
        };

        let url = format!("{}/search", self.base_url);
        debug!(query, "performing web search");

        let response = self
            .client
            .get(&url)
            .query(&[("q", query), ("api_key", key)])
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::RequestFailed {
                reason: format!("status {status}: {body}"),
            });
        }

        let body: SearchResponse =
            response
                .json()
                .await
                .map_err(|e| SearchError::ResponseParseFailed {
                    reason: e.to_string(),
                })?;

        let snippets = collect_snippets(&body);
        if snippets.is_empty() {
            Ok(NO_RESULTS.to_owned())
        } else {
            Ok(snippets.join("\n"))
        }
    }
}

#[async_trait::async_trait]
impl WebSearch for SerpApiClient {
    async fn search(&self, query: &str) -> Result<String, CollaboratorError> {
        self.search_snippets(query)
            .await
            .map_err(|e| CollaboratorError::new(e.to_string()))
    }
}

fn collect_snippets(response: &SearchResponse) -> Vec<String> {
    response
        .organic_results
        .iter()
        .take(SNIPPET_LIMIT)
        .filter_map(|r| r.snippet.clone())
        .collect()
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic_results: Vec<OrganicResult>,
}

#[derive(Debug, Deserialize)]
struct OrganicResult {
    #[serde(default)]
    snippet: Option<String>,
}
