//! YouTube Data API v3 search provider.
//!
//! Issues `GET {base}/youtube/v3/search?part=id&q=..&maxResults=..&key=..`
//! and maps each `items[].id` to a [`SearchHit`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use url::Url;

use super::{ResultKind, SearchError, SearchHit, SearchPage, SearchProvider};
use crate::ItemId;

/// Default API base URL.
pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com";

const SEARCH_PATH: &str = "youtube/v3/search";
const CONNECT_TIMEOUT_SECS: u64 = 10;
const READ_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct SearchListResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    id: ResourceId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResourceId {
    kind: String,
    video_id: Option<String>,
    channel_id: Option<String>,
    playlist_id: Option<String>,
}

impl ResourceId {
    fn into_hit(self) -> SearchHit {
        let kind = ResultKind::from_label(&self.kind);
        let id = match kind {
            ResultKind::Video => self.video_id,
            ResultKind::Channel => self.channel_id,
            ResultKind::Playlist => self.playlist_id,
            ResultKind::Other(_) => None,
        };
        SearchHit::new(kind, id.map(ItemId::from))
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Search provider backed by the YouTube Data API.
#[derive(Debug, Clone)]
pub struct YouTubeSearch {
    client: Client,
    base_url: String,
    api_key: String,
}

impl YouTubeSearch {
    /// Creates a provider against the public API.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the key is empty or the HTTP client
    /// cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, SearchError> {
        Self::with_base_url(api_key, DEFAULT_API_BASE)
    }

    /// Creates a provider against a custom base URL (used by tests).
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the key is empty or the HTTP client
    /// cannot be built.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, SearchError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(SearchError::config("API key is empty"));
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(READ_TIMEOUT_SECS))
            .user_agent(concat!("tubefetch/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .build()
            .map_err(|e| SearchError::config(format!("HTTP client construction failed: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    fn search_url(&self, query: &str, page: &SearchPage) -> Result<Url, SearchError> {
        let raw = format!("{}/{SEARCH_PATH}", self.base_url);
        let mut url = Url::parse(&raw)
            .map_err(|e| SearchError::config(format!("invalid API base URL {raw}: {e}")))?;
        url.query_pairs_mut()
            .append_pair("part", "id")
            .append_pair("q", query)
            .append_pair("maxResults", &page.max_results.to_string())
            .append_pair("key", &self.api_key);
        Ok(url)
    }
}

#[async_trait]
impl SearchProvider for YouTubeSearch {
    fn name(&self) -> &str {
        "youtube"
    }

    #[instrument(skip(self, page), fields(provider = "youtube", max_results = page.max_results))]
    async fn search(&self, query: &str, page: &SearchPage) -> Result<Vec<SearchHit>, SearchError> {
        let url = self.search_url(query, page)?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SearchError::network(query, e))?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ApiErrorBody>().await {
                Ok(body) => body.error.message,
                Err(_) => status
                    .canonical_reason()
                    .unwrap_or("unknown error")
                    .to_string(),
            };
            return Err(SearchError::api(query, status.as_u16(), message));
        }

        let body = response
            .json::<SearchListResponse>()
            .await
            .map_err(|e| SearchError::Decode {
                query: query.to_string(),
                source: e,
            })?;

        let hits: Vec<SearchHit> = body
            .items
            .into_iter()
            .skip(page.skip_first)
            .map(|item| item.id.into_hit())
            .collect();

        debug!(hits = hits.len(), "search returned");
        Ok(hits)
    }
}
