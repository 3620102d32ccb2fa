use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, warn};

use crate::error::SearchError;

pub const SEARCH_ENDPOINT: &str = "https://api.github.com/search/code";

/// Results per page. GitHub's maximum.
pub const PER_PAGE: u32 = 100;

/// One decoded page of the code search API. Fields not listed are ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub items: Vec<SearchItem>,
}

/// A file in the remote corpus that matched the query.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchItem {
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub text_matches: Vec<TextMatch>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TextMatch {
    #[serde(default)]
    pub fragment: String,
}

/// Quota information GitHub attaches to every response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimit {
    pub limit: Option<u32>,
    pub remaining: u32,
    pub reset: Option<DateTime<Utc>>,
}

impl RateLimit {
    /// Reads `X-RateLimit-*` headers. `None` when `X-RateLimit-Remaining` is missing.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        fn number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
            headers.get(name)?.to_str().ok()?.trim().parse().ok()
        }

        let remaining = number::<u32>(headers, "X-RateLimit-Remaining")?;
        let limit = number::<u32>(headers, "X-RateLimit-Limit");
        let reset = number::<i64>(headers, "X-RateLimit-Reset")
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0));

        Some(RateLimit {
            limit,
            remaining,
            reset,
        })
    }
}

impl fmt::Display for RateLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.limit {
            Some(limit) => write!(f, "rate limit {}/{}", self.remaining, limit)?,
            None => write!(f, "rate limit remaining {}", self.remaining)?,
        }
        if let Some(reset) = self.reset {
            write!(f, ", resets at {}", reset.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }
        Ok(())
    }
}

/// Thin wrapper over the GitHub code search endpoint.
pub struct SearchClient {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl SearchClient {
    /// Create a client for the public GitHub API.
    pub fn new(token: Option<String>) -> Result<Self, SearchError> {
        Self::with_endpoint(SEARCH_ENDPOINT, token)
    }

    /// Create a client against another search endpoint, e.g. a mock server.
    pub fn with_endpoint(endpoint: &str, token: Option<String>) -> Result<Self, SearchError> {
        // GitHub rejects requests without a User-Agent
        let client = Client::builder()
            .user_agent(concat!("github-code-extractor/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(SearchClient {
            client,
            endpoint: endpoint.to_string(),
            token: token.filter(|t| !t.trim().is_empty()),
        })
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    /// Fetch a single page of results for `query`.
    pub async fn search_page(&self, query: &str, page: u32) -> Result<SearchResponse, SearchError> {
        debug!(
            "Requesting {}?q={}&page={}&per_page={}",
            self.endpoint, query, page, PER_PAGE
        );

        let mut request = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", query.to_string()),
                ("page", page.to_string()),
                ("per_page", PER_PAGE.to_string()),
            ])
            .header("Accept", "application/vnd.github.v3.text-match+json")
            .header("X-GitHub-Api-Version", "2022-11-28");

        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status();
        let rate_limit = RateLimit::from_headers(response.headers());

        if let Some(limit) = &rate_limit {
            debug!("{}", limit);
            if limit.remaining == 0 {
                warn!("Search quota exhausted ({})", limit);
            }
        }

        let body = response.text().await?;

        if status != StatusCode::OK {
            return Err(SearchError::Status {
                status,
                body,
                rate_limit,
            });
        }

        Ok(serde_json::from_str(&body)?)
    }
}
