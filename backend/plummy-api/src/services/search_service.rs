// Search service - "improve this text" answers from the Tavily search API
use std::time::Duration;

use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::config::TavilyConfig;
use crate::error::{AppError, Result};

const MAX_QUERY_CHARS: usize = 260;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchOptions {
    pub topic: &'static str,
    pub search_depth: &'static str,
    pub chunks_per_source: u32,
    pub max_results: u32,
    pub time_range: Option<String>,
    pub days: u32,
    pub include_answer: bool,
    pub include_raw_content: bool,
    pub include_images: bool,
    pub include_image_descriptions: bool,
    pub include_domains: Vec<String>,
    pub exclude_domains: Vec<String>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            topic: "general",
            search_depth: "basic",
            chunks_per_source: 3,
            max_results: 1,
            time_range: None,
            days: 7,
            include_answer: true,
            include_raw_content: false,
            include_images: false,
            include_image_descriptions: false,
            include_domains: Vec::new(),
            exclude_domains: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SearchPayload<'a> {
    query: String,
    #[serde(flatten)]
    options: &'a SearchOptions,
}

#[derive(Debug, Deserialize)]
struct RawSearchResponse {
    #[serde(default)]
    answer: Option<String>,
    #[serde(default, alias = "results")]
    sources: Vec<RawSource>,
}

#[derive(Debug, Deserialize)]
struct RawSource {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default, alias = "content")]
    snippet: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchSource {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchResult {
    pub answer: String,
    pub sources: Vec<SearchSource>,
}

impl From<RawSearchResponse> for SearchResult {
    fn from(raw: RawSearchResponse) -> Self {
        Self {
            answer: raw.answer.unwrap_or_default(),
            sources: raw
                .sources
                .into_iter()
                .map(|s| SearchSource {
                    title: s.title,
                    url: s.url,
                    snippet: s.snippet,
                })
                .collect(),
        }
    }
}

/// Wraps the user's text in the rewrite instruction, truncating long input.
pub fn improvement_prompt(text: &str) -> String {
    let text = text.trim();
    let clipped = match text.char_indices().nth(MAX_QUERY_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    };
    format!(
        "Improve this text by fixing grammar, spelling, punctuation, and enhancing clarity while preserving the original meaning: '{}'",
        clipped
    )
}

#[derive(Clone)]
pub struct SearchClient {
    http: HttpClient,
    config: TavilyConfig,
    options: SearchOptions,
}

impl SearchClient {
    pub fn new(config: TavilyConfig, timeout_secs: u64) -> anyhow::Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            config,
            options: SearchOptions::default(),
        })
    }

    pub async fn improve(&self, text: &str) -> Result<SearchResult> {
        let payload = SearchPayload {
            query: improvement_prompt(text),
            options: &self.options,
        };
        let url = format!("{}/search", self.config.base_url.trim_end_matches('/'));

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Search request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("Search API returned {}: {}", status, body)));
        }

        let raw: RawSearchResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Search response was not understood: {}", e)))?;

        Ok(raw.into())
    }
}
