//! NewsAPI.org client

use crate::api::days_before;
use crate::config::AdvisorConfig;
use crate::error::{AdvisorError, Result};
use chrono::{NaiveDate, Utc};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::debug;
use url::Url;

type SharedRateLimiter = Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock>>;

pub const NEWS_API_BASE: &str = "https://newsapi.org/v2";

/// Publisher of an article
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleSource {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Article as returned by `/v2/everything`, keys unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    #[serde(default)]
    pub source: ArticleSource,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub url_to_image: Option<String>,
    pub published_at: Option<String>,
    pub content: Option<String>,
}

/// Raw response envelope; `status` is "ok" or "error"
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsArticle>,
}

/// Client for the NewsAPI `everything` endpoint
#[derive(Clone)]
pub struct NewsApiClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: SharedRateLimiter,
}

impl NewsApiClient {
    /// Create a client allowing `requests_per_minute` calls
    pub fn new(
        api_key: impl Into<String>,
        timeout: std::time::Duration,
        requests_per_minute: u32,
    ) -> Result<Self> {
        let quota =
            Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key: api_key.into(),
            base_url: NEWS_API_BASE.to_string(),
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
        })
    }

    /// Build from configuration; `None` when no NewsAPI key is set
    pub fn from_config(config: &AdvisorConfig) -> Result<Option<Self>> {
        match config.news_api_key.as_deref().filter(|k| !k.is_empty()) {
            Some(key) => Ok(Some(Self::new(
                key,
                config.request_timeout,
                config.news_requests_per_minute,
            )?)),
            None => Ok(None),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn everything_url(&self, query: &str, from: NaiveDate) -> Result<Url> {
        let endpoint = format!("{}/everything", self.base_url);
        let from = from.format("%Y-%m-%d").to_string();
        Url::parse_with_params(
            &endpoint,
            &[
                ("q", query),
                ("from", from.as_str()),
                ("language", "en"),
                ("sortBy", "relevancy"),
                ("apiKey", self.api_key.as_str()),
            ],
        )
        .map_err(|e| AdvisorError::ConfigError(format!("invalid NewsAPI url: {e}")))
    }

    /// English articles matching `query` published in the last `days` days
    pub async fn everything(&self, query: &str, days: u32) -> Result<Vec<NewsArticle>> {
        let from = days_before(Utc::now(), days)?.date_naive();
        let url = self.everything_url(query, from)?;

        self.rate_limiter.until_ready().await;
        debug!(query, %from, "searching NewsAPI");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        match serde_json::from_str::<EverythingResponse>(&body) {
            Ok(parsed) => parse_envelope(parsed),
            Err(_) if !status.is_success() => Err(AdvisorError::NewsApiError {
                code: status.as_u16().to_string(),
                message: body,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

fn parse_envelope(response: EverythingResponse) -> Result<Vec<NewsArticle>> {
    if response.status == "error" {
        return Err(AdvisorError::NewsApiError {
            code: response.code.unwrap_or_else(|| "unknown".to_string()),
            message: response.message.unwrap_or_default(),
        });
    }
    Ok(response.articles)
}
