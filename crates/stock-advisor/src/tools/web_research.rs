//! News research for a ticker

use crate::api::{NewsApiClient, NewsArticle, YahooPageClient};
use crate::config::AdvisorConfig;
use crate::error::Result;
use async_trait::async_trait;
use tracing::{info, warn};

/// Source of recent news articles
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Articles about `query` from the last `days` days; empty on any failure
    async fn search_news(&self, query: &str, days: u32) -> Vec<NewsArticle>;
}

/// Resolves a ticker to its company name and searches NewsAPI for it
#[derive(Clone)]
pub struct WebResearchTool {
    pages: YahooPageClient,
    news: Option<NewsApiClient>,
}

impl WebResearchTool {
    pub fn new(pages: YahooPageClient, news: Option<NewsApiClient>) -> Self {
        Self { pages, news }
    }

    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        Ok(Self::new(
            YahooPageClient::from_config(config)?,
            NewsApiClient::from_config(config)?,
        ))
    }

    pub fn pages(&self) -> &YahooPageClient {
        &self.pages
    }
}

#[async_trait]
impl NewsSource for WebResearchTool {
    async fn search_news(&self, query: &str, days: u32) -> Vec<NewsArticle> {
        let Some(news) = &self.news else {
            warn!(query, "NEWS_API_KEY not set, skipping news search");
            return Vec::new();
        };

        let company = self.pages.company_name(query).await;
        match news.everything(&company, days).await {
            Ok(articles) => {
                info!(query, company = %company, count = articles.len(), "fetched news");
                articles
            }
            Err(e) => {
                warn!(query, error = %e, "error fetching news");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn offline_pages() -> YahooPageClient {
        YahooPageClient::new("Mozilla/5.0", Duration::from_millis(200), 50)
            .unwrap()
            .with_base_url("http://127.0.0.1:9")
    }

    #[tokio::test]
    async fn test_missing_key_returns_empty() {
        let tool = WebResearchTool::new(offline_pages(), None);
        assert!(tool.search_news("AAPL", 7).await.is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_returns_empty() {
        let news = NewsApiClient::new("key", Duration::from_millis(200), 30)
            .unwrap()
            .with_base_url("http://127.0.0.1:9/v2");
        let tool = WebResearchTool::new(offline_pages(), Some(news));
        assert!(tool.search_news("AAPL", 7).await.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_window_returns_empty() {
        let news = NewsApiClient::new("key", Duration::from_millis(200), 30)
            .unwrap()
            .with_base_url("http://127.0.0.1:9/v2");
        let tool = WebResearchTool::new(offline_pages(), Some(news));
        assert!(tool.search_news("AAPL", u32::MAX).await.is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires network access and NEWS_API_KEY
    async fn test_live_search() {
        let config = AdvisorConfig::default().with_env_keys();
        let tool = WebResearchTool::from_config(&config).unwrap();
        assert!(!tool.search_news("AAPL", 7).await.is_empty());
    }
}
