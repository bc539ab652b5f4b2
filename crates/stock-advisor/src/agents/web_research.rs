//! News research stage

use advisor_core::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::agents::AnalystAgent;
use crate::api::NewsArticle;
use crate::error::Result;
use crate::tools::NewsSource;

/// Articles found for a ticker and the model's reading of them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebResearch {
    pub news_data: Vec<NewsArticle>,
    pub analysis: String,
}

pub struct WebResearchAgent {
    analyst: AnalystAgent,
    news: Arc<dyn NewsSource>,
    lookback_days: u32,
}

impl WebResearchAgent {
    pub fn new(analyst: AnalystAgent, news: Arc<dyn NewsSource>, lookback_days: u32) -> Self {
        Self {
            analyst,
            news,
            lookback_days,
        }
    }

    pub async fn research_company(&self, symbol: &str, ctx: &mut Context) -> Result<WebResearch> {
        info!(symbol, "running web research");
        let news_data = self.news.search_news(symbol, self.lookback_days).await;

        let prompt = self.analyst.prompts().web_research(symbol, &news_data)?;
        let analysis = self.analyst.generate_response(&prompt, ctx).await;

        Ok(WebResearch {
            news_data,
            analysis,
        })
    }
}
