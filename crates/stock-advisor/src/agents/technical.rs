//! Technical analysis stage

use advisor_core::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::agents::AnalystAgent;
use crate::error::Result;
use crate::tools::{DataSections, MarketDataSource, StockData};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalAnalysis {
    pub technical_data: StockData,
    pub analysis: String,
}

pub struct TechnicalAnalysisAgent {
    analyst: AnalystAgent,
    market: Arc<dyn MarketDataSource>,
}

impl TechnicalAnalysisAgent {
    pub fn new(analyst: AnalystAgent, market: Arc<dyn MarketDataSource>) -> Self {
        Self { analyst, market }
    }

    pub async fn analyze_technicals(&self, symbol: &str, ctx: &mut Context) -> Result<TechnicalAnalysis> {
        info!(symbol, "running technical analysis");
        let technical_data = self.market.stock_data(symbol, DataSections::technical()).await;

        let prompt = self.analyst.prompts().technical(symbol, &technical_data)?;
        let analysis = self.analyst.generate_response(&prompt, ctx).await;

        Ok(TechnicalAnalysis {
            technical_data,
            analysis,
        })
    }
}
