//! Financial data stage

use advisor_core::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::agents::AnalystAgent;
use crate::api::FieldMap;
use crate::error::Result;
use crate::tools::{DataSections, MarketDataSource, StockData};

/// Stock data merged with the fundamentals and key ratios tables
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialData {
    #[serde(flatten)]
    pub stock: StockData,
    pub fundamentals: FieldMap,
    pub key_ratios: FieldMap,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialAnalysis {
    pub financial_data: FinancialData,
    pub fundamentals: FieldMap,
    pub key_ratios: FieldMap,
    pub analysis: String,
}

fn or_empty(symbol: &str, table: &str, result: Result<FieldMap>) -> FieldMap {
    result.unwrap_or_else(|e| {
        warn!(symbol, table, error = %e, "financial table unavailable");
        FieldMap::new()
    })
}

pub struct FinancialDataAgent {
    analyst: AnalystAgent,
    market: Arc<dyn MarketDataSource>,
    sections: DataSections,
}

impl FinancialDataAgent {
    pub fn new(analyst: AnalystAgent, market: Arc<dyn MarketDataSource>) -> Self {
        Self {
            analyst,
            market,
            sections: DataSections::financial(),
        }
    }

    pub async fn analyze_financials(&self, symbol: &str, ctx: &mut Context) -> Result<FinancialAnalysis> {
        info!(symbol, "running financial analysis");
        let stock = self.market.stock_data(symbol, self.sections).await;

        let fundamentals = if self.sections.stock_fundamentals {
            or_empty(symbol, "fundamentals", self.market.fundamentals(symbol).await)
        } else {
            FieldMap::new()
        };
        let key_ratios = if self.sections.key_financial_ratios {
            or_empty(symbol, "key_ratios", self.market.key_ratios(symbol).await)
        } else {
            FieldMap::new()
        };

        let financial_data = FinancialData {
            stock,
            fundamentals: fundamentals.clone(),
            key_ratios: key_ratios.clone(),
        };

        let prompt = self
            .analyst
            .prompts()
            .financial(symbol, &financial_data, &fundamentals, &key_ratios)?;
        let analysis = self.analyst.generate_response(&prompt, ctx).await;

        Ok(FinancialAnalysis {
            financial_data,
            fundamentals,
            key_ratios,
            analysis,
        })
    }
}
