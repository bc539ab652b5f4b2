//! Market data aggregation
//!
//! [`FinanceTools`] gathers the sections a stage asks for into one [`StockData`]
//! record. Each section is fetched independently; a failing section is logged and
//! left out so the rest of the record still reaches the model.

use crate::api::{CompanyInfo, FieldMap, Quote, YahooFinanceClient, YahooPageClient};
use crate::config::AdvisorConfig;
use crate::error::Result;
use crate::tools::technical::{TechnicalIndicators, fallback_closes};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Which parts of [`StockData`] to fetch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSections {
    pub stock_price: bool,
    pub company_info: bool,
    pub analyst_recommendations: bool,
    pub income_statements: bool,
    pub key_financial_ratios: bool,
    pub stock_fundamentals: bool,
    pub technical_indicators: bool,
    pub historical_prices: bool,
}

impl DataSections {
    pub fn all() -> Self {
        Self {
            stock_price: true,
            company_info: true,
            analyst_recommendations: true,
            income_statements: true,
            key_financial_ratios: true,
            stock_fundamentals: true,
            technical_indicators: true,
            historical_prices: true,
        }
    }

    /// Sections read by the financial stage
    pub fn financial() -> Self {
        Self {
            stock_price: true,
            company_info: true,
            analyst_recommendations: true,
            income_statements: true,
            key_financial_ratios: true,
            stock_fundamentals: true,
            ..Self::default()
        }
    }

    /// Sections read by the technical stage
    pub fn technical() -> Self {
        Self {
            technical_indicators: true,
            historical_prices: true,
            ..Self::default()
        }
    }

    fn needs_history(&self) -> bool {
        self.technical_indicators || self.historical_prices
    }
}

/// Summary of the daily price history behind the indicators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    pub days: usize,
    pub first_close: f64,
    pub last_close: f64,
    pub period_high: f64,
    pub period_low: f64,
    pub change_percent: f64,
    /// Set when the provider returned nothing and the flat fallback was used
    pub synthetic: bool,
}

impl PriceHistory {
    pub fn from_closes(closes: &[f64], synthetic: bool) -> Option<Self> {
        let first = *closes.first()?;
        let last = *closes.last()?;
        let high = closes.iter().copied().fold(f64::MIN, f64::max);
        let low = closes.iter().copied().fold(f64::MAX, f64::min);
        let change_percent = if first != 0.0 {
            (last - first) / first * 100.0
        } else {
            0.0
        };

        Some(Self {
            days: closes.len(),
            first_close: first,
            last_close: last,
            period_high: high,
            period_low: low,
            change_percent,
            synthetic,
        })
    }
}

/// Fixed-key stock record; absent keys were not requested or failed
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_info: Option<CompanyInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<BTreeMap<String, i64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financials: Option<BTreeMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technical: Option<TechnicalIndicators>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_history: Option<PriceHistory>,
}

impl StockData {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Source of market data for the stage agents
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch the requested sections; never fails as a whole
    async fn stock_data(&self, symbol: &str, sections: DataSections) -> StockData;

    /// Quote statistics from the summary page
    async fn fundamentals(&self, symbol: &str) -> Result<FieldMap>;

    /// Key statistics table rows
    async fn key_ratios(&self, symbol: &str) -> Result<FieldMap>;
}

/// Yahoo-backed [`MarketDataSource`]
#[derive(Clone)]
pub struct FinanceTools {
    chart: YahooFinanceClient,
    pages: YahooPageClient,
    history_days: u32,
}

impl FinanceTools {
    pub fn new(chart: YahooFinanceClient, pages: YahooPageClient, history_days: u32) -> Self {
        Self {
            chart,
            pages,
            history_days,
        }
    }

    pub fn from_config(config: &AdvisorConfig) -> Result<Self> {
        Ok(Self::new(
            YahooFinanceClient::new(),
            YahooPageClient::from_config(config)?,
            config.history_days,
        ))
    }

    pub fn pages(&self) -> &YahooPageClient {
        &self.pages
    }

    /// Latest close from the chart API, else the price on the quote page
    async fn current_price(&self, symbol: &str) -> Result<f64> {
        match self.chart.get_quote(symbol).await {
            Ok(quote) => Ok(quote.close),
            Err(e) => {
                debug!(symbol, error = %e, "chart quote failed, reading quote page");
                self.pages.current_price(symbol).await
            }
        }
    }

    /// Daily closes, oldest first, and whether they are the synthetic fallback
    async fn closes(&self, symbol: &str) -> (Vec<f64>, bool) {
        match self.chart.get_history(symbol, self.history_days).await {
            Ok(quotes) if !quotes.is_empty() => (closes_of(&quotes), false),
            Ok(_) => {
                warn!(symbol, "no price history returned, using flat fallback series");
                (fallback_closes(), true)
            }
            Err(e) => {
                warn!(symbol, error = %e, "price history unavailable, using flat fallback series");
                (fallback_closes(), true)
            }
        }
    }
}

fn closes_of(quotes: &[Quote]) -> Vec<f64> {
    let mut sorted: Vec<&Quote> = quotes.iter().collect();
    sorted.sort_by_key(|q| q.timestamp);
    sorted.into_iter().map(|q| q.close).collect()
}

/// Log a failed section and drop it
fn section<T>(symbol: &str, name: &str, result: Result<T>) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(symbol, section = name, error = %e, "stock data section unavailable");
            None
        }
    }
}

#[async_trait]
impl MarketDataSource for FinanceTools {
    async fn stock_data(&self, symbol: &str, sections: DataSections) -> StockData {
        let mut data = StockData::default();

        if sections.stock_price {
            data.current_price = section(symbol, "current_price", self.current_price(symbol).await);
        }
        if sections.company_info {
            data.company_info = Some(self.pages.company_info(symbol).await);
        }
        if sections.analyst_recommendations {
            data.recommendations = section(
                symbol,
                "recommendations",
                self.pages.analyst_recommendations(symbol).await,
            );
        }
        if sections.income_statements {
            data.financials = section(
                symbol,
                "financials",
                self.pages.income_statement(symbol).await,
            );
        }
        if sections.needs_history() {
            let (closes, synthetic) = self.closes(symbol).await;
            if sections.technical_indicators {
                data.technical = Some(TechnicalIndicators::from_closes(&closes));
            }
            if sections.historical_prices {
                data.price_history = PriceHistory::from_closes(&closes, synthetic);
            }
        }

        data
    }

    async fn fundamentals(&self, symbol: &str) -> Result<FieldMap> {
        self.pages.fundamentals(symbol).await
    }

    async fn key_ratios(&self, symbol: &str) -> Result<FieldMap> {
        self.pages.key_ratios(symbol).await
    }
}
