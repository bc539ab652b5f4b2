//! Yahoo Finance chart API client

use crate::api::days_before;
use crate::error::{AdvisorError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;
use yahoo_finance_api as yahoo;

/// Yahoo Finance chart API client
#[derive(Debug, Clone, Default)]
pub struct YahooFinanceClient {}

/// One daily bar
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub symbol: String,
    pub timestamp: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
    pub adjclose: f64,
}

fn yahoo_err(e: impl std::fmt::Display) -> AdvisorError {
    AdvisorError::YahooFinanceError(e.to_string())
}

impl Quote {
    fn from_yahoo(symbol: &str, q: &yahoo::Quote) -> Self {
        Self {
            symbol: symbol.to_string(),
            timestamp: DateTime::from_timestamp(q.timestamp as i64, 0).unwrap_or_else(Utc::now),
            open: q.open,
            high: q.high,
            low: q.low,
            close: q.close,
            volume: q.volume,
            adjclose: q.adjclose,
        }
    }
}

impl YahooFinanceClient {
    pub fn new() -> Self {
        Self {}
    }

    /// Latest quote for a symbol
    pub async fn get_quote(&self, symbol: &str) -> Result<Quote> {
        debug!(symbol, "fetching latest quote");
        let provider = yahoo::YahooConnector::new().map_err(yahoo_err)?;

        let response = provider
            .get_latest_quotes(symbol, "1d")
            .await
            .map_err(yahoo_err)?;
        let quote = response.last_quote().map_err(yahoo_err)?;

        Ok(Quote::from_yahoo(symbol, &quote))
    }

    /// Daily quotes between two instants
    pub async fn get_historical_quotes(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Quote>> {
        debug!(symbol, %start, %end, "fetching quote history");
        let provider = yahoo::YahooConnector::new().map_err(yahoo_err)?;

        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| yahoo_err(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| yahoo_err(format!("Invalid end timestamp: {e}")))?;

        let response = provider
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(yahoo_err)?;
        let quotes = response.quotes().map_err(yahoo_err)?;

        Ok(quotes.iter().map(|q| Quote::from_yahoo(symbol, q)).collect())
    }

    /// Daily quotes for the last `days` days
    pub async fn get_history(&self, symbol: &str, days: u32) -> Result<Vec<Quote>> {
        let end = Utc::now();
        let start = days_before(end, days)?;
        self.get_historical_quotes(symbol, start, end).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_history_rejects_huge_window() {
        let err = YahooFinanceClient::new()
            .get_history("AAPL", u32::MAX)
            .await
            .unwrap_err();
        assert!(matches!(err, AdvisorError::ConfigError(_)));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_get_quote() {
        let client = YahooFinanceClient::new();
        let quote = client.get_quote("AAPL").await.unwrap();
        assert_eq!(quote.symbol, "AAPL");
        assert!(quote.close > 0.0);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_get_history() {
        let client = YahooFinanceClient::new();
        let quotes = client.get_history("MSFT", 30).await.unwrap();
        assert!(!quotes.is_empty());
        assert!(quotes.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }
}
