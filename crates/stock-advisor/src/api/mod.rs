//! Clients for the market data and news providers

pub mod news_api;
pub mod yahoo;
pub mod yahoo_pages;

pub use news_api::{ArticleSource, NewsApiClient, NewsArticle};
pub use yahoo::{Quote, YahooFinanceClient};
pub use yahoo_pages::{CompanyInfo, FieldMap, YahooPageClient};

use crate::error::{AdvisorError, Result};
use chrono::{DateTime, TimeDelta, Utc};

/// Start of a window reaching `days` back from `end`
pub(crate) fn days_before(end: DateTime<Utc>, days: u32) -> Result<DateTime<Utc>> {
    TimeDelta::try_days(i64::from(days))
        .and_then(|delta| end.checked_sub_signed(delta))
        .ok_or_else(|| AdvisorError::ConfigError(format!("lookback of {days} days is out of range")))
}
