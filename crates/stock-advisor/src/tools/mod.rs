//! Data tools used by the stage agents

pub mod finance;
pub mod technical;
pub mod web_research;

pub use finance::{DataSections, FinanceTools, MarketDataSource, PriceHistory, StockData};
pub use technical::{TechnicalIndicators, interpret_rsi};
pub use web_research::{NewsSource, WebResearchTool};

#[cfg(test)]
pub use finance::MockMarketDataSource;
#[cfg(test)]
pub use web_research::MockNewsSource;
