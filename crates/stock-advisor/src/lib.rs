//! AI stock advisor
//!
//! Gathers news, fundamentals and technical indicators for a ticker and runs
//! them through a fixed sequence of Gemini prompts:
//!
//! 1. Market research over recent NewsAPI articles
//! 2. Financial analysis over Yahoo Finance quote, profile and statement pages
//! 3. Technical analysis over RSI and MACD computed from daily closes
//! 4. A final recommendation that synthesizes the three
//!
//! Every stage shares one [`InstructionSet`], which is prepended to each prompt.
//! Data failures degrade to empty sections and model failures to empty text, so
//! a run always produces a [`Recommendation`].
//!
//! # Example
//!
//! ```rust,ignore
//! use stock_advisor::{AdvisorConfig, InstructionSet, StockAdvisorAgent};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = AdvisorConfig::builder().with_env_keys().build()?;
//!     let advisor = StockAdvisorAgent::from_config(&config, InstructionSet::default())?;
//!
//!     let rec = advisor.generate_recommendation("AAPL").await?;
//!     println!("{}", stock_advisor::report::markdown(&rec));
//!     Ok(())
//! }
//! ```

pub mod agents;
pub mod api;
pub mod bot;
pub mod config;
pub mod error;
pub mod instructions;
pub mod prompts;
pub mod report;
pub mod tools;

pub use agents::{Recommendation, StockAdvisorAgent};
pub use config::{AdvisorConfig, AgentConfig};
pub use error::{AdvisorError, Result};
pub use instructions::InstructionSet;
pub use tools::{DataSections, FinanceTools, StockData, TechnicalIndicators, WebResearchTool};
