//! Analysis pipeline agents
//!
//! [`StockAdvisorAgent`] runs the three data stages in a fixed order and then
//! asks the model to synthesize them. Each stage fetches its own data, renders
//! its prompt and calls the model once through an [`AnalystAgent`].

pub mod advisor;
pub mod analyst;
pub mod financial;
pub mod technical;
pub mod web_research;

pub use advisor::{Recommendation, StockAdvisorAgent};
pub use analyst::AnalystAgent;
pub use financial::{FinancialAnalysis, FinancialData, FinancialDataAgent};
pub use technical::{TechnicalAnalysis, TechnicalAnalysisAgent};
pub use web_research::{WebResearch, WebResearchAgent};
