//! Stock advisor pipeline

use advisor_core::{Agent, Context};
use advisor_llm::providers::{GeminiConfig, GeminiProvider};
use advisor_llm::{LLMProvider, TokenUsage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::agents::{
    AnalystAgent, FinancialAnalysis, FinancialDataAgent, TechnicalAnalysis,
    TechnicalAnalysisAgent, WebResearch, WebResearchAgent,
};
use crate::api::{NewsApiClient, YahooFinanceClient, YahooPageClient};
use crate::config::{AdvisorConfig, AgentConfig};
use crate::error::{AdvisorError, Result};
use crate::instructions::InstructionSet;
use crate::prompts::Prompts;
use crate::tools::{FinanceTools, MarketDataSource, NewsSource, WebResearchTool};

/// Output of one advisor run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub symbol: String,
    pub model: String,
    pub web_research: WebResearch,
    pub financials: FinancialAnalysis,
    pub technicals: TechnicalAnalysis,
    pub recommendation: String,
    pub usage: TokenUsage,
    pub generated_at: DateTime<Utc>,
}

/// Trim and upper-case a ticker, rejecting blanks
pub fn normalize_symbol(symbol: &str) -> Result<String> {
    let symbol = symbol.trim().to_uppercase();
    if symbol.is_empty() {
        return Err(AdvisorError::InvalidSymbol(
            "symbol must not be empty".to_string(),
        ));
    }
    Ok(symbol)
}

struct Stages {
    web_research: WebResearchAgent,
    financial: FinancialDataAgent,
    technical: TechnicalAnalysisAgent,
    synthesis: AnalystAgent,
}

/// Coordinates the research, financial and technical stages
pub struct StockAdvisorAgent {
    provider: Arc<dyn LLMProvider>,
    config: AgentConfig,
    instructions: InstructionSet,
    prompts: Arc<Prompts>,
    news: Arc<dyn NewsSource>,
    market: Arc<dyn MarketDataSource>,
    news_lookback_days: u32,
    stages: Stages,
}

impl StockAdvisorAgent {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        config: AgentConfig,
        instructions: InstructionSet,
        news: Arc<dyn NewsSource>,
        market: Arc<dyn MarketDataSource>,
        news_lookback_days: u32,
    ) -> Result<Self> {
        let prompts = Arc::new(Prompts::new()?);
        let stages = build_stages(
            &provider,
            &config,
            &instructions,
            &prompts,
            &news,
            &market,
            news_lookback_days,
        );

        Ok(Self {
            provider,
            config,
            instructions,
            prompts,
            news,
            market,
            news_lookback_days,
            stages,
        })
    }

    /// Wire up Gemini and the Yahoo and NewsAPI clients
    ///
    /// Fails before any network call when `GOOGLE_API_KEY` is missing.
    pub fn from_config(config: &AdvisorConfig, instructions: InstructionSet) -> Result<Self> {
        config.validate()?;
        let api_key = config.require_google_api_key()?;

        let provider: Arc<dyn LLMProvider> =
            Arc::new(GeminiProvider::with_config(gemini_config(config, api_key))?);
        let (news, market) = data_sources(config)?;

        Self::new(
            provider,
            config.agent.clone(),
            instructions,
            Arc::new(news),
            Arc::new(market),
            config.news_lookback_days,
        )
    }

    pub fn instructions(&self) -> &InstructionSet {
        &self.instructions
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Replace the instructions and rebuild every stage with them
    pub fn set_instructions(&mut self, instructions: InstructionSet) {
        self.instructions = instructions;
        self.stages = build_stages(
            &self.provider,
            &self.config,
            &self.instructions,
            &self.prompts,
            &self.news,
            &self.market,
            self.news_lookback_days,
        );
    }

    /// Run every stage for `symbol` and synthesize a recommendation
    pub async fn generate_recommendation(&self, symbol: &str) -> Result<Recommendation> {
        let symbol = normalize_symbol(symbol)?;
        let mut ctx = Context::new().with_symbol(symbol.as_str());
        self.run(&symbol, &mut ctx).await
    }

    async fn run(&self, symbol: &str, ctx: &mut Context) -> Result<Recommendation> {
        info!(symbol, model = %self.config.model_name, "generating recommendation");

        let web_research = self.stages.web_research.research_company(symbol, ctx).await?;
        let financials = self.stages.financial.analyze_financials(symbol, ctx).await?;
        let technicals = self.stages.technical.analyze_technicals(symbol, ctx).await?;

        let prompt = self
            .prompts
            .recommendation(symbol, &web_research, &financials, &technicals)?;
        let recommendation = self.stages.synthesis.generate_response(&prompt, ctx).await;

        let (input_tokens, output_tokens) = ctx.token_totals();
        info!(
            symbol,
            model_calls = ctx.model_calls(),
            input_tokens,
            output_tokens,
            "recommendation ready"
        );

        Ok(Recommendation {
            symbol: symbol.to_string(),
            model: self.config.model_name.clone(),
            web_research,
            financials,
            technicals,
            recommendation,
            usage: TokenUsage {
                input_tokens,
                output_tokens,
            },
            generated_at: Utc::now(),
        })
    }
}

fn gemini_config(config: &AdvisorConfig, api_key: &str) -> GeminiConfig {
    let gemini = GeminiConfig::new(api_key).with_timeout(config.model_timeout.as_secs().max(1));
    match &config.gemini_api_base {
        Some(base) => gemini.with_api_base(base.clone()),
        None => gemini,
    }
}

/// News and market tools sharing one Yahoo page client and its rate limiter
fn data_sources(config: &AdvisorConfig) -> Result<(WebResearchTool, FinanceTools)> {
    let pages = YahooPageClient::from_config(config)?;
    let news = WebResearchTool::new(pages.clone(), NewsApiClient::from_config(config)?);
    let market = FinanceTools::new(YahooFinanceClient::new(), pages, config.history_days);
    Ok((news, market))
}

fn build_stages(
    provider: &Arc<dyn LLMProvider>,
    config: &AgentConfig,
    instructions: &InstructionSet,
    prompts: &Arc<Prompts>,
    news: &Arc<dyn NewsSource>,
    market: &Arc<dyn MarketDataSource>,
    news_lookback_days: u32,
) -> Stages {
    let analyst = |name: &str| {
        AnalystAgent::new(
            name,
            Arc::clone(provider),
            config.clone(),
            instructions.clone(),
            Arc::clone(prompts),
        )
    };

    Stages {
        web_research: WebResearchAgent::new(
            analyst("web-research"),
            Arc::clone(news),
            news_lookback_days,
        ),
        financial: FinancialDataAgent::new(analyst("financial-data"), Arc::clone(market)),
        technical: TechnicalAnalysisAgent::new(analyst("technical-analysis"), Arc::clone(market)),
        synthesis: analyst("stock-advisor"),
    }
}

#[async_trait]
impl Agent for StockAdvisorAgent {
    /// Treats the input as a ticker and returns the final recommendation text
    async fn process(&self, input: String, context: &mut Context) -> advisor_core::Result<String> {
        let symbol = normalize_symbol(&input)?;
        if context.symbol().is_none() {
            context.insert(
                advisor_core::context::keys::SYMBOL,
                serde_json::json!(symbol),
            );
        }
        Ok(self.run(&symbol, context).await?.recommendation)
    }

    fn name(&self) -> &str {
        "StockAdvisorAgent"
    }
}
