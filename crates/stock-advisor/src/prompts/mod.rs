//! Prompt templates for the analysis stages
//!
//! Every prompt sent to the model goes through [`Prompts`]. The stage templates
//! receive structured data already serialized as pretty-printed JSON, and the
//! wrapper template prefixes the active instructions.

mod templates;

pub use templates::*;

use crate::error::Result;
use minijinja::{AutoEscape, Environment, UndefinedBehavior, context};
use serde::Serialize;

/// Rendered prompt templates backed by MiniJinja
#[derive(Debug, Clone)]
pub struct Prompts {
    env: Environment<'static>,
}

fn pretty<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

impl Prompts {
    /// Load every template, failing on a syntax error
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_auto_escape_callback(|_: &str| AutoEscape::None);

        for (name, source) in ALL_TEMPLATES {
            env.add_template(name, source)?;
        }

        Ok(Self { env })
    }

    fn render(&self, name: &str, ctx: minijinja::Value) -> Result<String> {
        Ok(self.env.get_template(name)?.render(ctx)?)
    }

    /// Prefix a stage prompt with the joined instructions
    pub fn wrap(&self, instructions: &str, query: &str) -> Result<String> {
        self.render(ANALYST_WRAPPER, context! { instructions, query })
    }

    pub fn web_research<T: Serialize + ?Sized>(&self, company: &str, news_data: &T) -> Result<String> {
        self.render(
            STAGE_WEB_RESEARCH,
            context! { company, news_data => pretty(news_data)? },
        )
    }

    pub fn financial<C, F, R>(&self, symbol: &str, combined: &C, fundamentals: &F, ratios: &R) -> Result<String>
    where
        C: Serialize + ?Sized,
        F: Serialize + ?Sized,
        R: Serialize + ?Sized,
    {
        self.render(
            STAGE_FINANCIAL,
            context! {
                symbol,
                financial_data => pretty(combined)?,
                fundamentals => pretty(fundamentals)?,
                key_ratios => pretty(ratios)?,
            },
        )
    }

    pub fn technical<T: Serialize + ?Sized>(&self, symbol: &str, technical_data: &T) -> Result<String> {
        self.render(
            STAGE_TECHNICAL,
            context! { symbol, technical_data => pretty(technical_data)? },
        )
    }

    pub fn recommendation<W, F, T>(
        &self,
        symbol: &str,
        web_research: &W,
        financials: &F,
        technicals: &T,
    ) -> Result<String>
    where
        W: Serialize + ?Sized,
        F: Serialize + ?Sized,
        T: Serialize + ?Sized,
    {
        self.render(
            STAGE_RECOMMENDATION,
            context! {
                symbol,
                web_research => pretty(web_research)?,
                financials => pretty(financials)?,
                technicals => pretty(technicals)?,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prompts() -> Prompts {
        Prompts::new().unwrap()
    }

    #[test]
    fn test_wrap() {
        let text = prompts().wrap("Be concise. Focus on risk.", "Analyze AAPL").unwrap();
        assert_eq!(
            text,
            "Instructions: Be concise. Focus on risk.\n\nQuery: Analyze AAPL\n\n\
             Please provide a detailed analysis based on the above instructions."
        );
    }

    #[test]
    fn test_web_research_prompt() {
        let text = prompts()
            .web_research("TSLA", &json!([{"title": "Deliveries beat"}]))
            .unwrap();
        assert!(text.starts_with("Analyze the following news articles about TSLA:"));
        assert!(text.contains("\"title\": \"Deliveries beat\""));
        assert!(text.contains("4. Competitive position"));
    }

    #[test]
    fn test_financial_prompt_lists_eight_items() {
        let text = prompts()
            .financial("MSFT", &json!({"current_price": 410.2}), &json!({}), &json!({"Beta": "0.9"}))
            .unwrap();
        assert!(text.contains("financial data for MSFT"));
        assert!(text.contains("\"current_price\": 410.2"));
        assert!(text.contains("1. Financial health and stability"));
        assert!(text.contains("8. Dividend sustainability (if applicable)"));
    }

    #[test]
    fn test_technical_prompt() {
        let text = prompts().technical("NVDA", &json!({"technical": {"rsi": 61.0}})).unwrap();
        assert!(text.contains("technical indicators for NVDA"));
        assert!(text.contains("\"rsi\": 61.0"));
        assert!(text.contains("4. Trading recommendations"));
    }

    #[test]
    fn test_recommendation_prompt() {
        let text = prompts()
            .recommendation("AMD", &json!({"analysis": "news"}), &json!({"analysis": "fin"}), &json!({"analysis": "tech"}))
            .unwrap();
        assert!(text.contains("Synthesize the following analyses for AMD"));
        assert!(text.contains("\"analysis\": \"fin\""));
        assert!(text.contains("1. Overall recommendation (Buy/Hold/Sell)"));
        assert!(text.contains("5. Investment timeline"));
    }

    #[test]
    fn test_no_html_escaping() {
        let text = prompts().wrap("Use <b> & \"quotes\"", "Q&A").unwrap();
        assert!(text.contains("Use <b> & \"quotes\""));
        assert!(text.contains("Query: Q&A"));
    }
}
