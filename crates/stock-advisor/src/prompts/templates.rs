//! Template names and sources

pub const ANALYST_WRAPPER: &str = "analyst.wrapper";
pub const STAGE_WEB_RESEARCH: &str = "stage.web_research";
pub const STAGE_FINANCIAL: &str = "stage.financial";
pub const STAGE_TECHNICAL: &str = "stage.technical";
pub const STAGE_RECOMMENDATION: &str = "stage.recommendation";

const WRAPPER_SRC: &str = "\
Instructions: {{ instructions }}

Query: {{ query }}

Please provide a detailed analysis based on the above instructions.";

const WEB_RESEARCH_SRC: &str = "\
Analyze the following news articles about {{ company }}:

{{ news_data }}

Provide insights on:
1. Recent developments
2. Market sentiment
3. Key challenges and opportunities
4. Competitive position";

const FINANCIAL_SRC: &str = "\
Analyze the following financial data for {{ symbol }}:

Financial Overview:
{{ financial_data }}

Stock Fundamentals:
{{ fundamentals }}

Key Financial Ratios:
{{ key_ratios }}

Provide detailed insights on:
1. Financial health and stability
2. Growth trends and projections
3. Valuation metrics and fair value assessment
4. Key risk factors and considerations
5. Comparative industry analysis
6. Capital structure and efficiency
7. Profitability metrics and trends
8. Dividend sustainability (if applicable)";

const TECHNICAL_SRC: &str = "\
Analyze the following technical indicators for {{ symbol }}:

{{ technical_data }}

Provide insights on:
1. Trend analysis
2. Support and resistance levels
3. Technical signals
4. Trading recommendations";

const RECOMMENDATION_SRC: &str = "\
Synthesize the following analyses for {{ symbol }}:

Web Research: {{ web_research }}
Financial Analysis: {{ financials }}
Technical Analysis: {{ technicals }}

Provide:
1. Overall recommendation (Buy/Hold/Sell)
2. Key reasons for recommendation
3. Risk factors
4. Price targets
5. Investment timeline";

pub(crate) const ALL_TEMPLATES: [(&str, &str); 5] = [
    (ANALYST_WRAPPER, WRAPPER_SRC),
    (STAGE_WEB_RESEARCH, WEB_RESEARCH_SRC),
    (STAGE_FINANCIAL, FINANCIAL_SRC),
    (STAGE_TECHNICAL, TECHNICAL_SRC),
    (STAGE_RECOMMENDATION, RECOMMENDATION_SRC),
];
