//! Report rendering and export

use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::agents::Recommendation;
use crate::error::Result;

const NOT_AVAILABLE: &str = "N/A";

/// `stock_analysis_<SYMBOL>.md`
pub fn default_file_name(symbol: &str) -> String {
    format!("stock_analysis_{symbol}.md")
}

/// Markdown report with one section per stage
pub fn markdown(rec: &Recommendation) -> String {
    format!(
        "# AI Stock Advisor Pro Report - {symbol}\n\n\
         _Generated {generated} with {model}_\n\n\
         ## Market Research\n\n{research}\n\n\
         ## Financial Analysis\n\n{financial}\n\n\
         ## Technical Analysis\n\n{technical}\n\n\
         ## Final Recommendation\n\n{recommendation}\n",
        symbol = rec.symbol,
        generated = rec.generated_at.format("%Y-%m-%d %H:%M UTC"),
        model = rec.model,
        research = rec.web_research.analysis.trim(),
        financial = rec.financials.analysis.trim(),
        technical = rec.technicals.analysis.trim(),
        recommendation = rec.recommendation.trim(),
    )
}

/// Write the markdown report to `path`, creating parent directories
pub fn export(rec: &Recommendation, path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, markdown(rec))?;
    info!(path = %path.display(), "report exported");
    Ok(path.to_path_buf())
}

/// Headline figures shown with the financial analysis
pub fn key_metrics(rec: &Recommendation) -> Vec<(&'static str, String)> {
    let data = &rec.financials.financial_data;
    let field = |key: &str| {
        rec.financials
            .fundamentals
            .get(key)
            .cloned()
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };
    // Debug keeps the trailing ".0" on whole prices
    let price = data
        .stock
        .current_price
        .map_or_else(|| format!("${NOT_AVAILABLE}"), |p| format!("${p:?}"));

    vec![
        ("Current Price", price),
        ("Market Cap", field("Market Cap (intraday)")),
        ("P/E Ratio", field("PE Ratio (TTM)")),
        ("Beta", field("Beta (5Y Monthly)")),
        ("EPS", field("EPS (TTM)")),
        ("52 Week Range", field("52 Week Range")),
        ("Forward Dividend & Yield", field("Forward Dividend & Yield")),
    ]
}

/// RSI, MACD and signal line with two decimals
pub fn technical_metrics(rec: &Recommendation) -> Vec<(&'static str, String)> {
    let technical = rec.technicals.technical_data.technical;
    let fmt = |value: Option<f64>| value.map_or_else(|| NOT_AVAILABLE.to_string(), |v| format!("{v:.2}"));

    vec![
        ("RSI", fmt(technical.map(|t| t.rsi))),
        ("MACD", fmt(technical.map(|t| t.macd))),
        ("Signal Line", fmt(technical.map(|t| t.macd_signal))),
    ]
}

fn metric_table(metrics: &[(&'static str, String)]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(metrics.iter().map(|(label, _)| *label).collect::<Vec<_>>())
        .add_row(metrics.iter().map(|(_, value)| value.as_str()).collect::<Vec<_>>());
    table
}

/// Terminal rendering: stage text with metric tables
pub fn render_terminal(rec: &Recommendation) -> String {
    let mut out = String::new();
    out.push_str(&format!("=== AI Stock Advisor Pro - {} ===\n\n", rec.symbol));

    out.push_str("--- Market Research ---\n");
    out.push_str(rec.web_research.analysis.trim());
    out.push_str(&format!(
        "\n({} news articles considered)\n\n",
        rec.web_research.news_data.len()
    ));

    out.push_str("--- Financial Analysis ---\n");
    out.push_str(rec.financials.analysis.trim());
    out.push_str("\n\nKey Metrics\n");
    out.push_str(&metric_table(&key_metrics(rec)).to_string());
    out.push_str("\n\n");

    out.push_str("--- Technical Analysis ---\n");
    out.push_str(rec.technicals.analysis.trim());
    out.push('\n');
    out.push_str(&metric_table(&technical_metrics(rec)).to_string());
    out.push_str("\n\n");

    out.push_str("--- Investment Recommendation ---\n");
    out.push_str(rec.recommendation.trim());
    out.push_str(&format!(
        "\n\nTokens: {} in / {} out\n",
        rec.usage.input_tokens, rec.usage.output_tokens
    ));
    out
}

/// Numbered list of instructions as a one-column table
pub fn instructions_table<'a>(items: impl IntoIterator<Item = &'a String>) -> String {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_header(vec!["#", "Instruction"]);
    for (i, item) in items.into_iter().enumerate() {
        table.add_row(vec![(i + 1).to_string(), item.clone()]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::{FinancialAnalysis, TechnicalAnalysis, WebResearch};
    use crate::api::FieldMap;
    use crate::tools::{StockData, TechnicalIndicators};
    use advisor_llm::TokenUsage;
    use chrono::{TimeZone, Utc};

    fn sample() -> Recommendation {
        let mut financials = FinancialAnalysis {
            analysis: "Solid margins.".to_string(),
            fundamentals: FieldMap::from([
                ("PE Ratio (TTM)".to_string(), "29.51".to_string()),
                ("Market Cap (intraday)".to_string(), "2.95T".to_string()),
            ]),
            ..Default::default()
        };
        financials.financial_data.stock.current_price = Some(189.84);

        Recommendation {
            symbol: "AAPL".to_string(),
            model: "gemini-2.0-flash-exp".to_string(),
            web_research: WebResearch {
                news_data: Vec::new(),
                analysis: "Quiet week.".to_string(),
            },
            financials,
            technicals: TechnicalAnalysis {
                technical_data: StockData {
                    technical: Some(TechnicalIndicators {
                        rsi: 55.123,
                        macd: -1.5,
                        macd_signal: -0.987,
                        sma_50: 0.0,
                        sma_200: 0.0,
                    }),
                    ..Default::default()
                },
                analysis: "Range bound.".to_string(),
            },
            recommendation: "Hold".to_string(),
            usage: TokenUsage {
                input_tokens: 100,
                output_tokens: 40,
            },
            generated_at: Utc.with_ymd_and_hms(2024, 5, 1, 14, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_markdown_sections_in_order() {
        let md = markdown(&sample());
        assert!(md.starts_with("# AI Stock Advisor Pro Report - AAPL\n"));
        let order = [
            "## Market Research\n\nQuiet week.",
            "## Financial Analysis\n\nSolid margins.",
            "## Technical Analysis\n\nRange bound.",
            "## Final Recommendation\n\nHold",
        ];
        let positions: Vec<usize> = order.iter().map(|s| md.find(s).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_key_metrics() {
        let metrics = key_metrics(&sample());
        assert_eq!(metrics[0], ("Current Price", "$189.84".to_string()));
        assert_eq!(metrics[1], ("Market Cap", "2.95T".to_string()));
        assert_eq!(metrics[2], ("P/E Ratio", "29.51".to_string()));
        assert_eq!(metrics[3], ("Beta", "N/A".to_string()));

        let mut rec = sample();
        rec.financials.financial_data.stock.current_price = Some(190.0);
        assert_eq!(key_metrics(&rec)[0].1, "$190.0");

        rec.financials.financial_data.stock.current_price = None;
        assert_eq!(key_metrics(&rec)[0].1, "$N/A");
    }

    #[test]
    fn test_technical_metrics() {
        let metrics = technical_metrics(&sample());
        assert_eq!(
            metrics,
            vec![
                ("RSI", "55.12".to_string()),
                ("MACD", "-1.50".to_string()),
                ("Signal Line", "-0.99".to_string()),
            ]
        );

        let mut rec = sample();
        rec.technicals.technical_data.technical = None;
        assert!(technical_metrics(&rec).iter().all(|(_, v)| v == "N/A"));
    }

    #[test]
    fn test_export_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports/nested").join(default_file_name("AAPL"));

        let written = export(&sample(), &path).unwrap();
        assert_eq!(written, path);
        assert!(path.ends_with("stock_analysis_AAPL.md"));
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, markdown(&sample()));
    }

    #[test]
    fn test_render_terminal_includes_tables() {
        let text = render_terminal(&sample());
        assert!(text.contains("Current Price"));
        assert!(text.contains("$189.84"));
        assert!(text.contains("Signal Line"));
        assert!(text.contains("Tokens: 100 in / 40 out"));
    }

    #[test]
    fn test_instructions_table_is_numbered() {
        let items = vec!["First".to_string(), "Second".to_string()];
        let table = instructions_table(&items);
        assert!(table.contains("First"));
        assert!(table.contains('2'));
    }
}
