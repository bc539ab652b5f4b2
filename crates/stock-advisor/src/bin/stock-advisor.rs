//! Stock advisor CLI
//!
//! # Usage
//!
//! ```bash
//! export GOOGLE_API_KEY="..."
//! export NEWS_API_KEY="..."
//!
//! stock-advisor analyze AAPL --save
//! stock-advisor analyze TSLA -i "Focus on delivery numbers" --json
//! stock-advisor data MSFT
//! stock-advisor news NVDA --days 3
//! stock-advisor interactive
//! ```

use advisor_utils::{LogFormat, init_tracing_with, load_dotenv};
use anyhow::{Context as _, bail};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use stock_advisor::agents::FinancialData;
use stock_advisor::bot::{BotConfig, StockBot};
use stock_advisor::config::MAX_LOOKBACK_DAYS;
use stock_advisor::tools::{MarketDataSource, NewsSource};
use stock_advisor::{
    AdvisorConfig, DataSections, FinanceTools, InstructionSet, StockAdvisorAgent,
    WebResearchTool, report,
};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "stock-advisor", version)]
#[command(about = "AI stock advisor: news, fundamentals and technicals summarized by Gemini", long_about = None)]
struct Cli {
    /// Log output format
    #[arg(long, global = true, default_value = "text", value_parser = parse_log_format)]
    log_format: LogFormat,

    /// More verbose logging (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full analysis pipeline for a ticker
    Analyze(AnalyzeArgs),
    /// Print financial and technical data as JSON without calling the model
    Data {
        symbol: String,
    },
    /// Print recent news articles as JSON without calling the model
    News {
        symbol: String,
        /// Days to look back (1-3650)
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_LOOKBACK_DAYS)))]
        days: Option<u32>,
    },
    /// Start an interactive session
    Interactive(ModelArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    symbol: String,

    /// Extra analysis instruction (repeatable)
    #[arg(short = 'i', long = "instruction")]
    instructions: Vec<String>,

    /// Use only the instructions given with -i
    #[arg(long)]
    no_default_instructions: bool,

    #[command(flatten)]
    model: ModelArgs,

    /// Write the markdown report to this path
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the markdown report to stock_analysis_<SYMBOL>.md
    #[arg(long)]
    save: bool,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug, Default)]
struct ModelArgs {
    /// Gemini model name, overrides GEMINI_MODEL
    #[arg(long)]
    model: Option<String>,

    #[arg(long)]
    temperature: Option<f32>,

    #[arg(long)]
    max_tokens: Option<usize>,
}

fn parse_log_format(s: &str) -> Result<LogFormat, String> {
    s.parse()
}

fn verbosity_filter(verbose: u8) -> Option<&'static str> {
    match verbose {
        0 => None,
        1 => Some("info,stock_advisor=debug"),
        _ => Some("debug"),
    }
}

fn build_config(model: &ModelArgs) -> stock_advisor::Result<AdvisorConfig> {
    let mut builder = AdvisorConfig::builder().with_env_keys();
    if let Some(name) = &model.model {
        builder = builder.model(name.clone());
    }
    if let Some(temperature) = model.temperature {
        builder = builder.temperature(temperature);
    }
    if let Some(max_tokens) = model.max_tokens {
        builder = builder.max_tokens(max_tokens);
    }
    builder.build()
}

fn instruction_set(args: &AnalyzeArgs) -> anyhow::Result<InstructionSet> {
    if args.no_default_instructions {
        let set = InstructionSet::from_items(&args.instructions);
        if set.is_empty() {
            bail!("--no-default-instructions needs at least one -i/--instruction");
        }
        return Ok(set);
    }

    let mut set = InstructionSet::default();
    for text in &args.instructions {
        set.add(text);
    }
    Ok(set)
}

async fn analyze(args: AnalyzeArgs) -> anyhow::Result<()> {
    let config = build_config(&args.model)?;
    let advisor = StockAdvisorAgent::from_config(&config, instruction_set(&args)?)?;

    let rec = advisor.generate_recommendation(&args.symbol).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rec)?);
    } else {
        println!("{}", report::render_terminal(&rec));
    }

    let mut targets = Vec::new();
    if let Some(path) = args.output {
        targets.push(path);
    }
    if args.save {
        targets.push(PathBuf::from(report::default_file_name(&rec.symbol)));
    }
    for path in targets {
        let written = report::export(&rec, &path)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        eprintln!("Report saved to {}", written.display());
    }
    Ok(())
}

async fn data(symbol: &str) -> anyhow::Result<()> {
    let config = build_config(&ModelArgs::default())?;
    let symbol = stock_advisor::agents::advisor::normalize_symbol(symbol)?;
    let tools = FinanceTools::from_config(&config)?;

    let stock = tools.stock_data(&symbol, DataSections::all()).await;
    let fundamentals = tools.fundamentals(&symbol).await.unwrap_or_else(|e| {
        warn!(symbol = %symbol, error = %e, "fundamentals unavailable");
        Default::default()
    });
    let key_ratios = tools.key_ratios(&symbol).await.unwrap_or_else(|e| {
        warn!(symbol = %symbol, error = %e, "key ratios unavailable");
        Default::default()
    });

    let data = FinancialData {
        stock,
        fundamentals,
        key_ratios,
    };
    println!("{}", serde_json::to_string_pretty(&data)?);
    Ok(())
}

async fn news(symbol: &str, days: Option<u32>) -> anyhow::Result<()> {
    let config = build_config(&ModelArgs::default())?;
    let symbol = stock_advisor::agents::advisor::normalize_symbol(symbol)?;
    let tool = WebResearchTool::from_config(&config)?;

    let articles = tool
        .search_news(&symbol, days.unwrap_or(config.news_lookback_days))
        .await;
    println!("{}", serde_json::to_string_pretty(&articles)?);
    Ok(())
}

async fn interactive(model: &ModelArgs) -> anyhow::Result<()> {
    let config = build_config(model)?;
    let advisor = StockAdvisorAgent::from_config(&config, InstructionSet::default())?;
    info!(model = %config.agent.model_name, "starting interactive session");

    let mut bot = StockBot::new(advisor, BotConfig::default());
    bot.run_stdio().await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing_with(cli.log_format, verbosity_filter(cli.verbose));
    if let Some(path) = load_dotenv() {
        info!(path = %path.display(), "loaded .env");
    }

    match cli.command {
        Commands::Analyze(args) => analyze(args).await,
        Commands::Data { symbol } => data(&symbol).await,
        Commands::News { symbol, days } => news(&symbol, days).await,
        Commands::Interactive(model) => interactive(&model).await,
    }
}
