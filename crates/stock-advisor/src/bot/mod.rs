//! Interactive advisor session
//!
//! A line-oriented REPL over [`StockAdvisorAgent`]. Instructions edited here
//! apply to every following analysis, and the last report can be saved as
//! markdown.
//!
//! ```rust,ignore
//! let advisor = StockAdvisorAgent::from_config(&config, InstructionSet::default())?;
//! let mut bot = StockBot::new(advisor, BotConfig::default());
//! bot.run_stdio().await?;
//! ```

pub mod commands;

use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::agents::{Recommendation, StockAdvisorAgent};
use crate::error::{AdvisorError, Result};
use crate::report;

pub use commands::Command;

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub welcome_message: String,
    pub prompt: String,
    /// Directory for `/save` without a path
    pub report_dir: PathBuf,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            welcome_message: "AI Stock Advisor Pro - type a ticker or /help".to_string(),
            prompt: ">>> ".to_string(),
            report_dir: PathBuf::from("."),
        }
    }
}

/// Result of handling one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Exit,
}

pub struct StockBot {
    advisor: StockAdvisorAgent,
    config: BotConfig,
    last: Option<Recommendation>,
}

impl StockBot {
    pub fn new(advisor: StockAdvisorAgent, config: BotConfig) -> Self {
        Self {
            advisor,
            config,
            last: None,
        }
    }

    pub fn welcome(&self) -> &str {
        &self.config.welcome_message
    }

    pub fn prompt(&self) -> &str {
        &self.config.prompt
    }

    pub fn advisor(&self) -> &StockAdvisorAgent {
        &self.advisor
    }

    /// Most recent successful analysis
    pub fn last_recommendation(&self) -> Option<&Recommendation> {
        self.last.as_ref()
    }

    pub async fn process_input(&mut self, input: &str) -> Result<Reply> {
        let command = Command::parse(input)?;
        debug!(command = command.description(), "executing");
        self.execute_command(command).await
    }

    pub async fn execute_command(&mut self, command: Command) -> Result<Reply> {
        let text = match command {
            Command::Analyze { symbol } => {
                let rec = self.advisor.generate_recommendation(&symbol).await?;
                let rendered = report::render_terminal(&rec);
                self.last = Some(rec);
                rendered
            }
            Command::Instructions => self.instructions_text(),
            Command::Add { text } => {
                let mut instructions = self.advisor.instructions().clone();
                if !instructions.add(&text) {
                    return Err(AdvisorError::InstructionError(
                        "instruction text must not be blank".to_string(),
                    ));
                }
                self.advisor.set_instructions(instructions);
                format!("Instruction added.\n{}", self.instructions_text())
            }
            Command::Remove { position } => {
                let mut instructions = self.advisor.instructions().clone();
                let index = position.checked_sub(1).ok_or_else(|| {
                    AdvisorError::InstructionError("instruction numbers start at 1".to_string())
                })?;
                let removed = instructions.remove(index)?;
                self.advisor.set_instructions(instructions);
                format!("Removed: {removed}\n{}", self.instructions_text())
            }
            Command::Reset => {
                let mut instructions = self.advisor.instructions().clone();
                instructions.reset();
                self.advisor.set_instructions(instructions);
                format!("Instructions reset.\n{}", self.instructions_text())
            }
            Command::Save { path } => {
                let rec = self.last.as_ref().ok_or_else(|| {
                    AdvisorError::CommandError(
                        "Nothing to save yet. Analyze a symbol first.".to_string(),
                    )
                })?;
                let path = path.map_or_else(
                    || self.config.report_dir.join(report::default_file_name(&rec.symbol)),
                    PathBuf::from,
                );
                let written = report::export(rec, &path)?;
                format!("Report saved to {}", written.display())
            }
            Command::Help => Command::help_text().to_string(),
            Command::Exit => return Ok(Reply::Exit),
        };
        Ok(Reply::Text(text))
    }

    fn instructions_text(&self) -> String {
        report::instructions_table(self.advisor.instructions().iter())
    }

    /// Read commands line by line until `/exit` or end of input
    ///
    /// Command errors are printed and the session continues.
    pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        writeln!(out, "{}\n", self.welcome())?;
        let mut lines = input.lines();

        loop {
            write!(out, "{}", self.prompt())?;
            out.flush()?;

            let Some(line) = lines.next_line().await? else {
                writeln!(out, "\nGoodbye!")?;
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            match self.process_input(&line).await {
                Ok(Reply::Text(text)) => writeln!(out, "{text}\n")?,
                Ok(Reply::Exit) => {
                    writeln!(out, "Goodbye!")?;
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "command failed");
                    writeln!(out, "Error: {e}\n")?;
                }
            }
        }
        Ok(())
    }

    /// [`run`](Self::run) on stdin and stdout
    pub async fn run_stdio(&mut self) -> Result<()> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        self.run(stdin, &mut stdout).await
    }
}
