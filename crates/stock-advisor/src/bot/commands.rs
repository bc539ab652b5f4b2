//! Interactive session commands

use crate::error::{AdvisorError, Result};

/// Parsed line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the full pipeline for a ticker
    Analyze { symbol: String },
    /// List current instructions
    Instructions,
    /// Append an instruction
    Add { text: String },
    /// Remove an instruction by its 1-based position
    Remove { position: usize },
    /// Restore the default instructions
    Reset,
    /// Export the last report
    Save { path: Option<String> },
    Help,
    Exit,
}

fn missing(what: &str) -> AdvisorError {
    AdvisorError::CommandError(format!("Missing {what}"))
}

impl Command {
    /// Parse a line; bare text is read as a ticker
    pub fn parse(input: &str) -> Result<Self> {
        let input = input.trim();
        if input.is_empty() {
            return Err(AdvisorError::CommandError("Empty input".to_string()));
        }

        let Some(body) = input.strip_prefix('/') else {
            if input.split_whitespace().count() > 1 {
                return Err(AdvisorError::CommandError(
                    "Enter a ticker symbol or a /command (try /help)".to_string(),
                ));
            }
            return Ok(Command::Analyze {
                symbol: input.to_uppercase(),
            });
        };

        let (cmd, rest) = match body.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (body, ""),
        };

        match cmd.to_lowercase().as_str() {
            "analyze" | "a" => {
                let symbol = rest
                    .split_whitespace()
                    .next()
                    .ok_or_else(|| missing("symbol for analyze command"))?;
                Ok(Command::Analyze {
                    symbol: symbol.to_uppercase(),
                })
            }
            "instructions" | "i" | "list" => Ok(Command::Instructions),
            "add" => {
                if rest.is_empty() {
                    return Err(missing("instruction text for add command"));
                }
                Ok(Command::Add {
                    text: rest.to_string(),
                })
            }
            "remove" | "rm" => {
                let raw = rest
                    .split_whitespace()
                    .next()
                    .ok_or_else(|| missing("instruction number for remove command"))?;
                let position = raw
                    .parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or_else(|| {
                        AdvisorError::CommandError(format!("Invalid instruction number: {raw}"))
                    })?;
                Ok(Command::Remove { position })
            }
            "reset" => Ok(Command::Reset),
            "save" | "s" => Ok(Command::Save {
                path: (!rest.is_empty()).then(|| rest.to_string()),
            }),
            "help" | "h" | "?" => Ok(Command::Help),
            "exit" | "quit" | "q" => Ok(Command::Exit),
            other => Err(AdvisorError::CommandError(format!("Unknown command: /{other}"))),
        }
    }

    pub fn help_text() -> &'static str {
        r"
Stock Advisor Commands
======================

  /analyze <symbol>   Run the full analysis (or just type the symbol)
  /instructions       Show the current analysis instructions
  /add <text>         Add an instruction
  /remove <n>         Remove instruction number n
  /reset              Restore the default instructions
  /save [path]        Save the last report as markdown
  /help               Show this help
  /exit               Quit

Aliases: /a = /analyze  /i = /instructions  /rm = /remove  /s = /save  /q = /exit
"
    }

    pub fn description(&self) -> &'static str {
        match self {
            Command::Analyze { .. } => "Comprehensive stock analysis",
            Command::Instructions => "Show instructions",
            Command::Add { .. } => "Add instruction",
            Command::Remove { .. } => "Remove instruction",
            Command::Reset => "Reset instructions",
            Command::Save { .. } => "Save report",
            Command::Help => "Show help",
            Command::Exit => "Exit",
        }
    }
}
