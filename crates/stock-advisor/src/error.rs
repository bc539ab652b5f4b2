//! Error types for the stock advisor

use thiserror::Error;

/// Stock advisor errors
#[derive(Debug, Error)]
pub enum AdvisorError {
    /// A required API key is not configured
    #[error("Missing {var}. Please set the {var} environment variable. {hint}")]
    MissingApiKey {
        var: &'static str,
        hint: &'static str,
    },

    /// Invalid stock symbol provided
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),

    /// Upstream returned a non-success status
    #[error("Failed to retrieve data: Status code {status} ({url})")]
    HttpStatus { status: u16, url: String },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Yahoo Finance chart API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinanceError(String),

    /// NewsAPI error payload
    #[error("NewsAPI error {code}: {message}")]
    NewsApiError { code: String, message: String },

    /// Expected markup was not found on a page
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Technical indicator calculation error
    #[error("Technical indicator error: {0}")]
    IndicatorError(String),

    /// Prompt template error
    #[error("Template error in '{name}': {detail}")]
    TemplateError { name: String, detail: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Instruction list edit rejected
    #[error("Instruction error: {0}")]
    InstructionError(String),

    /// Interactive command could not be parsed
    #[error("Command error: {0}")]
    CommandError(String),

    /// Report export failed
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for stock advisor operations
pub type Result<T> = std::result::Result<T, AdvisorError>;

impl From<AdvisorError> for advisor_core::Error {
    fn from(err: AdvisorError) -> Self {
        advisor_core::Error::ProcessingFailed(err.to_string())
    }
}

impl From<advisor_core::Error> for AdvisorError {
    fn from(err: advisor_core::Error) -> Self {
        AdvisorError::Other(err.to_string())
    }
}

impl From<advisor_llm::LLMError> for AdvisorError {
    fn from(err: advisor_llm::LLMError) -> Self {
        AdvisorError::Other(err.to_string())
    }
}

impl From<minijinja::Error> for AdvisorError {
    fn from(err: minijinja::Error) -> Self {
        AdvisorError::TemplateError {
            name: err.name().unwrap_or("<string>").to_string(),
            detail: err.to_string(),
        }
    }
}
