//! Configuration for the stock advisor

use crate::error::{AdvisorError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Model used for every stage unless overridden
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Upper bound for the news lookback and price history windows
pub const MAX_LOOKBACK_DAYS: u32 = 3650;

const GOOGLE_KEY_HINT: &str = "You can get an API key from https://makersuite.google.com/app/apikey";

/// Sampling settings shared by the stage agents
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Model identifier sent to the provider
    pub model_name: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Maximum output tokens per call
    pub max_tokens: usize,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            model_name: DEFAULT_MODEL.to_string(),
            temperature: 0.4,
            max_tokens: 2048,
        }
    }
}

impl AgentConfig {
    /// Create a config for a model with default sampling settings
    pub fn new(model_name: impl Into<String>) -> Self {
        Self {
            model_name: model_name.into(),
            ..Self::default()
        }
    }
}

/// Configuration for a stock advisor run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisorConfig {
    /// Model settings
    pub agent: AgentConfig,

    /// Gemini API key, required for any stage that calls the model
    pub google_api_key: Option<String>,

    /// NewsAPI.org key; news research is skipped without it
    pub news_api_key: Option<String>,

    /// Override for the Gemini endpoint base URL
    pub gemini_api_base: Option<String>,

    /// How many days back to search for news
    pub news_lookback_days: u32,

    /// How many days of daily prices feed the indicators
    pub history_days: u32,

    /// Request timeout for market data and news calls
    pub request_timeout: Duration,

    /// Request timeout for model calls
    pub model_timeout: Duration,

    /// Yahoo page requests allowed per second
    pub yahoo_requests_per_second: u32,

    /// NewsAPI requests allowed per minute
    pub news_requests_per_minute: u32,

    /// User-Agent header for Yahoo page requests
    pub user_agent: String,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            agent: AgentConfig::default(),
            google_api_key: None,
            news_api_key: None,
            gemini_api_base: None,
            news_lookback_days: 7,
            history_days: 365,
            request_timeout: Duration::from_secs(30),
            model_timeout: Duration::from_secs(120),
            yahoo_requests_per_second: 2,
            news_requests_per_minute: 30,
            user_agent: "Mozilla/5.0".to_string(),
        }
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AdvisorConfig {
    /// Create a new configuration builder
    pub fn builder() -> AdvisorConfigBuilder {
        AdvisorConfigBuilder::default()
    }

    /// Load API keys and the model override from the environment
    ///
    /// Reads `GOOGLE_API_KEY`, `NEWS_API_KEY`, `GEMINI_MODEL` and
    /// `GEMINI_API_BASE`. Empty values count as unset.
    pub fn with_env_keys(mut self) -> Self {
        if let Some(key) = env_non_empty("GOOGLE_API_KEY") {
            self.google_api_key = Some(key);
        }
        if let Some(key) = env_non_empty("NEWS_API_KEY") {
            self.news_api_key = Some(key);
        }
        if let Some(model) = env_non_empty("GEMINI_MODEL") {
            self.agent.model_name = model;
        }
        if let Some(base) = env_non_empty("GEMINI_API_BASE") {
            self.gemini_api_base = Some(base);
        }
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.agent.model_name.trim().is_empty() {
            return Err(AdvisorError::ConfigError(
                "model_name must not be empty".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.agent.temperature) {
            return Err(AdvisorError::ConfigError(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.agent.temperature
            )));
        }

        if self.agent.max_tokens == 0 {
            return Err(AdvisorError::ConfigError(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() || self.model_timeout.is_zero() {
            return Err(AdvisorError::ConfigError(
                "timeouts must be greater than 0".to_string(),
            ));
        }

        if self.yahoo_requests_per_second == 0 || self.news_requests_per_minute == 0 {
            return Err(AdvisorError::ConfigError(
                "rate limits must be greater than 0".to_string(),
            ));
        }

        for (name, days) in [
            ("news_lookback_days", self.news_lookback_days),
            ("history_days", self.history_days),
        ] {
            if !(1..=MAX_LOOKBACK_DAYS).contains(&days) {
                return Err(AdvisorError::ConfigError(format!(
                    "{name} must be between 1 and {MAX_LOOKBACK_DAYS}, got {days}"
                )));
            }
        }

        Ok(())
    }

    /// Return the Gemini key or the error shown when it is missing
    pub fn require_google_api_key(&self) -> Result<&str> {
        self.google_api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AdvisorError::MissingApiKey {
                var: "GOOGLE_API_KEY",
                hint: GOOGLE_KEY_HINT,
            })
    }
}

/// Builder for AdvisorConfig
#[derive(Debug, Default)]
pub struct AdvisorConfigBuilder {
    model_name: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
    google_api_key: Option<String>,
    news_api_key: Option<String>,
    gemini_api_base: Option<String>,
    news_lookback_days: Option<u32>,
    history_days: Option<u32>,
    request_timeout: Option<Duration>,
    model_timeout: Option<Duration>,
    yahoo_requests_per_second: Option<u32>,
    news_requests_per_minute: Option<u32>,
    user_agent: Option<String>,
    from_env: bool,
}

impl AdvisorConfigBuilder {
    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model_name = Some(model.into());
        self
    }

    /// Set the sampling temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the maximum output tokens
    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Set the Gemini API key
    pub fn google_api_key(mut self, key: impl Into<String>) -> Self {
        self.google_api_key = Some(key.into());
        self
    }

    /// Set the NewsAPI key
    pub fn news_api_key(mut self, key: impl Into<String>) -> Self {
        self.news_api_key = Some(key.into());
        self
    }

    /// Point the Gemini provider at another base URL
    pub fn gemini_api_base(mut self, base: impl Into<String>) -> Self {
        self.gemini_api_base = Some(base.into());
        self
    }

    /// Set the news lookback window in days
    pub fn news_lookback_days(mut self, days: u32) -> Self {
        self.news_lookback_days = Some(days);
        self
    }

    /// Set the price history window in days
    pub fn history_days(mut self, days: u32) -> Self {
        self.history_days = Some(days);
        self
    }

    /// Set the request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Set the timeout for model calls
    pub fn model_timeout(mut self, duration: Duration) -> Self {
        self.model_timeout = Some(duration);
        self
    }

    /// Set the Yahoo page rate limit
    pub fn yahoo_requests_per_second(mut self, limit: u32) -> Self {
        self.yahoo_requests_per_second = Some(limit);
        self
    }

    /// Set the NewsAPI rate limit
    pub fn news_requests_per_minute(mut self, limit: u32) -> Self {
        self.news_requests_per_minute = Some(limit);
        self
    }

    /// Set the User-Agent header for Yahoo page requests
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Fill keys and model from the environment before explicit settings apply
    pub fn with_env_keys(mut self) -> Self {
        self.from_env = true;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<AdvisorConfig> {
        let mut config = AdvisorConfig::default();
        if self.from_env {
            config = config.with_env_keys();
        }

        if let Some(model) = self.model_name {
            config.agent.model_name = model;
        }
        if let Some(temperature) = self.temperature {
            config.agent.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.agent.max_tokens = max_tokens;
        }
        if self.google_api_key.is_some() {
            config.google_api_key = self.google_api_key;
        }
        if self.news_api_key.is_some() {
            config.news_api_key = self.news_api_key;
        }
        if self.gemini_api_base.is_some() {
            config.gemini_api_base = self.gemini_api_base;
        }
        config.news_lookback_days = self.news_lookback_days.unwrap_or(config.news_lookback_days);
        config.history_days = self.history_days.unwrap_or(config.history_days);
        config.request_timeout = self.request_timeout.unwrap_or(config.request_timeout);
        config.model_timeout = self.model_timeout.unwrap_or(config.model_timeout);
        config.yahoo_requests_per_second = self
            .yahoo_requests_per_second
            .unwrap_or(config.yahoo_requests_per_second);
        config.news_requests_per_minute = self
            .news_requests_per_minute
            .unwrap_or(config.news_requests_per_minute);
        if let Some(user_agent) = self.user_agent {
            config.user_agent = user_agent;
        }

        config.validate()?;
        Ok(config)
    }
}
