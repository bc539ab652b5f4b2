//! Execution context for a pipeline run
//!
//! The `Context` carries the ticker being analyzed, the name of the stage
//! currently talking to the model, and running token counts. It is a plain
//! key-value store underneath so stages can stash extra values.

use std::collections::HashMap;

/// Well-known context keys
pub mod keys {
    /// Ticker symbol under analysis
    pub const SYMBOL: &str = "symbol";
    /// Name of the stage currently running
    pub const STAGE: &str = "stage";
    /// Prompt tokens consumed so far
    pub const INPUT_TOKENS: &str = "input_tokens";
    /// Completion tokens produced so far
    pub const OUTPUT_TOKENS: &str = "output_tokens";
    /// Number of model calls made so far
    pub const MODEL_CALLS: &str = "model_calls";
}

/// Context passed to agents during execution
///
/// # Example
///
/// ```
/// use advisor_core::Context;
///
/// let mut ctx = Context::new().with_symbol("AAPL");
/// ctx.record_usage(120, 480);
/// ctx.record_usage(80, 200);
///
/// assert_eq!(ctx.symbol(), Some("AAPL"));
/// assert_eq!(ctx.token_totals(), (200, 680));
/// assert_eq!(ctx.model_calls(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Context {
    data: HashMap<String, serde_json::Value>,
}

impl Context {
    /// Create a new empty context
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ticker symbol
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.insert(keys::SYMBOL, serde_json::json!(symbol.into()));
        self
    }

    /// Get the ticker symbol
    pub fn symbol(&self) -> Option<&str> {
        self.get(keys::SYMBOL).and_then(|v| v.as_str())
    }

    /// Mark which stage is about to call the model
    pub fn set_stage(&mut self, stage: impl Into<String>) {
        self.insert(keys::STAGE, serde_json::json!(stage.into()));
    }

    /// Get the current stage name
    pub fn stage(&self) -> Option<&str> {
        self.get(keys::STAGE).and_then(|v| v.as_str())
    }

    /// Add one model call's token usage to the running totals
    pub fn record_usage(&mut self, input_tokens: usize, output_tokens: usize) {
        self.bump(keys::INPUT_TOKENS, input_tokens as u64);
        self.bump(keys::OUTPUT_TOKENS, output_tokens as u64);
        self.bump(keys::MODEL_CALLS, 1);
    }

    /// Running `(input, output)` token totals
    pub fn token_totals(&self) -> (usize, usize) {
        (
            self.counter(keys::INPUT_TOKENS) as usize,
            self.counter(keys::OUTPUT_TOKENS) as usize,
        )
    }

    /// Number of model calls recorded
    pub fn model_calls(&self) -> usize {
        self.counter(keys::MODEL_CALLS) as usize
    }

    fn counter(&self, key: &str) -> u64 {
        self.get(key).and_then(serde_json::Value::as_u64).unwrap_or(0)
    }

    fn bump(&mut self, key: &str, by: u64) {
        let next = self.counter(key) + by;
        self.insert(key, serde_json::json!(next));
    }

    // =========== Generic Key-Value Operations ===========

    /// Insert a value into the context
    pub fn insert(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.data.insert(key.into(), value);
    }

    /// Get a value from the context
    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.data.get(key)
    }

    /// Get the number of entries in the context
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the context is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_and_stage() {
        let mut ctx = Context::new().with_symbol("MSFT");
        assert_eq!(ctx.symbol(), Some("MSFT"));
        assert_eq!(ctx.stage(), None);

        ctx.set_stage("technical-analysis");
        assert_eq!(ctx.stage(), Some("technical-analysis"));
    }

    #[test]
    fn test_usage_accumulates() {
        let mut ctx = Context::new();
        assert_eq!(ctx.token_totals(), (0, 0));
        assert_eq!(ctx.model_calls(), 0);

        ctx.record_usage(10, 20);
        ctx.record_usage(5, 0);
        assert_eq!(ctx.token_totals(), (15, 20));
        assert_eq!(ctx.model_calls(), 2);
    }

    #[test]
    fn test_basic_operations() {
        let mut ctx = Context::new();
        assert!(ctx.is_empty());

        ctx.insert("key", serde_json::json!("value"));
        assert_eq!(ctx.len(), 1);
        assert_eq!(ctx.get("key"), Some(&serde_json::json!("value")));
        assert!(ctx.get("missing").is_none());
    }
}
