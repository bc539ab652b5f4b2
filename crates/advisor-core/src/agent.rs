//! Core Agent trait definition

use crate::{Context, Result};
use async_trait::async_trait;

/// Something that turns a prompt into model text
///
/// Stage agents in the advisor pipeline wrap this with their own data fetching;
/// the trait itself only covers the prompt-in, text-out step.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Process input and return output
    async fn process(&self, input: String, context: &mut Context) -> Result<String>;

    /// Get the agent's name
    fn name(&self) -> &str;
}
