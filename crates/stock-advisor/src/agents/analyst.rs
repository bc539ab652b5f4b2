//! Base analyst agent

use advisor_core::{Agent, Context};
use advisor_llm::{CompletionRequest, LLMProvider, Message};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error};

use crate::config::AgentConfig;
use crate::error::Result;
use crate::instructions::InstructionSet;
use crate::prompts::Prompts;

/// Sends instruction-wrapped prompts to the model
///
/// Every stage owns one of these. It is also usable on its own through the
/// [`Agent`] trait, which propagates model errors instead of swallowing them.
#[derive(Clone)]
pub struct AnalystAgent {
    name: String,
    provider: Arc<dyn LLMProvider>,
    config: AgentConfig,
    instructions: InstructionSet,
    prompts: Arc<Prompts>,
}

impl AnalystAgent {
    pub fn new(
        name: impl Into<String>,
        provider: Arc<dyn LLMProvider>,
        config: AgentConfig,
        instructions: InstructionSet,
        prompts: Arc<Prompts>,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            config,
            instructions,
            prompts,
        }
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    pub fn instructions(&self) -> &InstructionSet {
        &self.instructions
    }

    pub fn prompts(&self) -> &Prompts {
        &self.prompts
    }

    /// Wrap a query with the current instructions
    pub fn format_prompt(&self, query: &str) -> Result<String> {
        self.prompts.wrap(&self.instructions.joined(), query)
    }

    /// Model text for `prompt`, or an empty string if the call fails
    pub async fn generate_response(&self, prompt: &str, ctx: &mut Context) -> String {
        match self.process(prompt.to_string(), ctx).await {
            Ok(text) => text,
            Err(e) => {
                error!(agent = %self.name, error = %e, "error generating response");
                String::new()
            }
        }
    }
}

#[async_trait]
impl Agent for AnalystAgent {
    async fn process(&self, input: String, context: &mut Context) -> advisor_core::Result<String> {
        let prompt = self.format_prompt(&input)?;
        context.set_stage(self.name.as_str());

        let request = CompletionRequest::builder(&self.config.model_name)
            .add_message(Message::user(prompt))
            .max_tokens(self.config.max_tokens)
            .temperature(self.config.temperature)
            .build();

        debug!(agent = %self.name, model = %self.config.model_name, "sending prompt");
        let response = self.provider.complete(request).await?;
        context.record_usage(response.usage.input_tokens, response.usage.output_tokens);

        Ok(response.text().to_string())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
