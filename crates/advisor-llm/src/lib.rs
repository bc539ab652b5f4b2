//! LLM provider abstraction for the stock advisor
//!
//! This crate provides provider-agnostic types for talking to a large language
//! model:
//!
//! - Message types for a single-turn or multi-turn conversation
//! - Completion request/response types
//! - The [`LLMProvider`] trait
//! - A Google Gemini implementation (behind the `gemini` feature, on by default)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;

pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use provider::LLMProvider;

#[cfg(feature = "gemini")]
pub mod providers;
