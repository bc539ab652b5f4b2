//! Google Gemini provider implementation
//!
//! This module implements the LLMProvider trait for Gemini models through the
//! Generative Language API.
//! See: https://ai.google.dev/api/generate-content
//!
//! # Example
//!
//! ```no_run
//! use advisor_llm::{CompletionRequest, LLMProvider, Message};
//! use advisor_llm::providers::GeminiProvider;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GeminiProvider::from_env()?;
//!
//!     let request = CompletionRequest::builder("gemini-2.0-flash-exp")
//!         .add_message(Message::user("Summarize the outlook for AAPL"))
//!         .max_tokens(512)
//!         .build();
//!
//!     let response = provider.complete(request).await?;
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, Role,
    StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the Gemini provider
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key sent as `x-goog-api-key`
    pub api_key: String,

    /// Base URL of the Generative Language API
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,
}

impl GeminiConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_GEMINI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Create config from environment variables
    ///
    /// Reads the API key from `GOOGLE_API_KEY` and an optional base URL from
    /// `GEMINI_API_BASE`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                LLMError::ConfigurationError(
                    "GOOGLE_API_KEY environment variable not set".to_string(),
                )
            })?;

        let mut config = Self::new(api_key);
        if let Ok(base) = std::env::var("GEMINI_API_BASE") {
            config.api_base = base;
        }
        Ok(config)
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Google Gemini provider
pub struct GeminiProvider {
    client: Client,
    config: GeminiConfig,
}

impl GeminiProvider {
    /// Create a provider with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(GeminiConfig::new(api_key))
    }

    /// Create a provider from a full configuration
    pub fn with_config(config: GeminiConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(LLMError::ConfigurationError(
                "Gemini API key must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a provider from environment variables
    pub fn from_env() -> Result<Self> {
        Self::with_config(GeminiConfig::from_env()?)
    }

    /// Get the provider configuration
    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    fn endpoint(&self, model: &str) -> String {
        format!(
            "{}/models/{model}:generateContent",
            self.config.api_base.trim_end_matches('/')
        )
    }
}

#[async_trait]
impl LLMProvider for GeminiProvider {
    #[instrument(skip(self, request), fields(model = %request.model))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending request to Gemini API");

        let model = request.model.clone();
        let body = GeminiRequest::from(request);

        let response = self
            .client
            .post(self.endpoint(&model))
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response.text().await?;
            return Err(map_error_status(status, error_text, &model));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        convert_response(gemini_response)
    }

    fn name(&self) -> &'static str {
        "gemini"
    }
}

fn map_error_status(status: u16, error_text: String, model: &str) -> LLMError {
    match status {
        400 if error_text.contains("API_KEY_INVALID") => {
            LLMError::AuthenticationFailed(error_text)
        }
        401 | 403 => LLMError::AuthenticationFailed(error_text),
        429 => LLMError::RateLimitExceeded(error_text),
        400 => LLMError::InvalidRequest(error_text),
        404 => LLMError::ModelNotFound(model.to_string()),
        _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
    }
}

fn convert_response(response: GeminiResponse) -> Result<CompletionResponse> {
    let usage = response.usage_metadata.unwrap_or_default();

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(LLMError::UnexpectedResponse(format!(
            "Gemini returned no text: {reason}"
        )));
    };

    let finish_reason = candidate.finish_reason.unwrap_or_default();
    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(LLMError::UnexpectedResponse(format!(
            "Gemini candidate has no text (finish reason: {finish_reason})"
        )));
    }

    debug!(
        "Received response - finish_reason: {}, tokens: {}/{}",
        finish_reason, usage.prompt_token_count, usage.candidates_token_count
    );

    Ok(CompletionResponse {
        message: Message::assistant(text),
        stop_reason: match finish_reason.as_str() {
            "STOP" => StopReason::EndTurn,
            "MAX_TOKENS" => StopReason::MaxTokens,
            other => {
                debug!("Unmapped finish reason: {}", other);
                StopReason::EndTurn
            }
        },
        usage: TokenUsage {
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
        },
    })
}

// Gemini-specific request/response types
// These match the Generative Language API format

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
}

impl From<CompletionRequest> for GeminiRequest {
    fn from(request: CompletionRequest) -> Self {
        let contents = request
            .messages
            .into_iter()
            .map(|m| GeminiContent {
                role: Some(
                    match m.role {
                        Role::User => "user",
                        Role::Assistant => "model",
                    }
                    .to_string(),
                ),
                parts: vec![GeminiPart {
                    text: Some(m.content),
                }],
            })
            .collect();

        Self {
            contents,
            system_instruction: request.system.map(|s| GeminiContent {
                role: None,
                parts: vec![GeminiPart { text: Some(s) }],
            }),
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
                stop_sequences: request.stop_sequences,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_provider_creation() {
        let provider = GeminiProvider::new("test-key");
        assert!(provider.is_ok());
        assert_eq!(provider.unwrap().name(), "gemini");
    }

    #[test]
    fn test_empty_key_rejected() {
        assert!(matches!(
            GeminiProvider::new("  "),
            Err(LLMError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_endpoint_trims_trailing_slash() {
        let provider = GeminiProvider::with_config(
            GeminiConfig::new("k").with_api_base("http://localhost:8080/v1beta/"),
        )
        .unwrap();
        assert_eq!(
            provider.endpoint("gemini-2.0-flash-exp"),
            "http://localhost:8080/v1beta/models/gemini-2.0-flash-exp:generateContent"
        );
    }

    #[test]
    fn test_request_serialization() {
        let request = CompletionRequest::builder("gemini-2.0-flash-exp")
            .add_message(Message::user("Analyze AAPL"))
            .add_message(Message::assistant("Sure"))
            .system("Be brief")
            .max_tokens(2048)
            .temperature(0.4)
            .build();

        let body = serde_json::to_value(GeminiRequest::from(request)).unwrap();
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][0]["parts"][0]["text"], "Analyze AAPL");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "Be brief");
        assert!(body["systemInstruction"].get("role").is_none());
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 2048);
        assert!(body["generationConfig"].get("stopSequences").is_none());
    }

    #[test]
    fn test_convert_response_joins_parts() {
        let raw = json!({
            "candidates": [{
                "content": {
                    "role": "model",
                    "parts": [{"text": "Overall: "}, {"text": "Hold"}]
                },
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": 42,
                "candidatesTokenCount": 7,
                "totalTokenCount": 49
            }
        });

        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        let converted = convert_response(response).unwrap();
        assert_eq!(converted.text(), "Overall: Hold");
        assert_eq!(converted.stop_reason, StopReason::EndTurn);
        assert_eq!(converted.usage.input_tokens, 42);
        assert_eq!(converted.usage.output_tokens, 7);
    }

    #[test]
    fn test_convert_response_max_tokens() {
        let raw = json!({
            "candidates": [{
                "content": {"parts": [{"text": "truncated"}]},
                "finishReason": "MAX_TOKENS"
            }]
        });

        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        let converted = convert_response(response).unwrap();
        assert_eq!(converted.stop_reason, StopReason::MaxTokens);
        assert_eq!(converted.usage.total(), 0);
    }

    #[test]
    fn test_blocked_prompt_is_error() {
        let raw = json!({
            "promptFeedback": {"blockReason": "SAFETY"}
        });

        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        match convert_response(response) {
            Err(LLMError::UnexpectedResponse(msg)) => assert!(msg.contains("SAFETY")),
            other => panic!("Expected UnexpectedResponse, got {other:?}"),
        }
    }

    #[test]
    fn test_candidate_without_text_is_error() {
        let raw = json!({
            "candidates": [{"finishReason": "SAFETY"}]
        });

        let response: GeminiResponse = serde_json::from_value(raw).unwrap();
        assert!(matches!(
            convert_response(response),
            Err(LLMError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_error_status_mapping() {
        assert!(matches!(
            map_error_status(400, "reason: API_KEY_INVALID".to_string(), "m"),
            LLMError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            map_error_status(400, "bad field".to_string(), "m"),
            LLMError::InvalidRequest(_)
        ));
        assert!(matches!(
            map_error_status(403, String::new(), "m"),
            LLMError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            map_error_status(429, String::new(), "m"),
            LLMError::RateLimitExceeded(_)
        ));
        match map_error_status(404, String::new(), "gemini-9") {
            LLMError::ModelNotFound(model) => assert_eq!(model, "gemini-9"),
            other => panic!("Expected ModelNotFound, got {other:?}"),
        }
        assert!(matches!(
            map_error_status(503, String::new(), "m"),
            LLMError::RequestFailed(_)
        ));
    }

    mod http {
        use super::*;
        use wiremock::matchers::{body_partial_json, header, method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        const MODEL: &str = "gemini-2.0-flash-exp";
        const ENDPOINT: &str = "/v1beta/models/gemini-2.0-flash-exp:generateContent";

        fn provider(server: &MockServer) -> GeminiProvider {
            GeminiProvider::with_config(
                GeminiConfig::new("secret-key")
                    .with_api_base(format!("{}/v1beta", server.uri()))
                    .with_timeout(5),
            )
            .unwrap()
        }

        fn request() -> CompletionRequest {
            CompletionRequest::builder(MODEL)
                .system("Be brief")
                .add_message(Message::user("Outlook for AAPL?"))
                .max_tokens(256)
                .temperature(0.4)
                .build()
        }

        #[tokio::test]
        async fn test_complete_over_http() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path(ENDPOINT))
                .and(header("x-goog-api-key", "secret-key"))
                .and(body_partial_json(json!({
                    "contents": [{"role": "user", "parts": [{"text": "Outlook for AAPL?"}]}],
                    "generationConfig": {"maxOutputTokens": 256}
                })))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "candidates": [{
                        "content": {"role": "model", "parts": [{"text": "Hold"}]},
                        "finishReason": "STOP"
                    }],
                    "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 3}
                })))
                .expect(1)
                .mount(&server)
                .await;

            let response = provider(&server).complete(request()).await.unwrap();
            assert_eq!(response.text(), "Hold");
            assert_eq!(response.stop_reason, StopReason::EndTurn);
            assert_eq!(response.usage.input_tokens, 12);
            assert_eq!(response.usage.output_tokens, 3);
        }

        fn kind(err: &LLMError) -> &'static str {
            match err {
                LLMError::AuthenticationFailed(_) => "auth",
                LLMError::RateLimitExceeded(_) => "rate",
                LLMError::ModelNotFound(_) => "model",
                LLMError::InvalidRequest(_) => "invalid",
                LLMError::RequestFailed(_) => "failed",
                _ => "other",
            }
        }

        #[tokio::test]
        async fn test_error_statuses_over_http() {
            for (status, expected) in [
                (403_u16, "auth"),
                (429, "rate"),
                (404, "model"),
                (400, "invalid"),
                (500, "failed"),
            ] {
                let server = MockServer::start().await;
                Mock::given(method("POST"))
                    .and(path(ENDPOINT))
                    .respond_with(ResponseTemplate::new(status).set_body_string(r#"{"error":{}}"#))
                    .mount(&server)
                    .await;

                let err = provider(&server).complete(request()).await.unwrap_err();
                assert_eq!(kind(&err), expected, "status {status} mapped to {err:?}");
            }
        }

        #[tokio::test]
        async fn test_blocked_prompt_over_http() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path(ENDPOINT))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "promptFeedback": {"blockReason": "SAFETY"}
                })))
                .mount(&server)
                .await;

            let err = provider(&server).complete(request()).await.unwrap_err();
            assert!(matches!(err, LLMError::UnexpectedResponse(ref m) if m.contains("SAFETY")));
        }
    }
}
