//! Google Gemini API client implementation
//!
//! Implements the LlmClient trait for the Generative Language API's
//! `generateContent` endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::retry::{RetryPolicy, send_with_retry};
use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, Role, StopReason, TokenUsage};
use crate::config::LlmConfig;

/// Retries for transient statuses; a 429 without `retry-after` is retried too
const RETRY: RetryPolicy = RetryPolicy {
    max_retries: 3,
    initial_backoff: Duration::from_millis(1000),
    retryable: &[408, 429, 500, 502, 503, 504],
    default_retry_after: None,
};

/// Gemini API client
pub struct GeminiClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
    retry: RetryPolicy,
}

impl GeminiClient {
    /// Create a new client from configuration
    ///
    /// Reads the API key from the environment variable named in config.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        debug!(model = %config.model, base_url = %config.base_url, "from_config: called");
        let api_key = config
            .get_api_key()
            .map_err(|_| LlmError::MissingApiKey(config.api_key_env.clone()))?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
            max_tokens: config.max_tokens,
            retry: RETRY,
        })
    }

    /// Override the first retry delay (doubles on each further attempt)
    pub fn with_initial_backoff(mut self, backoff: Duration) -> Self {
        self.retry.initial_backoff = backoff;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Build the request body for the Gemini API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");
        let contents: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|msg| {
                let role = match msg.role {
                    Role::User => "user",
                    Role::Assistant => "model",
                };
                serde_json::json!({
                    "role": role,
                    "parts": [{ "text": msg.content }],
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": request.max_tokens.min(self.max_tokens),
            },
        });

        if !request.system_prompt.trim().is_empty() {
            body["systemInstruction"] = serde_json::json!({
                "parts": [{ "text": request.system_prompt }],
            });
        }

        body
    }

    /// Parse the Gemini API response
    fn parse_response(&self, api_response: GeminiResponse) -> CompletionResponse {
        let usage = api_response
            .usage_metadata
            .map(|u| TokenUsage {
                input_tokens: u.prompt_token_count,
                output_tokens: u.candidates_token_count,
            })
            .unwrap_or_default();

        let Some(candidate) = api_response.candidates.into_iter().next() else {
            let blocked = api_response.prompt_feedback.and_then(|f| f.block_reason);
            debug!(?blocked, "parse_response: no candidates");
            return CompletionResponse {
                content: None,
                stop_reason: if blocked.is_some() { StopReason::Safety } else { StopReason::EndTurn },
                usage,
            };
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        CompletionResponse {
            content: if text.is_empty() { None } else { Some(text) },
            stop_reason: candidate
                .finish_reason
                .as_deref()
                .map(StopReason::from_gemini)
                .unwrap_or(StopReason::EndTurn),
            usage,
        }
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "complete: called");
        let url = self.endpoint();
        let body = self.build_request_body(&request);

        let response = send_with_retry(&self.retry, || {
            self.http
                .post(url.as_str())
                .header("x-goog-api-key", self.api_key.as_str())
                .json(&body)
        })
        .await?;

        let api_response: GeminiResponse = response.json().await?;
        Ok(self.parse_response(api_response))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// Gemini API response types

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    prompt_feedback: Option<GeminiPromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiPromptFeedback {
    block_reason: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Message;

    fn test_client(max_tokens: u32) -> GeminiClient {
        GeminiClient {
            model: "gemini-2.5-flash".to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://generativelanguage.googleapis.com".to_string(),
            http: Client::new(),
            max_tokens,
            retry: RETRY,
        }
    }

    #[test]
    fn test_endpoint() {
        assert_eq!(
            test_client(8192).endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_build_request_body_basic() {
        let request = CompletionRequest {
            system_prompt: "You are a BA".to_string(),
            messages: vec![Message::user("Hello"), Message::assistant("Hi"), Message::user("Again")],
            max_tokens: 1000,
        };

        let body = test_client(8192).build_request_body(&request);

        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "You are a BA");
        assert_eq!(body["contents"][0]["role"], "user");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][2]["parts"][0]["text"], "Again");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1000);
    }

    #[test]
    fn test_blank_system_prompt_is_omitted() {
        let body = test_client(8192).build_request_body(&CompletionRequest::single("", "Hello", 10));
        assert!(body.get("systemInstruction").is_none());
    }

    #[test]
    fn test_max_tokens_capped() {
        let body = test_client(1000).build_request_body(&CompletionRequest::single("s", "u", 5000));
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1000);
    }

    #[test]
    fn test_parse_response_joins_text_parts() {
        let json = serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "I. A\n" }, { "text": "II. B" }] },
                "finishReason": "STOP"
            }],
            "usageMetadata": { "promptTokenCount": 12, "candidatesTokenCount": 34, "totalTokenCount": 46 }
        });
        let api_response: GeminiResponse = serde_json::from_value(json).unwrap();

        let response = test_client(8192).parse_response(api_response);
        assert_eq!(response.content.as_deref(), Some("I. A\nII. B"));
        assert_eq!(response.stop_reason, StopReason::EndTurn);
        assert_eq!(response.usage.input_tokens, 12);
        assert_eq!(response.usage.output_tokens, 34);
    }

    #[test]
    fn test_parse_response_blocked_prompt() {
        let json = serde_json::json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let api_response: GeminiResponse = serde_json::from_value(json).unwrap();

        let response = test_client(8192).parse_response(api_response);
        assert!(response.content.is_none());
        assert_eq!(response.stop_reason, StopReason::Safety);
    }
}
