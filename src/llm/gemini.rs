//! Google Gemini client implementation
//!
//! Implements the LlmClient trait against the `generateContent` endpoint.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};

use crate::error::{ParsegenError, Result};
use crate::llm::client::LlmClient;
use crate::llm::provider::ClientConfig;
use crate::llm::types::{CompletionRequest, CompletionResponse, Role, StopReason, Usage};

/// Gemini API base URL; the model and method are appended
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Gemini API client
pub struct GeminiClient {
    client: Client,
    api_key: String,
    config: ClientConfig,
    usage: Arc<Mutex<Usage>>,
}

impl GeminiClient {
    /// Create a client with an explicit API key
    pub fn with_api_key(api_key: String, config: ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ParsegenError::Llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            config,
            usage: Arc::new(Mutex::new(Usage::default())),
        })
    }

    /// Endpoint for a model; accepts both `gemini-2.5-pro` and `models/gemini-2.5-pro`
    fn endpoint(&self, model: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/{}:generateContent", GEMINI_API_BASE, model)
    }

    fn build_request(&self, request: &CompletionRequest) -> Value {
        let max_tokens = request.max_tokens.unwrap_or(self.config.max_tokens);

        let contents: Vec<Value> = request
            .messages
            .iter()
            .map(|m| {
                json!({
                    "role": match m.role {
                        Role::User => "user",
                    },
                    "parts": [{ "text": m.content }]
                })
            })
            .collect();

        let mut body = json!({
            "contents": contents,
            "generationConfig": { "maxOutputTokens": max_tokens }
        });

        if !request.system.is_empty() {
            body["systemInstruction"] = json!({ "parts": [{ "text": request.system }] });
        }

        body
    }

    fn parse_response(&self, body: Value) -> Result<CompletionResponse> {
        let usage = match body.get("usageMetadata") {
            Some(u) => Usage::new(
                u["promptTokenCount"].as_u64().unwrap_or(0),
                u["candidatesTokenCount"].as_u64().unwrap_or(0),
            ),
            None => Usage::default(),
        };

        self.usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .add(&usage);

        let candidate = body["candidates"]
            .as_array()
            .and_then(|c| c.first())
            .ok_or_else(|| {
                let reason = body["promptFeedback"]["blockReason"]
                    .as_str()
                    .unwrap_or("none given");
                ParsegenError::Llm(format!("response has no candidates (block reason: {})", reason))
            })?;

        let stop_reason = match candidate["finishReason"].as_str() {
            Some("MAX_TOKENS") => StopReason::MaxTokens,
            Some("SAFETY") | Some("RECITATION") | Some("BLOCKLIST") | Some("PROHIBITED_CONTENT") => {
                StopReason::Blocked
            }
            _ => StopReason::EndTurn,
        };

        let content: String = candidate["content"]["parts"]
            .as_array()
            .map(|parts| parts.iter().filter_map(|p| p["text"].as_str()).collect())
            .unwrap_or_default();

        if content.is_empty() && stop_reason == StopReason::Blocked {
            return Err(ParsegenError::Llm(format!(
                "response blocked (finish reason: {})",
                candidate["finishReason"].as_str().unwrap_or("unknown")
            )));
        }

        Ok(CompletionResponse {
            content,
            stop_reason,
            usage,
        })
    }

    async fn send_request(&self, model: &str, body: Value) -> Result<Value> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| ParsegenError::Llm(format!("Request failed: {}", e)))?;

        let status = response.status();

        if status.as_u16() == 429 {
            return Err(ParsegenError::Llm("Rate limited by Gemini API".to_string()));
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ParsegenError::Llm(format!("API error {}: {}", status, error_body)));
        }

        response
            .json()
            .await
            .map_err(|e| ParsegenError::Llm(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let model = request.model.clone().unwrap_or_else(|| self.config.model.clone());
        let body = self.build_request(&request);
        let response = self.send_request(&model, body).await?;
        self.parse_response(response)
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    fn is_ready(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn usage(&self) -> Usage {
        self.usage
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.config.model)
            .field("max_tokens", &self.config.max_tokens)
            .finish()
    }
}
