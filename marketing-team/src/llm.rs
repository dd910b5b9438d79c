//! Model invocation boundary.
//!
//! [`ModelProvider`] is the only thing the core knows about a language
//! model: one request in, one block of text out. [`LlmClient`] implements it
//! against the Claude Messages API; tests substitute scripted providers.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// Default model for both roles.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// A single outbound model call.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model: String,
    /// Role persona, sent as the system prompt.
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Anything that can answer a [`ModelRequest`].
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Provider name used in logs.
    fn name(&self) -> &str;

    /// Perform the call and return the raw response text.
    async fn invoke(&self, request: &ModelRequest) -> Result<String>;
}

/// A message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

/// Response from Claude API.
#[derive(Debug, Deserialize)]
pub struct ApiResponse {
    pub content: Vec<ContentBlock>,
    pub stop_reason: Option<String>,
    pub usage: Option<Usage>,
}

impl ApiResponse {
    /// Concatenate every text block.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|b| match b {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("")
    }
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Claude API client.
pub struct LlmClient {
    api_key: String,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            http: reqwest::Client::new(),
        }
    }

    /// Bound every request by `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(self)
    }

    /// Send a conversation to Claude and get a response.
    pub async fn chat(
        &self,
        model: &str,
        system: &str,
        messages: &[Message],
        temperature: f32,
        max_tokens: u32,
    ) -> Result<ApiResponse> {
        let body = serde_json::json!({
            "model": model,
            "max_tokens": max_tokens,
            "temperature": temperature,
            "system": system,
            "messages": messages,
        });

        let resp = self
            .http
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .context("Failed to call Claude API")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Claude API error {status}: {body}");
        }

        resp.json::<ApiResponse>()
            .await
            .context("Failed to parse Claude response")
    }
}

#[async_trait]
impl ModelProvider for LlmClient {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn invoke(&self, request: &ModelRequest) -> Result<String> {
        let messages = [Message {
            role: "user".to_string(),
            content: request.prompt.clone(),
        }];
        let resp = self
            .chat(
                &request.model,
                &request.system,
                &messages,
                request.temperature,
                request.max_tokens,
            )
            .await?;

        if let Some(usage) = &resp.usage {
            tracing::debug!(
                model = %request.model,
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                stop_reason = resp.stop_reason.as_deref().unwrap_or("-"),
                "Claude usage"
            );
        }

        Ok(resp.text())
    }
}
