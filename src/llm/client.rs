use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::abstractive::AbstractiveSummarizer;
use super::prompts::{build_summary_prompt, SUMMARY_SYSTEM_PROMPT};
use crate::error::SummarizerError;

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";

/// Configuration for the Anthropic API client
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// API key (from ANTHROPIC_API_KEY env var)
    pub api_key: String,
    /// Model to use (MINUTES_SUMMARY_MODEL overrides the default)
    pub model: String,
    /// API root (ANTHROPIC_BASE_URL overrides the default)
    pub base_url: String,
    /// Temperature (0-1, lower = more deterministic)
    pub temperature: f64,
    /// Maximum tokens in response
    pub max_tokens: u32,
    /// Largest transcript slice, in rough tokens, sent in one request
    pub token_budget: usize,
}

impl AnthropicConfig {
    /// Create config from environment variables
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .context("ANTHROPIC_API_KEY environment variable not set")?;

        let mut config = Self::new(api_key, DEFAULT_MODEL.to_string());
        if let Ok(model) = std::env::var("MINUTES_SUMMARY_MODEL") {
            config.model = model;
        }
        if let Ok(base_url) = std::env::var("ANTHROPIC_BASE_URL") {
            config.base_url = base_url;
        }
        Ok(config)
    }

    /// Create with custom settings
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            api_key,
            model,
            base_url: DEFAULT_BASE_URL.to_string(),
            temperature: 0.1,
            max_tokens: 1024,
            token_budget: 8000,
        }
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }
}

/// Anthropic API client
pub struct AnthropicClient {
    client: Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Send a message to Claude and get a response
    pub async fn send_message(&self, system: &str, user: &str) -> Result<String> {
        let request = AnthropicRequest {
            model: self.config.model.clone(),
            max_tokens: self.config.max_tokens,
            temperature: Some(self.config.temperature),
            system: Some(system.to_string()),
            messages: vec![Message {
                role: "user".to_string(),
                content: user.to_string(),
            }],
        };

        let response = self
            .client
            .post(self.config.messages_url())
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Anthropic API")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Anthropic API error: {} - {}", status, body);
        }

        let response: AnthropicResponse = response
            .json()
            .await
            .context("Failed to parse Anthropic API response")?;

        response.first_text().context("No text content in response")
    }
}

#[async_trait]
impl AbstractiveSummarizer for AnthropicClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    fn token_budget(&self) -> usize {
        self.config.token_budget
    }

    async fn summarize(&self, text: &str) -> Result<String, SummarizerError> {
        self.send_message(SUMMARY_SYSTEM_PROMPT, &build_summary_prompt(text))
            .await
            .map_err(|e| SummarizerError::Failed(format!("{e:#}")))
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
}

impl AnthropicResponse {
    /// Text of the first text block
    fn first_text(&self) -> Option<String> {
        self.content
            .iter()
            .find(|block| block.content_type == "text")
            .map(|block| block.text.clone())
    }
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_url_tolerates_trailing_slash() {
        let mut config = AnthropicConfig::new("key".to_string(), "model".to_string());
        assert_eq!(config.messages_url(), "https://api.anthropic.com/v1/messages");
        config.base_url = "http://localhost:8080/".to_string();
        assert_eq!(config.messages_url(), "http://localhost:8080/v1/messages");
    }

    #[test]
    fn test_request_omits_empty_optionals() {
        let request = AnthropicRequest {
            model: "m".to_string(),
            max_tokens: 10,
            temperature: None,
            system: None,
            messages: vec![Message {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("temperature").is_none());
        assert!(value.get("system").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn test_first_text_skips_non_text_blocks() {
        let response: AnthropicResponse = serde_json::from_str(
            r#"{"content":[{"type":"thinking"},{"type":"text","text":"Summary."}]}"#,
        )
        .unwrap();
        assert_eq!(response.first_text().as_deref(), Some("Summary."));

        let empty: AnthropicResponse = serde_json::from_str(r#"{"content":[]}"#).unwrap();
        assert_eq!(empty.first_text(), None);
    }

    #[test]
    fn test_client_reports_its_budget() {
        let client = AnthropicClient::new(AnthropicConfig::new(
            "key".to_string(),
            "claude-test".to_string(),
        ));
        assert_eq!(client.name(), "claude-test");
        assert_eq!(client.token_budget(), 8000);
    }
}
