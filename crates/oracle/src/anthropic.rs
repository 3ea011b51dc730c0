use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::OracleError;
use crate::ReasoningOracle;

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
pub const DEFAULT_API_BASE: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    pub model: String,
    pub api_base: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl Default for ClaudeConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            temperature: 0.0,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Oracle backed by the Anthropic Messages API.
pub struct ClaudeOracle {
    client: Client,
    config: ClaudeConfig,
}

impl ClaudeOracle {
    pub fn new(config: ClaudeConfig) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| OracleError::request(format!("failed to build HTTP client: {err}")))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl ReasoningOracle for ClaudeOracle {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, OracleError> {
        let body = ClaudeRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            max_tokens,
            messages: vec![ClaudeMessage {
                role: "user",
                content: vec![ClaudeContent {
                    _type: "text",
                    text: prompt,
                }],
            }],
        };

        let url = format!("{}/messages", self.config.api_base.trim_end_matches('/'));
        debug!(model = %self.config.model, max_tokens, prompt_len = prompt.len(), "querying claude");

        let response = self
            .client
            .post(url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|err| OracleError::request(format!("claude request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<response unavailable>".to_string());
            return Err(OracleError::request(format!(
                "claude returned {}: {}",
                status, text
            )));
        }

        let response: ClaudeResponse = response
            .json()
            .await
            .map_err(|err| OracleError::malformed("completion", err.to_string()))?;

        let content = response
            .content
            .iter()
            .filter(|part| part._type == "text")
            .filter_map(|part| part.text.as_deref())
            .collect::<Vec<_>>()
            .join("\n");

        if content.is_empty() {
            return Err(OracleError::malformed(
                "completion",
                "claude response missing text content",
            ));
        }
        Ok(content)
    }
}

#[derive(Debug, Serialize)]
struct ClaudeRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ClaudeMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage<'a> {
    role: &'a str,
    content: Vec<ClaudeContent<'a>>,
}

#[derive(Debug, Serialize)]
struct ClaudeContent<'a> {
    #[serde(rename = "type")]
    _type: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponseContent {
    #[serde(rename = "type")]
    _type: String,
    #[serde(default)]
    text: Option<String>,
}
