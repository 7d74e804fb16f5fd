use crate::llm_provider::*;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Configuration for OpenAI provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// API key for OpenAI
    pub api_key: String,
    /// Base URL for API (default: https://api.openai.com/v1)
    pub base_url: String,
    /// Model to use (e.g., "gpt-4.1-mini", "gpt-5-mini")
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Optional reasoning effort (for reasoning models)
    pub reasoning_effort: Option<String>,
    /// Name reported by `provider_name`
    pub provider_name: String,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: OPENAI_API_BASE.to_string(),
            model: String::new(),
            timeout_secs: 120,
            reasoning_effort: None,
            provider_name: "openai".to_string(),
        }
    }
}

/// OpenAI LLM provider using the Responses API.
///
/// A single request is made per call; failures are returned to the caller
/// without retrying.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// Create a new OpenAI provider
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(anyhow!(
                "OpenAI API key is required. Set OPENAI_API_KEY environment variable."
            ));
        }
        if config.model.is_empty() {
            return Err(anyhow!(
                "OpenAI model is required. Set OPENAI_MODEL environment variable."
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { config, client })
    }

    /// Check if this is a reasoning model
    fn is_reasoning_model(&self) -> bool {
        let model = self.config.model.to_lowercase();
        model.starts_with("gpt-5") || model.starts_with('o')
    }

    fn build_request(&self, messages: &[Message], config: &GenerationConfig) -> OpenAIRequest {
        let instructions = messages
            .iter()
            .find(|m| matches!(m.role, MessageRole::System))
            .map(|m| m.content.clone());

        let conversation: Vec<&Message> = messages
            .iter()
            .filter(|m| !matches!(m.role, MessageRole::System))
            .collect();

        // A lone user message is sent verbatim; histories keep role prefixes
        let input = match conversation.as_slice() {
            [only] if only.role == MessageRole::User => only.content.clone(),
            _ => conversation
                .iter()
                .map(|m| format!("{}: {}", m.role, m.content))
                .collect::<Vec<_>>()
                .join("\n\n"),
        };

        let text = config
            .response_format
            .clone()
            .map(|rf| TextConfig { format: rf.into() });

        let mut request = OpenAIRequest {
            model: self.config.model.clone(),
            input,
            instructions,
            max_output_tokens: config.max_output_tokens,
            reasoning: None,
            temperature: None,
            text,
        };

        // Only add sampling parameters for non-reasoning models
        if self.is_reasoning_model() {
            request.reasoning = config
                .reasoning_effort
                .clone()
                .or_else(|| self.config.reasoning_effort.clone())
                .map(|effort| Reasoning { effort });
        } else {
            request.temperature = Some(config.temperature);
        }

        request
    }

    /// Send a single request to the Responses API
    async fn send_request(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<OpenAIResponse> {
        let request = self.build_request(messages, config);

        let response = self
            .client
            .post(format!(
                "{}/responses",
                self.config.base_url.trim_end_matches('/')
            ))
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to OpenAI Responses API")?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());

            return Err(anyhow!("OpenAI API error ({}): {}", status, error_text));
        }

        let response_text = response
            .text()
            .await
            .context("Failed to read OpenAI Responses API response body")?;

        tracing::debug!(
            model = %self.config.model,
            response = %response_text,
            "Raw OpenAI Responses API response"
        );

        serde_json::from_str::<OpenAIResponse>(&response_text).context(format!(
            "Failed to parse OpenAI Responses API response. Raw response: {}",
            response_text
        ))
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    async fn generate_chat(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> LLMResult<LLMResponse> {
        let start = Instant::now();
        let response = self.send_request(messages, config).await?;

        if let Some(error) = &response.error {
            return Err(anyhow!("OpenAI response reported an error: {}", error));
        }

        // output[{type: "message", content: [{type: "output_text", text: "..."}]}]
        let content = response
            .output
            .iter()
            .filter(|item| item.output_type == "message")
            .flat_map(|item| &item.content)
            .filter(|c| c.content_type == "output_text")
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("");

        if content.is_empty() {
            let refusal = response
                .output
                .iter()
                .flat_map(|item| &item.content)
                .find(|c| c.content_type == "refusal")
                .and_then(|c| c.refusal.clone());
            return Err(match refusal {
                Some(reason) => anyhow!("Model refused the request: {}", reason),
                None => anyhow!(
                    "OpenAI response contained no output text (status: {})",
                    response.status.as_deref().unwrap_or("unknown")
                ),
            });
        }

        tracing::debug!(
            model = %self.config.model,
            elapsed_ms = start.elapsed().as_millis() as u64,
            total_tokens = ?response.usage.as_ref().map(|u| u.total_tokens),
            "OpenAI response received"
        );

        Ok(LLMResponse {
            content,
            total_tokens: response.usage.as_ref().map(|u| u.total_tokens),
            prompt_tokens: response.usage.as_ref().map(|u| u.input_tokens),
            completion_tokens: response.usage.as_ref().map(|u| u.output_tokens),
            finish_reason: response.status.clone(),
            model: self.config.model.clone(),
        })
    }

    fn provider_name(&self) -> &str {
        &self.config.provider_name
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

// OpenAI Responses API request/response types

#[derive(Debug, Serialize)]
struct Reasoning {
    effort: String,
}

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    input: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<Reasoning>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    /// OpenAI Responses API uses text.format instead of response_format
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<TextConfig>,
}

/// OpenAI Responses API text format - flattened structure
/// OpenAI expects: {"type": "json_schema", "name": "...", "schema": {...}, "strict": true}
/// NOT: {"type": "json_schema", "json_schema": {...}}
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum OpenAITextFormat {
    Text,
    JsonObject,
    JsonSchema {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        schema: serde_json::Value,
        strict: bool,
    },
}

impl From<ResponseFormat> for OpenAITextFormat {
    fn from(rf: ResponseFormat) -> Self {
        match rf {
            ResponseFormat::Text => OpenAITextFormat::Text,
            ResponseFormat::JsonObject => OpenAITextFormat::JsonObject,
            ResponseFormat::JsonSchema { json_schema } => OpenAITextFormat::JsonSchema {
                name: json_schema.name,
                description: json_schema.description,
                schema: json_schema.schema,
                strict: json_schema.strict,
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct TextConfig {
    format: OpenAITextFormat,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    error: Option<serde_json::Value>,
    #[serde(default)]
    output: Vec<OutputItem>,
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(rename = "type")]
    output_type: String,
    #[serde(default)]
    content: Vec<OutputContent>,
}

#[derive(Debug, Deserialize)]
struct OutputContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    input_tokens: usize,
    output_tokens: usize,
    total_tokens: usize,
}
