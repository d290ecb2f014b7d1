//! OpenAI-compatible chat completions backend
//!
//! Talks to `{base_url}/chat/completions`. Works against OpenAI itself and any
//! gateway exposing the same request and response shape.

use crate::LlmError;
use crate::http_client::HttpClient;
use crate::types::{LlmBackend, LlmInvocation, LlmResult, Message, Role};
use async_trait::async_trait;
use loadbroker_config::{
    Config, DEFAULT_ADVISORY_API_KEY_ENV, DEFAULT_ADVISORY_BASE_URL, DEFAULT_ADVISORY_MAX_TOKENS,
    DEFAULT_ADVISORY_MODEL, DEFAULT_ADVISORY_TEMPERATURE,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub(crate) const PROVIDER_NAME: &str = "openai";

/// Advisory calls sit on the negotiation hot path and are never retried
const ADVISORY_MAX_RETRIES: u32 = 0;

#[derive(Clone)]
pub(crate) struct OpenAiBackend {
    client: HttpClient,
    endpoint: String,
    api_key: String,
    default_model: String,
    default_params: HttpParams,
}

/// HTTP request parameters
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HttpParams {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for HttpParams {
    fn default() -> Self {
        Self {
            max_tokens: DEFAULT_ADVISORY_MAX_TOKENS,
            temperature: DEFAULT_ADVISORY_TEMPERATURE,
        }
    }
}

impl OpenAiBackend {
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the HTTP client cannot be constructed
    pub fn new(
        api_key: String,
        base_url: &str,
        default_model: String,
        default_params: HttpParams,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: HttpClient::new(ADVISORY_MAX_RETRIES)?,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
            default_model,
            default_params,
        })
    }

    /// Create a backend from the `[advisory]` section.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::Misconfiguration` if the API key environment variable is
    /// unset or empty, or the HTTP client cannot be constructed
    pub fn new_from_config(config: &Config) -> Result<Self, LlmError> {
        let advisory = &config.advisory;
        let api_key_env = advisory
            .api_key_env
            .as_deref()
            .unwrap_or(DEFAULT_ADVISORY_API_KEY_ENV);

        let api_key = std::env::var(api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                LlmError::Misconfiguration(format!(
                    "API key not found in environment variable '{}'. \
                     Set this variable or configure a different api_key_env in [advisory].",
                    api_key_env
                ))
            })?;

        let base_url = advisory
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_ADVISORY_BASE_URL);

        let default_model = advisory
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_ADVISORY_MODEL.to_string());

        let default_params = HttpParams {
            max_tokens: advisory.max_tokens.unwrap_or(DEFAULT_ADVISORY_MAX_TOKENS),
            temperature: advisory
                .temperature
                .unwrap_or(DEFAULT_ADVISORY_TEMPERATURE),
        };

        Self::new(api_key, base_url, default_model, default_params)
    }

    /// Resolve parameters for this invocation
    ///
    /// `inv.model` and `inv.metadata["max_tokens" | "temperature"]` override the
    /// backend defaults.
    fn resolve_params(&self, inv: &LlmInvocation) -> (String, HttpParams) {
        let model = if inv.model.is_empty() {
            self.default_model.clone()
        } else {
            inv.model.clone()
        };

        let max_tokens = inv
            .metadata
            .get("max_tokens")
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
            .unwrap_or(self.default_params.max_tokens);

        let temperature = inv
            .metadata
            .get("temperature")
            .and_then(|v| v.as_f64())
            .map(|v| v as f32)
            .unwrap_or(self.default_params.temperature);

        (
            model,
            HttpParams {
                max_tokens,
                temperature,
            },
        )
    }

    fn convert_messages(messages: &[Message]) -> Vec<ChatMessage> {
        messages
            .iter()
            .map(|msg| ChatMessage {
                role: match msg.role {
                    Role::System => "system".to_string(),
                    Role::User => "user".to_string(),
                    Role::Assistant => "assistant".to_string(),
                },
                content: msg.content.clone(),
            })
            .collect()
    }
}

#[async_trait]
impl LlmBackend for OpenAiBackend {
    async fn invoke(&self, inv: LlmInvocation) -> Result<LlmResult, LlmError> {
        let (model, params) = self.resolve_params(&inv);

        debug!(
            provider = PROVIDER_NAME,
            model = %model,
            max_tokens = params.max_tokens,
            temperature = params.temperature,
            timeout_ms = inv.timeout.as_millis() as u64,
            "Invoking advisory backend"
        );

        let request_body = ChatRequest {
            model: model.clone(),
            messages: Self::convert_messages(&inv.messages),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            response_format: ResponseFormat {
                kind: "json_object".to_string(),
            },
        };

        let request = self
            .client
            .inner()
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body);

        let response = self
            .client
            .execute_with_retry(request, inv.timeout, PROVIDER_NAME)
            .await?;

        let response_body: ChatResponse = response.json().await.map_err(|e| {
            LlmError::InvalidResponse(format!("Failed to parse chat completion: {}", e))
        })?;

        let choice = response_body.choices.into_iter().next().ok_or_else(|| {
            LlmError::InvalidResponse("chat completion missing choices[0]".to_string())
        })?;

        let content = choice.message.content.ok_or_else(|| {
            LlmError::InvalidResponse("chat completion missing content in choices[0]".to_string())
        })?;

        let mut result = LlmResult::new(content, PROVIDER_NAME, model);
        if let Some(usage) = response_body.usage {
            result = result.with_tokens(usage.prompt_tokens, usage.completion_tokens);
        }

        debug!(
            provider = PROVIDER_NAME,
            tokens_input = ?result.tokens_input,
            tokens_output = ?result.tokens_output,
            "Advisory invocation completed"
        );

        Ok(result)
    }
}

#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Clone, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct Choice {
    message: ChatResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<Usage>,
}
