//! Groq Chat Completions Implementation
//!
//! Calls the OpenAI-compatible Groq endpoint
//! (https://api.groq.com/openai/v1/chat/completions) using reqwest.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{CompletionRequest, CompletionResponse, LlmConfig, LlmError, LlmService};

const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai";

/// Chat completions request body
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessageBody<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessageBody<'a> {
    role: &'a str,
    content: &'a str,
}

/// Chat completions response body
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    model: String,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: i32,
    completion_tokens: i32,
}

/// Groq API error response
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type", default)]
    error_type: Option<String>,
    message: String,
}

/// Groq LLM service implementation
pub struct GroqService {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

impl GroqService {
    /// Create a new Groq service
    pub fn new(config: LlmConfig) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            client: Client::new(),
            config,
            base_url,
        }
    }
}

/// Map a non-success status and body onto the error taxonomy
fn classify_failure(status: reqwest::StatusCode, error_body: &str) -> LlmError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return LlmError::RateLimit;
    }

    let detail = match serde_json::from_str::<ErrorResponse>(error_body) {
        Ok(parsed) => match parsed.error.error_type {
            Some(kind) => format!("{}: {}", kind, parsed.error.message),
            None => parsed.error.message,
        },
        Err(_) => format!("Groq API returned {}: {}", status, error_body),
    };

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        LlmError::Authentication(detail)
    } else {
        LlmError::Response(detail)
    }
}

#[async_trait::async_trait]
impl LlmService for GroqService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let model = if request.model.is_empty() {
            self.config.default_model.as_str()
        } else {
            request.model.as_str()
        };

        let max_tokens = request.max_tokens.unwrap_or(self.config.max_tokens);

        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = request.system_prompt.as_deref() {
            messages.push(ChatMessageBody {
                role: "system",
                content: system,
            });
        }
        messages.extend(request.messages.iter().map(|m| ChatMessageBody {
            role: m.role.as_str(),
            content: &m.content,
        }));

        let body = ChatCompletionRequest {
            model,
            max_tokens,
            messages,
        };

        let url = format!("{}/v1/chat/completions", self.base_url);

        tracing::debug!(model = %model, max_tokens = %max_tokens, "Sending Groq API request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Request(format!("HTTP request failed: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            let err = classify_failure(status, &error_body);
            tracing::warn!(status = %status, error = %err, "Groq API request failed");
            return Err(err);
        }

        let api_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Response(format!("Failed to parse response: {}", e)))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::Response("Response contained no choices".to_string()))?;

        let (input_tokens, output_tokens) = api_response
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or((0, 0));

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            model: api_response.model,
            input_tokens,
            output_tokens,
            stop_reason: choice.finish_reason.unwrap_or_else(|| "stop".to_string()),
        })
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}
