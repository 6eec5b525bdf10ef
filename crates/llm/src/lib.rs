//! LLM service: Groq chat completions integration
//!
//! Provides the `LlmService` trait used by the conversation domain, the Groq
//! implementation, and a deterministic mock selected with `LLM_PROVIDER=mock`.

pub mod groq;
pub mod mock;

use serde::{Deserialize, Serialize};
use std::env;

pub use groq::GroqService;
pub use mock::MockLlmService;

/// Default model served by Groq
pub const DEFAULT_MODEL: &str = "openai/gpt-oss-20b";

/// Default completion budget
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Errors from a completion call
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM configuration error: {0}")]
    Configuration(String),

    #[error("LLM request failed: {0}")]
    Request(String),

    #[error("LLM authentication failed: {0}")]
    Authentication(String),

    #[error("LLM rate limit exceeded")]
    RateLimit,

    #[error("LLM response error: {0}")]
    Response(String),
}

/// Role of a message sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    User,
    Assistant,
}

impl LlmRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmRole::User => "user",
            LlmRole::Assistant => "assistant",
        }
    }
}

/// One message of a completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

impl LlmMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: LlmRole::User,
            content: content.into(),
        }
    }
}

/// Provider-neutral completion request
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    /// Empty means the service's default model
    pub model: String,
    pub system_prompt: Option<String>,
    pub messages: Vec<LlmMessage>,
    pub max_tokens: Option<u32>,
}

/// Provider-neutral completion response
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub stop_reason: String,
}

/// A hosted text-generation service
#[async_trait::async_trait]
pub trait LlmService: Send + Sync {
    /// Run one completion
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model used when the request leaves `model` empty
    fn default_model(&self) -> &str;
}

/// Which provider backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    Groq,
    Mock,
}

impl std::str::FromStr for LlmProvider {
    type Err = LlmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" => Ok(LlmProvider::Groq),
            "mock" => Ok(LlmProvider::Mock),
            other => Err(LlmError::Configuration(format!(
                "Unknown LLM_PROVIDER '{}'",
                other
            ))),
        }
    }
}

/// LLM configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub api_key: String,
    pub default_model: String,
    pub max_tokens: u32,
    /// Overrides the provider's public endpoint
    pub base_url: Option<String>,
}

impl LlmConfig {
    /// Load configuration from environment variables.
    ///
    /// `GROQ_API_KEY` is required unless `LLM_PROVIDER=mock`.
    pub fn from_env() -> Result<Self, LlmError> {
        dotenvy::dotenv().ok();

        let provider = env::var("LLM_PROVIDER")
            .unwrap_or_else(|_| "groq".to_string())
            .parse::<LlmProvider>()?;

        let api_key = match provider {
            LlmProvider::Groq => env::var("GROQ_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| LlmError::Configuration("GROQ_API_KEY is required".to_string()))?,
            LlmProvider::Mock => env::var("GROQ_API_KEY").unwrap_or_default(),
        };

        let max_tokens = match env::var("LLM_MAX_TOKENS") {
            Ok(raw) => raw.parse().map_err(|_| {
                LlmError::Configuration("LLM_MAX_TOKENS must be a positive integer".to_string())
            })?,
            Err(_) => DEFAULT_MAX_TOKENS,
        };

        Ok(Self {
            provider,
            api_key,
            default_model: env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            max_tokens,
            base_url: env::var("LLM_BASE_URL").ok(),
        })
    }
}

/// Builds the configured `LlmService`
pub struct LlmServiceFactory;

impl LlmServiceFactory {
    pub fn create(config: LlmConfig) -> Box<dyn LlmService> {
        match config.provider {
            LlmProvider::Groq => {
                tracing::info!(model = %config.default_model, "Using Groq LLM service");
                Box::new(GroqService::new(config))
            }
            LlmProvider::Mock => {
                tracing::info!("Using mock LLM service");
                Box::new(MockLlmService::new())
            }
        }
    }
}
