//! Offline stand-in for Groq
//!
//! Selected with `LLM_PROVIDER=mock`. It answers the way Groq's chat
//! completions endpoint would, without a network call or an API key: same
//! default model, finish reasons `stop`/`length`, and a 400-style failure for
//! a request with no messages. The answer repeats the question it was asked.

use crate::{CompletionRequest, CompletionResponse, LlmError, LlmService, DEFAULT_MODEL};

/// Marks the question line of a rendered prompt
const QUESTION_PREFIX: &str = "Question: ";

#[derive(Debug, Clone, Default)]
pub struct MockLlmService;

impl MockLlmService {
    pub fn new() -> Self {
        Self
    }
}

/// The last `Question:` line of a prompt, or the whole prompt when it has none
fn question_of(prompt: &str) -> &str {
    prompt
        .lines()
        .rev()
        .find_map(|line| line.strip_prefix(QUESTION_PREFIX))
        .unwrap_or(prompt)
        .trim()
}

fn count_tokens(text: &str) -> i32 {
    text.split_whitespace().count() as i32
}

#[async_trait::async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let last = request
            .messages
            .last()
            .ok_or_else(|| LlmError::Request("messages must not be empty".to_string()))?;

        let model = if request.model.is_empty() {
            DEFAULT_MODEL.to_string()
        } else {
            request.model.clone()
        };

        let answer = format!("Mock answer: {}", question_of(&last.content));
        let words: Vec<&str> = answer.split_whitespace().collect();
        let (content, stop_reason) = match request.max_tokens {
            Some(limit) if words.len() > limit as usize => {
                (words[..limit as usize].join(" "), "length")
            }
            _ => (answer.clone(), "stop"),
        };

        let input_tokens = request
            .system_prompt
            .iter()
            .map(String::as_str)
            .chain(request.messages.iter().map(|m| m.content.as_str()))
            .map(count_tokens)
            .sum();

        tracing::debug!(model = %model, stop_reason, "Mock completion");

        Ok(CompletionResponse {
            output_tokens: count_tokens(&content),
            content,
            model,
            input_tokens,
            stop_reason: stop_reason.to_string(),
        })
    }

    fn default_model(&self) -> &str {
        DEFAULT_MODEL
    }
}
