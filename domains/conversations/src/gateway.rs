//! Completion gateway: one question in, one domain-restricted answer out
//!
//! Every call is independent. No earlier turns are sent, and whether a
//! question is in the medical/healthcare domain is left entirely to the
//! model through the instruction below.

use std::sync::Arc;

use medchat_llm::{CompletionRequest, LlmError, LlmMessage, LlmService};

/// Reply the model is told to give for out-of-domain questions
pub const OUT_OF_DOMAIN_REPLY: &str =
    "I don’t know, I am only trained for medical/healthcare questions.";

/// Reply the model is told to give for out-of-domain uploads
pub const NOT_HEALTHCARE_FILE_REPLY: &str =
    "This file is not healthcare related, so I cannot answer.";

const INSTRUCTION: &str = "You are Doctor AI, a medical/healthcare assistant.";

/// Wrap `question` in the fixed domain instruction
pub fn render_prompt(question: &str) -> String {
    format!(
        "\n{INSTRUCTION}\n\
         - If the user asks about medical/healthcare topics → answer normally.\n\
         - If the question is outside medical/healthcare → reply: \"{OUT_OF_DOMAIN_REPLY}\"\n\
         - If a PDF or image is uploaded but NOT healthcare related \
         → reply: \"{NOT_HEALTHCARE_FILE_REPLY}\"\n\
         Question: {question}\n"
    )
}

#[derive(Clone)]
pub struct CompletionGateway {
    llm: Arc<dyn LlmService>,
}

impl CompletionGateway {
    pub fn new(llm: Arc<dyn LlmService>) -> Self {
        Self { llm }
    }

    /// Ask one question. Any provider failure comes back as `Err`.
    pub async fn complete(&self, question: &str) -> Result<String, LlmError> {
        let request = CompletionRequest {
            model: String::new(),
            system_prompt: None,
            messages: vec![LlmMessage::user(render_prompt(question))],
            max_tokens: None,
        };

        tracing::info!(
            question_chars = question.chars().count(),
            model = %self.llm.default_model(),
            "Requesting completion"
        );

        let response = self.llm.complete(request).await?;

        if response.content.trim().is_empty() {
            return Err(LlmError::Response("Model returned an empty answer".to_string()));
        }

        tracing::debug!(
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            stop_reason = %response.stop_reason,
            "Completion received"
        );

        Ok(response.content)
    }
}
