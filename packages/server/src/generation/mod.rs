//! Response generation for submitted questions.
//!
//! Handlers only see [`ResponseGenerator`]; the production implementation talks
//! to an OpenAI-compatible chat-completions gateway.

mod openai;

use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

pub use openai::OpenAiCompatibleGenerator;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// One question addressed to one model.
#[derive(Clone, Debug)]
pub struct GenerationRequest {
    pub model: String,
    pub system_prompt: Option<String>,
    /// Earlier turns of this conversation as answered by the same model.
    pub history: Vec<(String, String)>,
    pub question: String,
}

impl GenerationRequest {
    /// Chat transcript sent upstream: system prompt, prior turns, then the question.
    pub fn messages(&self) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.history.len() * 2 + 2);
        if let Some(prompt) = self.system_prompt.as_deref()
            && !prompt.trim().is_empty()
        {
            messages.push(ChatMessage::new(ChatRole::System, prompt));
        }
        for (question, answer) in &self.history {
            messages.push(ChatMessage::new(ChatRole::User, question.as_str()));
            messages.push(ChatMessage::new(ChatRole::Assistant, answer.as_str()));
        }
        messages.push(ChatMessage::new(ChatRole::User, self.question.as_str()));
        messages
    }
}

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    #[error("Upstream returned no choices")]
    Empty,
}

#[async_trait]
pub trait ResponseGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

/// Run every request concurrently. Output order matches `requests`.
///
/// A failed model is logged and reported as `Err` in its slot; it never fails
/// the batch.
pub async fn generate_all(
    generator: &dyn ResponseGenerator,
    requests: &[GenerationRequest],
) -> Vec<Result<String, GenerationError>> {
    let results = join_all(requests.iter().map(|req| generator.generate(req))).await;

    for (req, result) in requests.iter().zip(&results) {
        match result {
            Ok(text) => info!(model = %req.model, chars = text.len(), "Model responded"),
            Err(e) => warn!(model = %req.model, error = %e, "Model generation failed"),
        }
    }

    results
}
