//! API request and response models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Returned when the generator has nothing to say
pub const FALLBACK_ANSWER: &str = "I'm sorry, I don't have an answer to that question.";

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One turn of a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Chat completion request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "model": "gpt-4o",
    "messages": [
        { "role": "user", "content": "Hello, how are you?" },
        { "role": "assistant", "content": "I'm fine, thank you." }
    ]
}))]
pub struct ChatRequest {
    /// Requested model. Accepted for compatibility; the configured generator decides.
    pub model: String,

    /// Conversation history, oldest first. The last message is the prompt.
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// The most recent turn of the conversation
    pub fn last_message(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }
}

/// Chat completion response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "role": "assistant", "content": "Great, thanks!" }))]
pub struct ChatCompletionResponse {
    pub role: Role,
    pub content: String,
}

impl ChatCompletionResponse {
    /// Assistant reply, falling back to [`FALLBACK_ANSWER`] when `answer` is absent or empty
    pub fn from_answer(answer: Option<String>) -> Self {
        let content = match answer {
            Some(text) if !text.is_empty() => text,
            _ => FALLBACK_ANSWER.to_string(),
        };

        Self {
            role: Role::Assistant,
            content,
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({ "status": "healthy", "timestamp": "2024-01-01T00:00:00Z" }))]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

impl HealthStatus {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: Utc::now(),
        }
    }
}
