use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String, // "user" or "assistant"
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".to_string(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".to_string(), content: content.into() }
    }
}

/// Interface for a stateless language model
/// Stateless means the LLM doesn't store memory or user messages;
/// callers pass the whole conversation, instructions included, on every call.
#[async_trait]
pub trait StatelessLLMInterface: Send + Sync {
    /// Generate a chat completion and return the full reply text
    async fn chat_completion(&self, messages: &[ChatMessage]) -> anyhow::Result<String>;
}
