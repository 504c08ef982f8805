//! Offline stand-ins for the model and translation clients.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{ChatMessage, StatelessLLMInterface};
use crate::translate::TranslateInterface;

/// Always answers with the same text and records how many messages each call carried.
pub struct ScriptedLLM {
    reply: String,
    calls: Mutex<Vec<usize>>,
}

impl ScriptedLLM {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.message_counts().len()
    }

    pub fn message_counts(&self) -> Vec<usize> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl StatelessLLMInterface for ScriptedLLM {
    async fn chat_completion(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(messages.len());
        }
        Ok(self.reply.clone())
    }
}

pub struct FailingLLM;

#[async_trait]
impl StatelessLLMInterface for FailingLLM {
    async fn chat_completion(&self, _messages: &[ChatMessage]) -> anyhow::Result<String> {
        anyhow::bail!("model quota exceeded")
    }
}

/// "Translates" by prefixing the target code: `[hi] text`.
#[derive(Default)]
pub struct TaggingTranslator {
    calls: Mutex<Vec<String>>,
}

impl TaggingTranslator {
    /// Target codes requested so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TranslateInterface for TaggingTranslator {
    async fn translate(&self, text: &str, _source: Option<&str>, target: &str) -> anyhow::Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(target.to_string());
        }
        Ok(format!("[{}] {}", target, text))
    }
}

pub struct FailingTranslator;

#[async_trait]
impl TranslateInterface for FailingTranslator {
    async fn translate(&self, _text: &str, _source: Option<&str>, _target: &str) -> anyhow::Result<String> {
        anyhow::bail!("translation service unreachable")
    }
}
