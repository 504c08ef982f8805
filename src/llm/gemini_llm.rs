use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::stateless_llm_interface::{ChatMessage, StatelessLLMInterface};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini over the `generateContent` REST endpoint
pub struct GeminiLLM {
    model: String,
    base_url: String,
    api_key: String,
    temperature: f32,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

impl GeminiLLM {
    pub fn new(
        model: String,
        base_url: Option<String>,
        api_key: String,
        temperature: f32,
        client: Client,
    ) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        info!("Initialized GeminiLLM: model={}, base_url={}", model, base_url);
        Self {
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            temperature,
            client,
        }
    }
}

#[async_trait]
impl StatelessLLMInterface for GeminiLLM {
    async fn chat_completion(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        // Gemini names the assistant role "model"
        let contents: Vec<_> = messages
            .iter()
            .map(|m| {
                let role = if m.role == "assistant" { "model" } else { "user" };
                json!({ "role": role, "parts": [{ "text": m.content }] })
            })
            .collect();

        let body = json!({
            "contents": contents,
            "generationConfig": { "temperature": self.temperature },
        });

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);
        debug!("Gemini request: {} message(s)", messages.len());

        // Key goes in a header; reqwest errors quote the URL
        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(reqwest::Error::without_url)?;
        let result: GenerateContentResponse = response.json().await?;

        let text: String = result
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            anyhow::bail!("Gemini returned no text for model {}", self.model);
        }
        Ok(text)
    }
}
