use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Translate `text` into the language with two-letter code `target`.
/// `source` of `None` asks the service to detect the input language.
#[async_trait]
pub trait TranslateInterface: Send + Sync {
    async fn translate(&self, text: &str, source: Option<&str>, target: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub q: String,
    pub source: String,
    pub target: String,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateResponse {
    #[serde(rename = "translatedText")]
    pub translated_text: String,
}
