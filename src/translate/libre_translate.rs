use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use super::interface::{TranslateInterface, TranslateRequest, TranslateResponse};

/// Self-hostable LibreTranslate server
pub struct LibreTranslate {
    base_url: String,
    api_key: Option<String>,
    client: Client,
}

impl LibreTranslate {
    pub fn new(base_url: String, api_key: Option<String>, client: Client) -> Self {
        info!("Initialized LibreTranslate: base_url={}", base_url);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            client,
        }
    }
}

#[async_trait]
impl TranslateInterface for LibreTranslate {
    async fn translate(&self, text: &str, source: Option<&str>, target: &str) -> anyhow::Result<String> {
        let request = TranslateRequest {
            q: text.to_string(),
            source: source.unwrap_or("auto").to_string(),
            target: target.to_string(),
            format: "text".to_string(),
            api_key: self.api_key.clone(),
        };
        debug!("LibreTranslate: {} chars -> {}", text.chars().count(), target);

        let response = self
            .client
            .post(format!("{}/translate", self.base_url))
            .json(&request)
            .send()
            .await?
            .error_for_status()?;
        let result: TranslateResponse = response.json().await?;

        if result.translated_text.is_empty() {
            anyhow::bail!("LibreTranslate returned an empty translation");
        }
        Ok(result.translated_text)
    }
}
