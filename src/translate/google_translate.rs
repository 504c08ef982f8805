use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info};

use super::interface::TranslateInterface;

const DEFAULT_BASE_URL: &str = "https://translate.googleapis.com";

/// Google's public web translation endpoint (`translate_a/single`, `client=gtx`)
pub struct GoogleTranslate {
    base_url: String,
    client: Client,
}

impl GoogleTranslate {
    pub fn new(base_url: Option<String>, client: Client) -> Self {
        let base_url = base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        info!("Initialized GoogleTranslate: base_url={}", base_url);
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

/// The response is a nested array; the first element holds
/// `[translated, original, ...]` segments.
fn join_segments(body: &Value) -> Option<String> {
    let segments = body.get(0)?.as_array()?;
    let text: String = segments
        .iter()
        .filter_map(|seg| seg.get(0).and_then(Value::as_str))
        .collect();
    (!text.is_empty()).then_some(text)
}

#[async_trait]
impl TranslateInterface for GoogleTranslate {
    async fn translate(&self, text: &str, source: Option<&str>, target: &str) -> anyhow::Result<String> {
        debug!("GoogleTranslate: {} chars -> {}", text.chars().count(), target);

        // POST keeps long answers out of the URL
        let response = self
            .client
            .post(format!("{}/translate_a/single", self.base_url))
            .query(&[
                ("client", "gtx"),
                ("sl", source.unwrap_or("auto")),
                ("tl", target),
                ("dt", "t"),
            ])
            .form(&[("q", text)])
            .send()
            .await?
            .error_for_status()?;
        let body: Value = response.json().await?;

        join_segments(&body)
            .ok_or_else(|| anyhow::anyhow!("Unexpected translation response for target {}", target))
    }
}
