use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::stateless_llm_interface::{ChatMessage, StatelessLLMInterface};

/// Any provider exposing the OpenAI `/chat/completions` endpoint
pub struct OpenAICompatibleLLM {
    model: String,
    base_url: String,
    api_key: String,
    temperature: f32,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAICompatibleLLM {
    pub fn new(
        model: String,
        base_url: String,
        api_key: String,
        temperature: f32,
        client: Client,
    ) -> Self {
        info!(
            "Initialized OpenAICompatibleLLM: model={}, base_url={}",
            model, base_url
        );
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
impl StatelessLLMInterface for OpenAICompatibleLLM {
    async fn chat_completion(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        let service_messages: Vec<_> = messages
            .iter()
            .map(|msg| json!({ "role": msg.role, "content": msg.content }))
            .collect();

        let body = json!({
            "model": self.model,
            "messages": service_messages,
            "temperature": self.temperature,
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(reqwest::Error::without_url)?;
        let result: CompletionResponse = response.json().await?;

        result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|text| !text.is_empty())
            .ok_or_else(|| anyhow::anyhow!("{} returned no completion", self.model))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn sends_conversation_with_bearer_key() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/chat/completions")
                    .header("authorization", "Bearer sk-test")
                    .body_contains(r#""model":"gpt-test""#)
                    .body_contains(r#""role":"assistant""#)
                    .body_contains(r#""content":"q""#);
                then.status(200).json_body(serde_json::json!({
                    "choices": [{ "message": { "role": "assistant", "content": "answer" } }]
                }));
            })
            .await;

        let llm = OpenAICompatibleLLM::new(
            "gpt-test".into(),
            server.base_url(),
            "sk-test".into(),
            1.0,
            Client::new(),
        );
        let reply = llm
            .chat_completion(&[ChatMessage::user("hi"), ChatMessage::assistant("hello"), ChatMessage::user("q")])
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(reply, "answer");
    }
}
