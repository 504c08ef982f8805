use std::sync::Arc;
use tracing::info;
use anyhow::Result;
use reqwest::Client;

use super::{GeminiLLM, OpenAICompatibleLLM, StatelessLLMInterface};
use crate::config::LlmConfig;

/// Factory for creating stateless LLM instances
pub struct StatelessLLMFactory;

impl StatelessLLMFactory {
    /// Create an LLM based on the configuration.
    ///
    /// # Arguments
    /// * `config` - LLM section of the service configuration
    /// * `client` - Shared HTTP client
    pub fn create_llm(config: &LlmConfig, client: Client) -> Result<Arc<dyn StatelessLLMInterface>> {
        info!("Initializing LLM: {}", config.provider);

        match config.provider.as_str() {
            "gemini_llm" => Ok(Arc::new(GeminiLLM::new(
                config.model.clone(),
                config.base_url.clone(),
                config.api_key.clone(),
                config.temperature,
                client,
            ))),
            "openai_compatible_llm" | "openai_llm" | "groq_llm" | "deepseek_llm" | "mistral_llm" => {
                let base_url = config
                    .base_url
                    .clone()
                    .or_else(|| default_base_url(&config.provider).map(str::to_string))
                    .ok_or_else(|| anyhow::anyhow!("llm.base_url is required for {}", config.provider))?;
                Ok(Arc::new(OpenAICompatibleLLM::new(
                    config.model.clone(),
                    base_url,
                    config.api_key.clone(),
                    config.temperature,
                    client,
                )))
            }
            _ => Err(anyhow::anyhow!("Unsupported LLM provider: {}", config.provider)),
        }
    }
}

fn default_base_url(provider: &str) -> Option<&'static str> {
    match provider {
        "openai_llm" => Some("https://api.openai.com/v1"),
        "groq_llm" => Some("https://api.groq.com/openai/v1"),
        "deepseek_llm" => Some("https://api.deepseek.com/v1"),
        "mistral_llm" => Some("https://api.mistral.ai/v1"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(provider: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.to_string(),
            ..LlmConfig::default()
        }
    }

    #[test]
    fn known_providers_are_created() {
        assert!(StatelessLLMFactory::create_llm(&config("gemini_llm"), Client::new()).is_ok());
        assert!(StatelessLLMFactory::create_llm(&config("groq_llm"), Client::new()).is_ok());
    }

    #[test]
    fn generic_provider_needs_a_base_url() {
        assert!(StatelessLLMFactory::create_llm(&config("openai_compatible_llm"), Client::new()).is_err());
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let err = StatelessLLMFactory::create_llm(&config("llama_cpp_llm"), Client::new())
            .err()
            .unwrap();
        assert!(err.to_string().contains("Unsupported LLM provider"));
    }
}
