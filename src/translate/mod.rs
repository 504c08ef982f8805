pub mod interface;
pub mod google_translate;
pub mod libre_translate;

pub use interface::*;
pub use google_translate::GoogleTranslate;
pub use libre_translate::LibreTranslate;

use std::sync::Arc;
use reqwest::Client;
use tracing::info;

use crate::config::TranslateConfig;

/// Create the translation client named in the configuration
pub fn create_translator(config: &TranslateConfig, client: Client) -> anyhow::Result<Arc<dyn TranslateInterface>> {
    info!("Initializing translator: {}", config.provider);
    match config.provider.as_str() {
        "google_translate" => Ok(Arc::new(GoogleTranslate::new(config.base_url.clone(), client))),
        "libre_translate" => {
            let base_url = config
                .base_url
                .clone()
                .ok_or_else(|| anyhow::anyhow!("translate.base_url is required for libre_translate"))?;
            Ok(Arc::new(LibreTranslate::new(base_url, config.api_key.clone(), client)))
        }
        other => Err(anyhow::anyhow!("Unsupported translation provider: {}", other)),
    }
}
