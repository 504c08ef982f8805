use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tracing::info;

use crate::assistant::{AssistantService, ChatSessions};
use crate::config::Config;
use crate::llm::StatelessLLMFactory;
use crate::marketplace::MarketplaceService;
use crate::store::create_store;
use crate::translate::create_translator;

#[derive(Clone)]
pub struct AssistantState {
    pub service: Arc<AssistantService>,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub cors_origins: Vec<String>,
}

#[derive(Clone)]
pub struct MarketplaceState {
    pub service: Arc<MarketplaceService>,
}

fn http_client(config: &Config) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(config.system.http_timeout_secs))
        .build()?)
}

impl AssistantState {
    pub fn new(config: &Config) -> Result<Self> {
        let client = http_client(config)?;
        let llm = StatelessLLMFactory::create_llm(&config.llm, client.clone())?;
        let translator = create_translator(&config.translate, client.clone())?;
        let store = create_store(&config.store, client)?;

        let sessions = config
            .assistant
            .sessions_enabled
            .then(|| ChatSessions::new(config.assistant.max_turns));
        info!(
            "Assistant conversations: {}",
            if sessions.is_some() { "per session id" } else { "stateless" }
        );

        let upload_dir = PathBuf::from(&config.system.upload_dir);
        std::fs::create_dir_all(&upload_dir)?;

        Ok(Self {
            service: Arc::new(AssistantService::new(llm, translator, store, sessions)),
            upload_dir,
            max_upload_bytes: config.system.max_upload_bytes,
            cors_origins: config.system.cors_origins.clone(),
        })
    }
}

impl MarketplaceState {
    pub fn new(config: &Config) -> Result<Self> {
        let store = create_store(&config.store, http_client(config)?)?;
        if config.marketplace.guard_accept {
            info!("Accepting an already accepted service request is refused");
        }
        Ok(Self {
            service: Arc::new(MarketplaceService::new(store, config.marketplace.guard_accept)),
        })
    }
}
