use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use regex::Regex;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub system: SystemConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub translate: TranslateConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub marketplace: MarketplaceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_marketplace_port")]
    pub marketplace_port: u16,
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// Origins allowed to call the assistant with credentials. Empty means permissive.
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_marketplace_port() -> u16 {
    5001
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_max_upload_bytes() -> usize {
    16 * 1024 * 1024
}

fn default_cors_origins() -> Vec<String> {
    vec!["http://localhost:5173".to_string()]
}

fn default_http_timeout_secs() -> u64 {
    30
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            marketplace_port: default_marketplace_port(),
            upload_dir: default_upload_dir(),
            max_upload_bytes: default_max_upload_bytes(),
            cors_origins: default_cors_origins(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// Configuration for the chat model provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_provider")]
    pub provider: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_llm_api_key")]
    pub api_key: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_llm_provider() -> String {
    "gemini_llm".to_string()
}

fn default_llm_model() -> String {
    "gemini-1.5-pro-latest".to_string()
}

fn default_llm_api_key() -> String {
    std::env::var("GOOGLE_API_KEY").unwrap_or_default()
}

fn default_temperature() -> f32 {
    1.0
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            model: default_llm_model(),
            base_url: None,
            api_key: default_llm_api_key(),
            temperature: default_temperature(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslateConfig {
    /// "google_translate" or "libre_translate"
    #[serde(default = "default_translate_provider")]
    pub provider: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_translate_provider() -> String {
    "google_translate".to_string()
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            provider: default_translate_provider(),
            base_url: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// "firestore" or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_database")]
    pub database: String,
    #[serde(default = "default_firestore_url")]
    pub base_url: String,
    #[serde(default)]
    pub access_token: Option<String>,
}

fn default_store_backend() -> String {
    "memory".to_string()
}

fn default_database() -> String {
    "(default)".to_string()
}

fn default_firestore_url() -> String {
    "https://firestore.googleapis.com/v1".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            project_id: String::new(),
            database: default_database(),
            base_url: default_firestore_url(),
            access_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantConfig {
    #[serde(default)]
    pub sessions_enabled: bool,
    #[serde(default = "default_max_turns")]
    pub max_turns: usize,
}

fn default_max_turns() -> usize {
    10
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            sessions_enabled: false,
            max_turns: default_max_turns(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    /// Refuse to accept a service request that is already accepted
    #[serde(default)]
    pub guard_accept: bool,
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        if !Path::new(path).exists() {
            anyhow::bail!("Configuration file not found: {}", path);
        }

        let bytes = fs::read(path)?;
        let content = substitute_env_vars(&decode_text(&bytes));

        let path_lower = path.to_lowercase();
        if path_lower.ends_with(".json") {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(serde_yaml::from_str(&content)?)
        }
    }

    /// Try `CONFIG_PATH` and the usual locations, falling back to defaults
    /// only when none of them exists.
    pub fn discover() -> Result<(Self, Option<String>)> {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."));

        if let Ok(path) = std::env::var("CONFIG_PATH") {
            // An explicit path must load
            return Ok((Self::load(&path)?, Some(path)));
        }

        let candidates: Vec<String> = vec![
            Some("conf.yaml".to_string()),
            Some("conf.json".to_string()),
            exe_dir.join("conf.yaml").to_str().map(|s| s.to_string()),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::load_first(&candidates)
    }

    /// Load the first existing file. A file that exists but does not parse is
    /// an error, never a silent fallback to defaults.
    fn load_first(candidates: &[String]) -> Result<(Self, Option<String>)> {
        for path in candidates {
            if !Path::new(path).exists() {
                tracing::debug!("No config at {}", path);
                continue;
            }
            let cfg = Self::load(path).with_context(|| format!("invalid config file {}", path))?;
            return Ok((cfg, Some(path.clone())));
        }

        Ok((Self::default(), None))
    }
}

/// Decode UTF-8 text, dropping a leading BOM if present.
fn decode_text(bytes: &[u8]) -> String {
    let (cow, _, _) = encoding_rs::UTF_8.decode(bytes);
    cow.into_owned()
}

/// Replace `${VAR_NAME}` with the environment value; unknown variables are left as-is.
pub fn substitute_env_vars(content: &str) -> String {
    let pattern = Regex::new(r"\$\{(\w+)\}").expect("static regex");
    pattern
        .replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn yaml_sections_fill_in_defaults() {
        let cfg: Config = serde_yaml::from_str(
            "system:\n  port: 8080\nmarketplace:\n  guard_accept: true\n",
        )
        .unwrap();
        assert_eq!(cfg.system.port, 8080);
        assert_eq!(cfg.system.upload_dir, "uploads");
        assert!(cfg.marketplace.guard_accept);
        assert_eq!(cfg.store.backend, "memory");
        assert_eq!(cfg.assistant.max_turns, 10);
    }

    #[test]
    fn env_vars_are_substituted() {
        std::env::set_var("HOMESERVE_TEST_TOKEN", "abc123");
        let out = substitute_env_vars("token: ${HOMESERVE_TEST_TOKEN}\nother: ${HOMESERVE_UNSET_VAR}");
        assert_eq!(out, "token: abc123\nother: ${HOMESERVE_UNSET_VAR}");
    }

    #[test]
    fn loads_json_with_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(&[0xEF, 0xBB, 0xBF]).unwrap();
        file.write_all(br#"{"store": {"backend": "firestore", "project_id": "home"}}"#).unwrap();

        let cfg = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.store.backend, "firestore");
        assert_eq!(cfg.store.project_id, "home");
        assert_eq!(cfg.store.database, "(default)");
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(Config::load("/definitely/not/here.yaml").is_err());
    }

    #[test]
    fn discovery_skips_missing_files_and_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("conf.yaml").to_string_lossy().into_owned();
        let (cfg, found) = Config::load_first(&[missing]).unwrap();
        assert!(found.is_none());
        assert_eq!(cfg.assistant.max_turns, Config::default().assistant.max_turns);
    }

    #[test]
    fn discovered_file_that_fails_to_parse_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("conf.yaml");
        fs::write(&broken, "system: [unclosed\n").unwrap();
        let good = dir.path().join("conf.json");
        fs::write(&good, "{}").unwrap();

        let broken = broken.to_string_lossy().into_owned();
        let good = good.to_string_lossy().into_owned();
        let err = Config::load_first(&[broken.clone(), good]).unwrap_err();
        assert!(format!("{:#}", err).contains(&broken));
    }
}
