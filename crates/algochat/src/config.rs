use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::errors::ChatResult;

pub const CONFIG_FILE: &str = "algochat";
pub const ENV_PREFIX: &str = "ALGOCHAT";

/// Which request shape the chat endpoint expects
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendVariant {
    /// `{ "text": <latest user message> }`
    #[default]
    SingleTurn,
    /// The whole message list
    MultiTurn,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_chat_url")]
    pub chat_url: String,
    #[serde(default = "default_system_message_url")]
    pub system_message_url: String,
    #[serde(default)]
    pub variant: BackendVariant,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            chat_url: default_chat_url(),
            system_message_url: default_system_message_url(),
            variant: BackendVariant::default(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LookupSettings {
    #[serde(default = "default_lookup_url")]
    pub url: String,
    #[serde(default = "default_repo_base_url")]
    pub repo_base_url: String,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            url: default_lookup_url(),
            repo_base_url: default_repo_base_url(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub lookup: LookupSettings,
}

impl ClientConfig {
    /// Defaults, then `algochat.toml` if present, then `ALGOCHAT_*` variables.
    pub fn load() -> ChatResult<Self> {
        Self::load_from(CONFIG_FILE)
    }

    pub fn load_from(file: &str) -> ChatResult<Self> {
        let config = Config::builder()
            .set_default("backend.chat_url", default_chat_url())?
            .set_default("backend.system_message_url", default_system_message_url())?
            .set_default("backend.variant", "single_turn")?
            .set_default("backend.connect_timeout_secs", default_connect_timeout_secs())?
            .set_default("lookup.url", default_lookup_url())?
            .set_default("lookup.repo_base_url", default_repo_base_url())?
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings = config.try_deserialize()?;
        tracing::debug!(?settings, "loaded client configuration");
        Ok(settings)
    }
}

fn default_chat_url() -> String {
    "http://localhost:8000/chat_stream/".to_string()
}

fn default_system_message_url() -> String {
    "http://localhost:8000/system_message/".to_string()
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_lookup_url() -> String {
    "http://localhost:3000/api/fetchCsvData".to_string()
}

fn default_repo_base_url() -> String {
    "https://github.com/twitter/the-algorithm/blob/main".to_string()
}
