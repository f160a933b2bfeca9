//! Layered configuration for Garlic Archive using figment.
//!
//! Precedence (highest to lowest):
//! 1. Environment variables (`GARLIC_*` prefix, `__` separates sections,
//!    e.g. `GARLIC_AI__MODEL`)
//! 2. `./garlic.toml` (project-local)
//! 3. `~/.config/garlic-archive/config.toml` (user-global)
//! 4. Default values
//!
//! The parsing service key additionally falls back to `GEMINI_API_KEY`
//! and `API_KEY` when no configured value is present.

use crate::error::LedgerResult;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_SERVER_ADDR: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LedgerConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// SQLite file holding the ledger
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .map(|d| d.join("garlic-archive").join("ledger.db"))
            .unwrap_or_else(|| PathBuf::from("garlic-ledger.db"));
        StorageConfig { path }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    pub model: String,
    pub endpoint: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        AiConfig {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }
}

impl AiConfig {
    /// Configured key, else `GEMINI_API_KEY`, else `API_KEY`.
    /// Blank values at any level fall through to the next one.
    pub fn resolved_api_key(&self) -> Option<String> {
        first_key([
            self.api_key.clone(),
            std::env::var("GEMINI_API_KEY").ok(),
            std::env::var("API_KEY").ok(),
        ])
    }
}

fn first_key<const N: usize>(candidates: [Option<String>; N]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|k| !k.trim().is_empty())
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            addr: DEFAULT_SERVER_ADDR.to_string(),
        }
    }
}

impl LedgerConfig {
    /// Load configuration from TOML files and the environment.
    pub fn load() -> LedgerResult<Self> {
        Ok(Self::figment().extract()?)
    }

    /// Same as [`load`](Self::load), reading a `.env` in the current
    /// directory first. A missing `.env` is not an error.
    pub fn load_with_dotenv() -> LedgerResult<Self> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the provider chain.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from("garlic.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("GARLIC_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("garlic-archive").join("config.toml"))
    }
}
