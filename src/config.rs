use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::gateway::DEFAULT_TOPIC;
use crate::gateway::gemini::{DEFAULT_API_BASE_URL, DEFAULT_MODEL};
use crate::snippet::Language;

pub const APP_DIR: &str = "type2learn";

/// Which back-end produces generated snippets.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GeneratorKind {
    /// POST to a running `type2learn serve`.
    Proxy,
    /// Call the model in-process with the local credential.
    Direct,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_generator")]
    pub generator: String,
    #[serde(default = "default_proxy_url")]
    pub proxy_url: String,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_language")]
    pub default_language: String,
    #[serde(default = "default_topic")]
    pub default_topic: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippets_file: Option<PathBuf>,
}

fn default_theme() -> String {
    "vscode-dark".to_string()
}
fn default_generator() -> String {
    "proxy".to_string()
}
fn default_proxy_url() -> String {
    "http://127.0.0.1:8787/api/generate".to_string()
}
fn default_bind_address() -> String {
    "127.0.0.1:8787".to_string()
}
fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}
fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}
fn default_cooldown_secs() -> u64 {
    4
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_language() -> String {
    Language::TypeScript.as_str().to_string()
}
fn default_topic() -> String {
    DEFAULT_TOPIC.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: default_theme(),
            generator: default_generator(),
            proxy_url: default_proxy_url(),
            bind_address: default_bind_address(),
            model: default_model(),
            api_base_url: default_api_base_url(),
            cooldown_secs: default_cooldown_secs(),
            request_timeout_secs: default_request_timeout_secs(),
            default_language: default_language(),
            default_topic: default_topic(),
            snippets_file: None,
        }
    }
}

impl Config {
    /// Load from the platform config dir; a missing file yields defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("reading {}", path.display()))?;
            toml::from_str::<Config>(&content)
                .with_context(|| format!("parsing {}", path.display()))?
        } else {
            Config::default()
        };
        config.validate();
        Ok(config)
    }

    pub fn config_path() -> PathBuf {
        config_dir().join("config.toml")
    }

    /// Clamp numeric ranges and reset unknown choices, so hand-edited or stale
    /// files still produce a usable config.
    pub fn validate(&mut self) {
        self.cooldown_secs = self.cooldown_secs.clamp(1, 60);
        self.request_timeout_secs = self.request_timeout_secs.clamp(1, 300);

        if self.default_language.parse::<Language>().is_err() {
            warn!(language = %self.default_language, "unknown default_language, using default");
            self.default_language = default_language();
        }
        if self.generator_kind_opt().is_none() {
            warn!(generator = %self.generator, "unknown generator, using default");
            self.generator = default_generator();
        }
        if self.default_topic.trim().is_empty() {
            self.default_topic = default_topic();
        }
    }

    fn generator_kind_opt(&self) -> Option<GeneratorKind> {
        match self.generator.as_str() {
            "proxy" => Some(GeneratorKind::Proxy),
            "direct" => Some(GeneratorKind::Direct),
            _ => None,
        }
    }

    pub fn generator_kind(&self) -> GeneratorKind {
        self.generator_kind_opt().unwrap_or(GeneratorKind::Proxy)
    }

    pub fn language(&self) -> Language {
        self.default_language.parse().unwrap_or(Language::TypeScript)
    }

    pub fn cooldown(&self) -> Duration {
        Duration::from_secs(self.cooldown_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// `<config dir>/type2learn`, falling back to the working directory.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}

/// `<data dir>/type2learn`, falling back to the working directory.
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}
