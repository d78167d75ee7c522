//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory where local translation models are stored
    pub model_dir: PathBuf,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("~/.parlance/models"),
        }
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// Bind port. The `PORT` environment variable takes precedence.
    pub port: u16,

    /// Directory with the web UI (`index.html` and assets). Unset disables it.
    pub static_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 10000,
            static_dir: None,
        }
    }
}

/// Local MarianMT model settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalModelConfig {
    /// Include the local model at the head of the chain
    pub enabled: bool,

    /// Hugging Face compatible hub used for downloads
    pub hub_endpoint: String,

    /// Hub repository per target language; `{lang}` is replaced by the key
    pub repo_template: String,

    /// Fetch missing models on first use
    pub auto_download: bool,

    /// Upper bound on generated tokens per translation
    pub max_new_tokens: usize,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hub_endpoint: "https://huggingface.co".to_string(),
            repo_template: "Xenova/opus-mt-en-{lang}".to_string(),
            auto_download: true,
            max_new_tokens: 256,
        }
    }
}

impl LocalModelConfig {
    /// Hub repository name for a language key.
    pub fn repo_for(&self, language_key: &str) -> String {
        self.repo_template.replace("{lang}", language_key)
    }
}

/// MyMemory (remote-a) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MyMemoryConfig {
    pub enabled: bool,

    /// `/get` endpoint URL
    pub endpoint: String,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,

    /// Contact email sent as `de=`, which raises the anonymous daily quota
    pub email: Option<String>,
}

impl Default for MyMemoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://api.mymemory.translated.net/get".to_string(),
            timeout_ms: 10_000,
            email: None,
        }
    }
}

/// Google free endpoint (remote-b) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleFreeConfig {
    pub enabled: bool,

    /// `translate_a/single` endpoint URL
    pub endpoint: String,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for GoogleFreeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
            timeout_ms: 10_000,
        }
    }
}

/// Caption upstream settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Upstream captioning URL. Unset disables `/predict`.
    pub endpoint: Option<String>,

    /// Bearer token (supports ${ENV_VAR} syntax)
    pub api_key: String,

    /// Request timeout in milliseconds
    pub timeout_ms: u64,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: "${HF_API_TOKEN}".to_string(),
            timeout_ms: 60_000,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: error, warn, info, debug, trace
    pub level: String,

    /// Log format: "pretty" or "json"
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
