use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::error::{Result, TercumanError};
use crate::language::Language;
use crate::retry::RetryPolicy;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "tercuman.toml";

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEEPL_API_KEY_ENV: &str = "DEEPL_API_KEY";
pub const LIBRETRANSLATE_API_KEY_ENV: &str = "LIBRETRANSLATE_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub providers: ProvidersConfig,
    pub pipeline: PipelineConfig,
    pub validation: ValidationConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub http: HttpConfig,
    pub chat: ChatConfig,
    pub deepl: DeeplConfig,
    pub google: GoogleConfig,
    pub libre: LibreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout applied to every provider call
    pub timeout_secs: u64,
    /// Client identifier sent to upstreams that expect a browser-like agent
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Base URL of an OpenAI-compatible API
    pub endpoint: String,
    pub model: String,
    /// Read from OPENAI_API_KEY when not set in the file
    pub api_key: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub summary_max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeeplConfig {
    pub endpoint: String,
    /// Read from DEEPL_API_KEY when not set in the file
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub enabled: bool,
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibreConfig {
    /// Self-hosted instance; an empty string disables the provider
    pub endpoint: Option<String>,
    /// Read from LIBRETRANSLATE_API_KEY when not set in the file
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub source_language: Language,
    pub target_language: Language,
    /// Maximum characters per chunk sent to a provider
    pub chunk_size: usize,
    /// Normalized text shorter than this is treated as no content
    pub min_content_chars: usize,
    /// Minimum length for an unvalidated fallback provider result
    pub min_fallback_chars: usize,
    /// Number of batch items translated at the same time
    pub batch_concurrency: usize,
    pub summary_retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub initial_delay_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Replaces the bundled Turkish rule set
    pub rules_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            temperature: 0.3,
            max_tokens: 1000,
            summary_max_tokens: 500,
        }
    }
}

impl Default for DeeplConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api-free.deepl.com/v2/translate".to_string(),
            api_key: None,
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: "https://translate.googleapis.com/translate_a/single".to_string(),
        }
    }
}

impl Default for LibreConfig {
    fn default() -> Self {
        Self {
            endpoint: Some("http://localhost:5000/translate".to_string()),
            api_key: None,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_language: Language::English,
            target_language: Language::Turkish,
            chunk_size: 500,
            min_content_chars: 10,
            min_fallback_chars: 2,
            batch_concurrency: 4,
            summary_retry: RetryConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            initial_delay_ms: 1500,
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.initial_delay_ms))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TercumanError::Config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| TercumanError::Config(format!("Failed to parse config file: {}", e)))
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| TercumanError::Config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| TercumanError::Config(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    /// Load from an explicit path, else `tercuman.toml` in the working directory, else defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                if Path::new(DEFAULT_CONFIG_FILE).exists() {
                    info!("Found {} in current directory, loading...", DEFAULT_CONFIG_FILE);
                    Self::from_file(DEFAULT_CONFIG_FILE)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Overlay provider credentials from the process environment
    pub fn with_env_credentials(self) -> Self {
        self.apply_credentials(|name| std::env::var(name).ok())
    }

    /// Fill credentials the file left unset; blank values count as absent
    pub fn apply_credentials<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let fetch = |current: Option<String>, name: &str| {
            current
                .filter(|key| !key.trim().is_empty())
                .or_else(|| lookup(name).filter(|key| !key.trim().is_empty()))
        };

        self.providers.chat.api_key = fetch(self.providers.chat.api_key.take(), OPENAI_API_KEY_ENV);
        self.providers.deepl.api_key = fetch(self.providers.deepl.api_key.take(), DEEPL_API_KEY_ENV);
        self.providers.libre.api_key =
            fetch(self.providers.libre.api_key.take(), LIBRETRANSLATE_API_KEY_ENV);
        self
    }
}
