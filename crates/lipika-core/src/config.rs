//! Configuration types for the Lipika transliteration engine

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{Error, Result};

/// Default maximum sequence length, including the start and end markers.
pub const DEFAULT_MAX_SEQUENCE_LENGTH: usize = 40;

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Directory holding the per-language artifact triplets
    #[serde(default = "default_models_dir")]
    pub models_dir: PathBuf,

    /// Maximum sequence length (characters, including `<sos>`/`<eos>`)
    #[serde(default = "default_max_sequence_length")]
    pub max_sequence_length: usize,

    /// Device preference: `auto`, `cpu`, `cuda` or `metal`
    #[serde(default = "default_device")]
    pub device: String,

    /// How resident language models are released
    #[serde(default)]
    pub eviction: EvictionPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            models_dir: default_models_dir(),
            max_sequence_length: default_max_sequence_length(),
            device: default_device(),
            eviction: EvictionPolicy::default(),
        }
    }
}

impl EngineConfig {
    /// Defaults overlaid with `LIPIKA_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(max_len) = env_parse::<usize>("LIPIKA_MAX_LEN") {
            config.max_sequence_length = max_len;
        }
        if let Ok(device) = std::env::var("LIPIKA_DEVICE") {
            let trimmed = device.trim();
            if !trimmed.is_empty() {
                config.device = trimmed.to_ascii_lowercase();
            }
        }
        if let Some(capacity) = env_parse::<usize>("LIPIKA_CACHE_CAPACITY") {
            config.eviction = if capacity == 0 {
                EvictionPolicy::Never
            } else {
                EvictionPolicy::Lru { capacity }
            };
        }

        config
    }

    /// Load a JSON configuration file. Missing fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::ConfigError(format!("Invalid {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_models_dir(mut self, models_dir: impl Into<PathBuf>) -> Self {
        self.models_dir = models_dir.into();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_sequence_length < 2 {
            return Err(Error::ConfigError(format!(
                "max_sequence_length must leave room for <sos> and <eos>, got {}",
                self.max_sequence_length
            )));
        }
        if let EvictionPolicy::Lru { capacity: 0 } = self.eviction {
            return Err(Error::ConfigError(
                "LRU eviction needs a capacity of at least 1".to_string(),
            ));
        }
        match self.device.as_str() {
            "auto" | "cpu" | "cuda" | "metal" | "mps" => Ok(()),
            other => Err(Error::ConfigError(format!("Unknown device preference '{other}'"))),
        }
    }
}

/// Release policy for loaded language models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Keep every loaded language for the lifetime of the process.
    #[default]
    Never,
    /// Keep at most `capacity` languages, dropping the least recently used.
    Lru { capacity: usize },
}

fn default_models_dir() -> PathBuf {
    if let Ok(from_env) = std::env::var("LIPIKA_MODELS_DIR") {
        let trimmed = from_env.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }

    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lipika")
        .join("models")
}

fn default_max_sequence_length() -> usize {
    DEFAULT_MAX_SEQUENCE_LENGTH
}

fn default_device() -> String {
    "auto".to_string()
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid {}='{}'", key, raw);
            None
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_cors_enabled")]
    pub cors_enabled: bool,

    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_enabled: default_cors_enabled(),
            max_concurrent_requests: default_max_concurrent_requests(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(host) = std::env::var("LIPIKA_HOST") {
            config.host = host;
        }
        if let Some(port) = env_parse::<u16>("LIPIKA_PORT") {
            config.port = port;
        }
        if let Some(cors) = env_parse::<bool>("LIPIKA_CORS") {
            config.cors_enabled = cors;
        }
        if let Some(max) = env_parse::<usize>("MAX_CONCURRENT_REQUESTS") {
            config.max_concurrent_requests = max.max(1);
        }
        if let Some(timeout) = env_parse::<u64>("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = timeout;
        }
        config
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_cors_enabled() -> bool {
    true
}

fn default_max_concurrent_requests() -> usize {
    100
}

fn default_request_timeout_secs() -> u64 {
    30
}
