//! VocabScene configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main VocabScene configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Image generation API
    pub api: ApiConfig,

    /// Job polling policy
    pub polling: PollingConfig,

    /// Vocabulary catalog source
    pub catalog: CatalogConfig,

    /// Prompt template overrides
    pub prompts: PromptsConfig,
}

impl Config {
    /// Config files consulted when no `--config` is given, highest priority first
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".vocabscene.yml")];
        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("vocabscene").join("vocabscene.yml"));
        }
        paths
    }

    /// Load configuration: explicit path, else the first readable search path, else defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        for path in Self::search_paths().iter().filter(|p| p.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return Ok(config),
                Err(e) => tracing::warn!("Skipping config {}: {:#}", path.display(), e),
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read just the log level, before logging is set up
    ///
    /// Errors are ignored here; the full load reports them later.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(path) => path.clone(),
            None => Self::search_paths().into_iter().find(|p| p.exists())?,
        };
        let content = fs::read_to_string(path).ok()?;
        serde_yaml::from_str::<Self>(&content).ok()?.log_level
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Image generation API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// API base URL; `/createTask` and `/recordInfo` are appended
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Model identifier sent with each job
    pub model: String,

    /// Per-request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,

    /// Environment variable consulted when no credential is stored in settings
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.kie.ai/api/v1/jobs".to_string(),
            model: "nano-banana-pro".to_string(),
            timeout_ms: 60_000,
            api_key_env: "KIE_API_KEY".to_string(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Job polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Delay between status polls in milliseconds
    #[serde(rename = "interval-ms")]
    pub interval_ms: u64,

    /// Maximum number of status polls before giving up
    #[serde(rename = "max-attempts")]
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            max_attempts: 30,
        }
    }
}

/// Vocabulary catalog configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// File path or http(s) URL of the catalog JSON; built-in themes when unset
    pub source: Option<String>,
}

/// Prompt template configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory searched for `scene.pmt`
    pub dir: Option<PathBuf>,
}
