//! User settings
//!
//! The API credential and image output options. One instance is shared across
//! the process through [`SharedSettings`]; the job client reads it on every
//! request so updates apply to the next call.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use eyre::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{debug, info};

pub const DEFAULT_RESOLUTION: &str = "2K";
pub const DEFAULT_OUTPUT_FORMAT: &str = "png";
pub const DEFAULT_ASPECT_RATIO: &str = "3:4";

/// A string that never shows up in logs or debug output
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Access the raw underlying string
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecretString([REDACTED])")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Serialize for SecretString {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self)
    }
}

/// Persisted user settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// API credential for the image generation service
    #[serde(rename = "api-key", skip_serializing_if = "Option::is_none")]
    pub api_key: Option<SecretString>,

    /// Image resolution tag (1K, 2K, 4K)
    pub resolution: String,

    /// Output format tag (png, jpg)
    #[serde(rename = "output-format")]
    pub output_format: String,

    /// Aspect ratio tag (e.g. 3:4)
    #[serde(rename = "aspect-ratio")]
    pub aspect_ratio: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: None,
            resolution: DEFAULT_RESOLUTION.to_string(),
            output_format: DEFAULT_OUTPUT_FORMAT.to_string(),
            aspect_ratio: DEFAULT_ASPECT_RATIO.to_string(),
        }
    }
}

impl Settings {
    /// `~/.config/vocabscene/settings.yml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("vocabscene")
            .join("settings.yml")
    }

    /// Load settings from `path`, or defaults if the file does not exist
    pub fn load(path: &Path) -> Result<Self> {
        debug!(?path, "Settings::load: called");
        if !path.exists() {
            debug!("Settings::load: no settings file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).context("Failed to read settings file")?;
        let settings: Self = serde_yaml::from_str(&content).context("Failed to parse settings file")?;
        info!("Loaded settings from: {}", path.display());
        Ok(settings)
    }

    /// Save settings to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<()> {
        debug!(?path, "Settings::save: called");
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create settings directory")?;
        }
        let content = serde_yaml::to_string(self).context("Failed to serialize settings")?;
        std::fs::write(path, content).context("Failed to write settings file")?;
        info!("Saved settings to: {}", path.display());
        Ok(())
    }

    /// The credential, if one is set and not blank
    pub fn credential(&self) -> Option<&SecretString> {
        self.api_key.as_ref().filter(|k| !k.is_blank())
    }

    pub fn has_credential(&self) -> bool {
        self.credential().is_some()
    }

    /// Fill in the credential from `env_var` when none is stored
    pub fn with_env_fallback(mut self, env_var: &str) -> Self {
        debug!(%env_var, "Settings::with_env_fallback: called");
        if !self.has_credential()
            && let Ok(value) = std::env::var(env_var)
            && !value.trim().is_empty()
        {
            debug!("Settings::with_env_fallback: using credential from environment");
            self.api_key = Some(SecretString::new(value));
        }
        self
    }
}

/// Process-wide settings handle; last write wins
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<Settings>>,
}

impl SharedSettings {
    pub fn new(settings: Settings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Copy of the current settings
    pub fn snapshot(&self) -> Settings {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Replace the settings wholesale
    pub fn replace(&self, settings: Settings) {
        self.update(|current| *current = settings);
    }

    /// Mutate the settings in place
    pub fn update(&self, f: impl FnOnce(&mut Settings)) {
        debug!("SharedSettings::update: called");
        let mut guard = match self.inner.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard);
    }

    pub fn has_credential(&self) -> bool {
        self.snapshot().has_credential()
    }
}
