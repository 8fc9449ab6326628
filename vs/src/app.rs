//! Application wiring
//!
//! Builds the catalog, prompt engine, settings and job runner once and hands
//! them to whatever front-end needs them.

use std::path::PathBuf;
use std::sync::Arc;

use eyre::{Context, Result};
use tracing::{debug, info};

use crate::catalog::{Catalog, load_catalog};
use crate::config::Config;
use crate::job::{JobRunner, create_runner};
use crate::prompts::PromptEngine;
use crate::settings::{SecretString, Settings, SharedSettings};
use crate::studio::Studio;

/// Owned, explicitly wired application components
pub struct App {
    pub config: Config,
    pub settings: SharedSettings,
    pub settings_path: PathBuf,
    pub catalog: Arc<Catalog>,
    pub prompts: Arc<PromptEngine>,
}

impl App {
    /// Load settings and the catalog according to `config`
    pub async fn load(config: Config, settings_path: Option<PathBuf>) -> Result<Self> {
        debug!(?settings_path, "App::load: called");
        let settings_path = settings_path.unwrap_or_else(Settings::default_path);
        let settings = Settings::load(&settings_path)
            .context("Failed to load settings")?
            .with_env_fallback(&config.api.api_key_env);

        let catalog = Arc::new(load_catalog(config.catalog.source.as_deref()).await);
        let prompts = Arc::new(PromptEngine::new(Arc::clone(&catalog), config.prompts.dir.as_deref()));
        info!("App ready with {} themes", catalog.len());

        Ok(Self {
            config,
            settings: SharedSettings::new(settings),
            settings_path,
            catalog,
            prompts,
        })
    }

    /// Job runner talking to the configured API
    pub fn runner(&self) -> Result<Arc<JobRunner>> {
        debug!("App::runner: called");
        let runner = create_runner(&self.config, self.settings.clone()).context("Failed to create job client")?;
        Ok(Arc::new(runner))
    }

    /// A fresh interactive session
    pub fn studio(&self) -> Result<Studio> {
        debug!("App::studio: called");
        Ok(Studio::new(Arc::clone(&self.prompts), self.runner()?, self.settings.clone()))
    }

    /// Store a new API key for this process and in the settings file
    ///
    /// The in-memory key is updated even when writing the file fails.
    pub fn save_api_key(&self, key: SecretString) -> Result<()> {
        debug!("App::save_api_key: called");
        self.settings.update(|s| s.api_key = Some(key.clone()));
        let mut stored = Settings::load(&self.settings_path)?;
        stored.api_key = Some(key);
        stored.save(&self.settings_path)
    }
}
