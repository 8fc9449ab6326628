//! Remote Job Client
//!
//! Submits image generation jobs and polls them until they finish.

use std::sync::Arc;

use tracing::debug;

pub mod api;
mod error;
mod http;
mod runner;
mod types;

pub use api::JobApi;
pub use error::{JobError, code_message};
pub use http::HttpJobApi;
pub use runner::{JobRunner, PollConfig};
pub use types::{GenerationOptions, JobProgress, JobState, JobStatus};

use crate::config::Config;
use crate::settings::SharedSettings;

/// Create a job runner backed by the HTTP API described in `config`
pub fn create_runner(config: &Config, settings: SharedSettings) -> Result<JobRunner, JobError> {
    debug!(base_url = %config.api.base_url, "create_runner: called");
    let api = HttpJobApi::from_config(&config.api, settings)?;
    Ok(JobRunner::new(Arc::new(api), PollConfig::from(&config.polling)))
}
