//! HTTP implementation of the job API
//!
//! Talks to a task-based image generation service:
//! `POST {base}/createTask` and `GET {base}/recordInfo?taskId=...`, both
//! returning a `{code, msg, data}` envelope.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{CreateTaskData, CreateTaskInput, CreateTaskRequest, Envelope, RecordInfoData, ResultJson};
use super::{GenerationOptions, JobApi, JobError, JobState, JobStatus};
use crate::config::ApiConfig;
use crate::settings::SharedSettings;

/// Envelope code signalling success
const CODE_OK: i64 = 200;

/// reqwest-backed job API client
///
/// The bearer credential is read from the shared settings on every request.
pub struct HttpJobApi {
    base_url: String,
    model: String,
    http: Client,
    settings: SharedSettings,
}

impl HttpJobApi {
    /// Create a new client from API configuration
    pub fn from_config(config: &ApiConfig, settings: SharedSettings) -> Result<Self, JobError> {
        debug!(base_url = %config.base_url, model = %config.model, "HttpJobApi::from_config: called");
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(JobError::Network)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            http,
            settings,
        })
    }

    /// Current bearer header value, or ConfigurationMissing
    fn authorization(&self) -> Result<String, JobError> {
        let settings = self.settings.snapshot();
        match settings.credential() {
            Some(key) => Ok(format!("Bearer {}", key.expose())),
            None => {
                debug!("authorization: no credential configured");
                Err(JobError::ConfigurationMissing)
            }
        }
    }

    /// Unwrap the `{code, msg, data}` envelope, mapping error codes
    async fn read_envelope<T: DeserializeOwned>(response: Response) -> Result<T, JobError> {
        let status = response.status();
        let text = response.text().await?;
        debug!(%status, body_len = text.len(), "read_envelope: called");

        if !status.is_success() {
            let remote_msg = serde_json::from_str::<Envelope<serde_json::Value>>(&text)
                .ok()
                .and_then(|e| e.msg);
            debug!(%status, "read_envelope: HTTP error status");
            return Err(JobError::from_code(i64::from(status.as_u16()), remote_msg.as_deref()));
        }

        let envelope: Envelope<T> = serde_json::from_str(&text)?;
        if envelope.code != CODE_OK {
            debug!(code = envelope.code, "read_envelope: error envelope");
            return Err(JobError::from_code(envelope.code, envelope.msg.as_deref()));
        }

        envelope
            .data
            .ok_or_else(|| JobError::InvalidResponse("Response has no data".to_string()))
    }
}

#[async_trait]
impl JobApi for HttpJobApi {
    async fn submit(&self, prompt: &str, options: &GenerationOptions) -> Result<String, JobError> {
        debug!(%self.model, prompt_len = prompt.len(), ?options, "submit: called");
        let authorization = self.authorization()?;
        let url = format!("{}/createTask", self.base_url);
        let body = CreateTaskRequest {
            model: &self.model,
            input: CreateTaskInput {
                prompt,
                image_input: Vec::new(),
                aspect_ratio: &options.aspect_ratio,
                resolution: &options.resolution,
                output_format: &options.output_format,
            },
        };

        let response = self
            .http
            .post(&url)
            .header("Authorization", authorization)
            .json(&body)
            .send()
            .await?;

        let data: CreateTaskData = Self::read_envelope(response).await?;
        match data.task_id {
            Some(task_id) if !task_id.is_empty() => {
                debug!(%task_id, "submit: task created");
                Ok(task_id)
            }
            _ => Err(JobError::InvalidResponse("Response has no taskId".to_string())),
        }
    }

    async fn poll(&self, task_id: &str) -> Result<JobStatus, JobError> {
        debug!(%task_id, "poll: called");
        let authorization = self.authorization()?;
        let url = format!("{}/recordInfo", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("taskId", task_id)])
            .header("Authorization", authorization)
            .send()
            .await?;

        let data: RecordInfoData = Self::read_envelope(response).await?;
        let state = data
            .state
            .as_deref()
            .map(JobState::parse)
            .ok_or_else(|| JobError::InvalidResponse("Response has no state".to_string()))?;

        let mut status = JobStatus::new(task_id, state);
        status.fail_msg = data.fail_msg.filter(|m| !m.is_empty());
        if status.state == JobState::Success
            && let Some(raw) = data.result_json.as_deref().filter(|s| !s.trim().is_empty())
        {
            let result: ResultJson = serde_json::from_str(raw)?;
            status.result_urls = result.result_urls;
        }

        debug!(state = %status.state, urls = status.result_urls.len(), "poll: parsed status");
        Ok(status)
    }
}
