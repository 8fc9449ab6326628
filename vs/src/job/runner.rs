//! Job runner
//!
//! Submits a job once, then polls at a fixed interval until the job reaches a
//! terminal state or the attempt budget runs out.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{GenerationOptions, JobApi, JobError, JobProgress, JobState, JobStatus};
use crate::config::PollingConfig;

/// Fixed-interval polling policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollConfig {
    fn from(config: &PollingConfig) -> Self {
        Self {
            interval: Duration::from_millis(config.interval_ms),
            // at least one poll, so a job is never abandoned unseen
            max_attempts: config.max_attempts.max(1),
        }
    }
}

/// Drives generation jobs to completion against a [`JobApi`]
pub struct JobRunner {
    api: Arc<dyn JobApi>,
    poll: PollConfig,
}

impl JobRunner {
    pub fn new(api: Arc<dyn JobApi>, poll: PollConfig) -> Self {
        debug!(?poll, "JobRunner::new: called");
        Self { api, poll }
    }

    /// Submit a job without waiting for it
    pub async fn submit(&self, prompt: &str, options: &GenerationOptions) -> Result<String, JobError> {
        debug!(prompt_len = prompt.len(), "JobRunner::submit: called");
        self.api.submit(prompt, options).await
    }

    /// Poll a job once
    pub async fn status(&self, task_id: &str) -> Result<JobStatus, JobError> {
        debug!(%task_id, "JobRunner::status: called");
        self.api.poll(task_id).await
    }

    /// Submit a job and poll it to a terminal state, returning the first image URL
    ///
    /// One [`JobProgress`] is sent per successful poll, before its result is
    /// evaluated. A transient poll error counts as a used attempt and is retried
    /// silently, except on the final attempt where it is returned. Any other poll
    /// error is returned at once.
    pub async fn run_to_completion(
        &self,
        prompt: &str,
        options: &GenerationOptions,
        progress_tx: mpsc::Sender<JobProgress>,
    ) -> Result<String, JobError> {
        debug!(prompt_len = prompt.len(), ?options, "JobRunner::run_to_completion: called");
        let task_id = self.submit(prompt, options).await?;
        info!("Submitted generation task {}", task_id);

        let max_attempts = self.poll.max_attempts;
        for attempts in 1..=max_attempts {
            let status = match self.api.poll(&task_id).await {
                Ok(status) => status,
                Err(e) if e.is_transient() && attempts < max_attempts => {
                    warn!(%task_id, attempts, error = %e, "run_to_completion: poll failed, retrying");
                    tokio::time::sleep(self.poll.interval).await;
                    continue;
                }
                Err(e) => {
                    debug!(%task_id, attempts, error = %e, "run_to_completion: poll failed, giving up");
                    return Err(e);
                }
            };

            let _ = progress_tx
                .send(JobProgress {
                    state: status.state.clone(),
                    attempts,
                    max_attempts,
                })
                .await;

            if status.state.is_terminal() {
                return Self::finish(status);
            }

            debug!(%task_id, attempts, state = %status.state, "run_to_completion: not finished");
            if attempts < max_attempts {
                tokio::time::sleep(self.poll.interval).await;
            }
        }

        info!("Generation task {} timed out after {} attempts", task_id, max_attempts);
        Err(JobError::Timeout {
            attempts: max_attempts,
        })
    }
}

impl JobRunner {
    /// Result of a poll in a terminal state
    fn finish(status: JobStatus) -> Result<String, JobError> {
        if status.state == JobState::Success {
            debug!(task_id = %status.task_id, "finish: success");
            return status.result_urls.into_iter().next().ok_or(JobError::MissingResult);
        }
        debug!(task_id = %status.task_id, "finish: remote failure");
        let reason = status.fail_msg.unwrap_or_else(|| "Unknown error".to_string());
        Err(JobError::RemoteJobFailed(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::api::mock::MockJobApi;

    fn runner(api: Arc<MockJobApi>, max_attempts: u32) -> JobRunner {
        JobRunner::new(
            api,
            PollConfig {
                interval: Duration::from_millis(1),
                max_attempts,
            },
        )
    }

    async fn drain(mut rx: mpsc::Receiver<JobProgress>) -> Vec<JobProgress> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_success_after_processing() {
        let api = Arc::new(MockJobApi::new(vec![
            MockJobApi::status(JobState::Processing),
            MockJobApi::status(JobState::Processing),
            MockJobApi::success(&["https://x/y.png"]),
        ]));
        let (tx, rx) = mpsc::channel(64);

        let url = runner(api.clone(), 30)
            .run_to_completion("prompt", &GenerationOptions::default(), tx)
            .await
            .unwrap();

        assert_eq!(url, "https://x/y.png");
        let events = drain(rx).await;
        assert_eq!(events.iter().map(|e| e.attempts).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(events.iter().all(|e| e.max_attempts == 30));
        assert_eq!(events[0].state, JobState::Processing);
        assert_eq!(events[2].state, JobState::Success);
        assert_eq!(api.submitted().len(), 1);
    }

    #[tokio::test]
    async fn test_first_url_is_returned() {
        let api = Arc::new(MockJobApi::new(vec![MockJobApi::success(&["https://a", "https://b"])]));
        let (tx, _rx) = mpsc::channel(64);
        let url = runner(api, 3)
            .run_to_completion("p", &GenerationOptions::default(), tx)
            .await
            .unwrap();
        assert_eq!(url, "https://a");
    }

    #[tokio::test]
    async fn test_timeout_after_max_attempts() {
        let api = Arc::new(MockJobApi::new(vec![
            MockJobApi::status(JobState::Processing),
            MockJobApi::status(JobState::Processing),
            MockJobApi::status(JobState::Processing),
            MockJobApi::status(JobState::Processing),
        ]));
        let (tx, rx) = mpsc::channel(64);

        let err = runner(api.clone(), 3)
            .run_to_completion("p", &GenerationOptions::default(), tx)
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::Timeout { attempts: 3 }));
        assert_eq!(api.poll_count(), 3);
        assert_eq!(drain(rx).await.len(), 3);
    }

    #[tokio::test]
    async fn test_remote_failure_carries_reason() {
        let api = Arc::new(MockJobApi::new(vec![
            MockJobApi::status(JobState::Queued),
            MockJobApi::failed(Some("quota exceeded")),
        ]));
        let (tx, _rx) = mpsc::channel(64);

        let err = runner(api, 30)
            .run_to_completion("p", &GenerationOptions::default(), tx)
            .await
            .unwrap_err();

        match err {
            JobError::RemoteJobFailed(reason) => assert_eq!(reason, "quota exceeded"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remote_failure_without_reason() {
        let api = Arc::new(MockJobApi::new(vec![MockJobApi::failed(None)]));
        let (tx, _rx) = mpsc::channel(64);
        let err = runner(api, 30)
            .run_to_completion("p", &GenerationOptions::default(), tx)
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::RemoteJobFailed(ref r) if r == "Unknown error"));
    }

    #[tokio::test]
    async fn test_success_without_urls_is_missing_result() {
        let api = Arc::new(MockJobApi::new(vec![MockJobApi::success(&[])]));
        let (tx, _rx) = mpsc::channel(64);
        let err = runner(api, 30)
            .run_to_completion("p", &GenerationOptions::default(), tx)
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::MissingResult));
    }

    #[tokio::test]
    async fn test_unrecognized_state_keeps_polling() {
        let api = Arc::new(MockJobApi::new(vec![
            MockJobApi::status(JobState::Other("paused".to_string())),
            MockJobApi::success(&["https://x/z.png"]),
        ]));
        let (tx, _rx) = mpsc::channel(64);
        let url = runner(api, 5)
            .run_to_completion("p", &GenerationOptions::default(), tx)
            .await
            .unwrap();
        assert_eq!(url, "https://x/z.png");
    }

    #[tokio::test]
    async fn test_transient_error_is_swallowed_before_last_attempt() {
        let api = Arc::new(MockJobApi::new(vec![
            Err(JobError::InvalidResponse("connection reset".to_string())),
            MockJobApi::status(JobState::Processing),
            MockJobApi::success(&["https://x/y.png"]),
        ]));
        let (tx, rx) = mpsc::channel(64);

        let url = runner(api.clone(), 5)
            .run_to_completion("p", &GenerationOptions::default(), tx)
            .await
            .unwrap();

        assert_eq!(url, "https://x/y.png");
        assert_eq!(api.poll_count(), 3);
        // the failed poll consumed attempt 1 without a progress event
        let attempts: Vec<_> = drain(rx).await.iter().map(|e| e.attempts).collect();
        assert_eq!(attempts, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_error_on_final_attempt_propagates() {
        let api = Arc::new(MockJobApi::new(vec![
            MockJobApi::status(JobState::Processing),
            Err(JobError::InvalidResponse("first".to_string())),
            Err(JobError::InvalidResponse("last".to_string())),
        ]));
        let (tx, _rx) = mpsc::channel(64);

        let err = runner(api, 3)
            .run_to_completion("p", &GenerationOptions::default(), tx)
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::InvalidResponse(ref m) if m == "last"));
    }

    #[tokio::test]
    async fn test_permanent_poll_error_stops_polling() {
        let api = Arc::new(MockJobApi::new(vec![
            MockJobApi::status(JobState::Processing),
            Err(JobError::from_code(401, None)),
            MockJobApi::success(&["https://x/y.png"]),
        ]));
        let (tx, rx) = mpsc::channel(64);

        let err = runner(api.clone(), 30)
            .run_to_completion("p", &GenerationOptions::default(), tx)
            .await
            .unwrap_err();

        assert!(matches!(err, JobError::Api { code: 401, .. }));
        assert_eq!(api.poll_count(), 2);
        assert_eq!(drain(rx).await.len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limited_poll_is_retried() {
        let api = Arc::new(MockJobApi::new(vec![
            Err(JobError::from_code(429, None)),
            MockJobApi::success(&["https://x/y.png"]),
        ]));
        let (tx, _rx) = mpsc::channel(64);
        let url = runner(api, 3)
            .run_to_completion("p", &GenerationOptions::default(), tx)
            .await
            .unwrap();
        assert_eq!(url, "https://x/y.png");
    }

    #[tokio::test]
    async fn test_progress_receiver_dropped() {
        let api = Arc::new(MockJobApi::new(vec![MockJobApi::success(&["https://x"])]));
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let url = runner(api, 3)
            .run_to_completion("p", &GenerationOptions::default(), tx)
            .await
            .unwrap();
        assert_eq!(url, "https://x");
    }

    #[test]
    fn test_poll_config_from_settings() {
        let config = PollConfig::from(&PollingConfig {
            interval_ms: 500,
            max_attempts: 0,
        });
        assert_eq!(config.interval, Duration::from_millis(500));
        assert_eq!(config.max_attempts, 1);
        assert_eq!(PollConfig::default().max_attempts, 30);
    }
}
