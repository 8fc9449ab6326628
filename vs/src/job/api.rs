//! JobApi trait definition

use async_trait::async_trait;

use super::{GenerationOptions, JobError, JobStatus};

/// Remote image generation service
///
/// Each call is independent; polling policy lives in [`super::JobRunner`].
#[async_trait]
pub trait JobApi: Send + Sync {
    /// Create a generation task, returning its remote task id
    async fn submit(&self, prompt: &str, options: &GenerationOptions) -> Result<String, JobError>;

    /// Fetch the current state of a task
    async fn poll(&self, task_id: &str) -> Result<JobStatus, JobError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use crate::job::JobState;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;
    use tracing::debug;

    /// Mock job API for unit tests
    ///
    /// Poll responses are returned in order; once exhausted every poll errors.
    pub struct MockJobApi {
        task_id: String,
        polls: Mutex<VecDeque<Result<JobStatus, JobError>>>,
        submitted: Mutex<Vec<(String, GenerationOptions)>>,
        poll_count: AtomicUsize,
        /// When set, every poll waits for a notification first
        gate: Option<Arc<Notify>>,
    }

    impl MockJobApi {
        pub fn new(polls: Vec<Result<JobStatus, JobError>>) -> Self {
            debug!(poll_count = %polls.len(), "MockJobApi::new: called");
            Self {
                task_id: "task-1".to_string(),
                polls: Mutex::new(polls.into()),
                submitted: Mutex::new(Vec::new()),
                poll_count: AtomicUsize::new(0),
                gate: None,
            }
        }

        /// Polls block until `gate` is notified
        pub fn gated(mut self, gate: Arc<Notify>) -> Self {
            self.gate = Some(gate);
            self
        }

        pub fn status(state: JobState) -> Result<JobStatus, JobError> {
            Ok(JobStatus::new("task-1", state))
        }

        pub fn success(urls: &[&str]) -> Result<JobStatus, JobError> {
            let mut status = JobStatus::new("task-1", JobState::Success);
            status.result_urls = urls.iter().map(|u| u.to_string()).collect();
            Ok(status)
        }

        pub fn failed(reason: Option<&str>) -> Result<JobStatus, JobError> {
            let mut status = JobStatus::new("task-1", JobState::Fail);
            status.fail_msg = reason.map(str::to_string);
            Ok(status)
        }

        pub fn poll_count(&self) -> usize {
            self.poll_count.load(Ordering::SeqCst)
        }

        pub fn submitted(&self) -> Vec<(String, GenerationOptions)> {
            self.submitted.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl JobApi for MockJobApi {
        async fn submit(&self, prompt: &str, options: &GenerationOptions) -> Result<String, JobError> {
            debug!("MockJobApi::submit: called");
            self.submitted
                .lock()
                .unwrap()
                .push((prompt.to_string(), options.clone()));
            Ok(self.task_id.clone())
        }

        async fn poll(&self, task_id: &str) -> Result<JobStatus, JobError> {
            debug!(%task_id, "MockJobApi::poll: called");
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.poll_count.fetch_add(1, Ordering::SeqCst);
            self.polls
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(JobError::InvalidResponse("No more mock responses".to_string())))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_returns_polls_in_order() {
            let api = MockJobApi::new(vec![
                MockJobApi::status(JobState::Processing),
                MockJobApi::success(&["https://x/y.png"]),
            ]);

            let id = api.submit("prompt", &GenerationOptions::default()).await.unwrap();
            assert_eq!(id, "task-1");
            assert_eq!(api.poll(&id).await.unwrap().state, JobState::Processing);
            assert_eq!(api.poll(&id).await.unwrap().result_urls, vec!["https://x/y.png"]);
            assert!(api.poll(&id).await.is_err());
            assert_eq!(api.poll_count(), 3);
            assert_eq!(api.submitted()[0].0, "prompt");
        }
    }
}
