//! Job types and wire formats

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::settings::Settings;

/// Remote state of a generation job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum JobState {
    Queued,
    Processing,
    Success,
    Fail,
    /// A state string this client does not recognize
    Other(String),
}

impl JobState {
    pub fn parse(s: &str) -> Self {
        match s {
            "queued" | "queuing" | "waiting" => Self::Queued,
            "processing" | "generating" => Self::Processing,
            "success" => Self::Success,
            "fail" => Self::Fail,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Queued => "queued",
            Self::Processing => "processing",
            Self::Success => "success",
            Self::Fail => "fail",
            Self::Other(s) => s,
        }
    }

    /// `success` and `fail` end polling
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success | Self::Fail)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for JobState {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<JobState> for String {
    fn from(state: JobState) -> Self {
        state.as_str().to_string()
    }
}

/// Output options sent with each job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub resolution: String,
    pub output_format: String,
    pub aspect_ratio: String,
}

impl From<&Settings> for GenerationOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            resolution: settings.resolution.clone(),
            output_format: settings.output_format.clone(),
            aspect_ratio: settings.aspect_ratio.clone(),
        }
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

/// One poll result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub task_id: String,
    pub state: JobState,
    /// Produced image URLs, populated on success
    pub result_urls: Vec<String>,
    /// Remote failure reason, populated on fail
    pub fail_msg: Option<String>,
}

impl JobStatus {
    pub fn new(task_id: impl Into<String>, state: JobState) -> Self {
        Self {
            task_id: task_id.into(),
            state,
            result_urls: Vec::new(),
            fail_msg: None,
        }
    }
}

/// Progress event emitted once per completed poll
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobProgress {
    pub state: JobState,
    pub attempts: u32,
    pub max_attempts: u32,
}

impl fmt::Display for JobProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}/{}] {}", self.attempts, self.max_attempts, self.state)
    }
}

/// Response envelope shared by every endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    pub data: Option<T>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateTaskRequest<'a> {
    pub model: &'a str,
    pub input: CreateTaskInput<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateTaskInput<'a> {
    pub prompt: &'a str,
    pub image_input: Vec<String>,
    pub aspect_ratio: &'a str,
    pub resolution: &'a str,
    pub output_format: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateTaskData {
    #[serde(rename = "taskId")]
    pub task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordInfoData {
    #[serde(default)]
    pub state: Option<String>,
    #[serde(rename = "failMsg", default)]
    pub fail_msg: Option<String>,
    /// JSON-encoded string holding [`ResultJson`]
    #[serde(rename = "resultJson", default)]
    pub result_json: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResultJson {
    #[serde(rename = "resultUrls", default)]
    pub result_urls: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_parse() {
        assert_eq!(JobState::parse("queued"), JobState::Queued);
        assert_eq!(JobState::parse("waiting"), JobState::Queued);
        assert_eq!(JobState::parse("processing"), JobState::Processing);
        assert_eq!(JobState::parse("success"), JobState::Success);
        assert_eq!(JobState::parse("fail"), JobState::Fail);
        assert_eq!(JobState::parse("paused"), JobState::Other("paused".to_string()));
    }

    #[test]
    fn test_terminal_states() {
        assert!(JobState::Success.is_terminal());
        assert!(JobState::Fail.is_terminal());
        assert!(!JobState::Queued.is_terminal());
        assert!(!JobState::Processing.is_terminal());
        assert!(!JobState::Other("x".to_string()).is_terminal());
    }

    #[test]
    fn test_progress_display() {
        let progress = JobProgress {
            state: JobState::Processing,
            attempts: 2,
            max_attempts: 30,
        };
        assert_eq!(progress.to_string(), "[2/30] processing");
    }

    #[test]
    fn test_options_from_settings() {
        let settings = Settings {
            resolution: "4K".to_string(),
            ..Default::default()
        };
        let options = GenerationOptions::from(&settings);
        assert_eq!(options.resolution, "4K");
        assert_eq!(options.output_format, "png");
        assert_eq!(options.aspect_ratio, "3:4");
    }

    #[test]
    fn test_create_task_body_shape() {
        let body = CreateTaskRequest {
            model: "m",
            input: CreateTaskInput {
                prompt: "p",
                image_input: vec![],
                aspect_ratio: "3:4",
                resolution: "2K",
                output_format: "png",
            },
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "model": "m",
                "input": {
                    "prompt": "p",
                    "image_input": [],
                    "aspect_ratio": "3:4",
                    "resolution": "2K",
                    "output_format": "png"
                }
            })
        );
    }

    #[test]
    fn test_error_envelope_without_data() {
        let envelope: Envelope<CreateTaskData> =
            serde_json::from_str(r#"{"code": 402, "msg": "balance too low"}"#).unwrap();
        assert_eq!(envelope.code, 402);
        assert!(envelope.data.is_none());

        let envelope: Envelope<RecordInfoData> = serde_json::from_str(r#"{"code": 500}"#).unwrap();
        assert!(envelope.msg.is_none());
        assert!(envelope.data.is_none());
    }

    #[test]
    fn test_record_info_with_nested_result() {
        let envelope: Envelope<RecordInfoData> = serde_json::from_str(
            r#"{"code": 200, "msg": "success", "data": {"state": "success", "resultJson": "{\"resultUrls\":[\"https://x/y.png\"]}"}}"#,
        )
        .unwrap();
        let data = envelope.data.unwrap();
        let result: ResultJson = serde_json::from_str(data.result_json.as_deref().unwrap()).unwrap();
        assert_eq!(result.result_urls, vec!["https://x/y.png"]);
    }
}
