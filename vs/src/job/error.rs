//! Job error types

use thiserror::Error;

/// Fixed user-facing message for a remote error code
pub fn code_message(code: i64) -> Option<&'static str> {
    match code {
        400 => Some("Malformed request"),
        401 => Some("Invalid API key"),
        402 => Some("Insufficient account balance"),
        404 => Some("Resource not found"),
        422 => Some("Request validation failed"),
        429 => Some("Too many requests, please try again later"),
        500 => Some("Image service error"),
        _ => None,
    }
}

/// Errors that can occur while submitting or polling a generation job
#[derive(Debug, Error)]
pub enum JobError {
    #[error("No API key configured")]
    ConfigurationMissing,

    #[error("API error {code}: {message}")]
    Api { code: i64, message: String },

    #[error("Image generation failed: {0}")]
    RemoteJobFailed(String),

    #[error("Job succeeded but returned no image")]
    MissingResult,

    #[error("Job did not finish after {attempts} attempts")]
    Timeout { attempts: u32 },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl JobError {
    /// Build an API error from a remote code, using the fixed message table
    ///
    /// Unmapped codes keep the remote message, or "Unknown error" without one.
    pub fn from_code(code: i64, remote_msg: Option<&str>) -> Self {
        let message = match code_message(code) {
            Some(m) => m.to_string(),
            None => remote_msg
                .filter(|m| !m.trim().is_empty())
                .unwrap_or("Unknown error")
                .to_string(),
        };
        JobError::Api { code, message }
    }

    /// Network, parse and server-side errors; polling retries these before its final attempt
    pub fn is_transient(&self) -> bool {
        match self {
            JobError::Network(_) => true,
            JobError::Json(_) => true,
            JobError::InvalidResponse(_) => true,
            JobError::Api { code, .. } => *code == 429 || *code >= 500,
            JobError::ConfigurationMissing => false,
            JobError::RemoteJobFailed(_) => false,
            JobError::MissingResult => false,
            JobError::Timeout { .. } => false,
        }
    }
}
