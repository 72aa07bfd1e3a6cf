//! AWS CLI error types

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AwsError {
    #[error("aws CLI not found on PATH. Install it with: pip install awscli")]
    CliNotFound,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("command timed out after {0:?}")]
    Timeout(Duration),

    #[error("aws {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AwsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, AwsError::NotFound(_))
    }
}

/// Markers the AWS CLI prints when a resource genuinely does not exist.
/// Anything else on stderr stays a hard failure: a describe call that
/// dies on auth or networking must not be read as "absent".
const NOT_FOUND_MARKERS: &[&str] = &[
    "ResourceNotFoundException",
    "ResourceNotFound",
    "NotFoundException",
    "PipelineNotFoundException",
    "NoSuchEntity",
    "NoSuchBucket",
    "NoSuchKey",
    "(404)",
    "Not Found",
    "does not exist",
];

/// Classify CLI stderr: not-found signals become [`AwsError::NotFound`],
/// everything else a [`AwsError::CommandFailed`].
pub fn classify_failure(command: &str, stderr: &str) -> AwsError {
    if NOT_FOUND_MARKERS.iter().any(|m| stderr.contains(m)) {
        AwsError::NotFound(stderr.trim().to_string())
    } else {
        AwsError::CommandFailed {
            command: command.to_string(),
            stderr: stderr.trim().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AwsError>;
