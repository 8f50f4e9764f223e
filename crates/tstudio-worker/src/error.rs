//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Job failed: {0}")]
    JobFailed(String),

    #[error("Job timed out after {secs}s")]
    Timeout { secs: u64 },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Media error: {0}")]
    Media(#[from] tstudio_media::MediaError),

    #[error("Record error: {0}")]
    Model(#[from] tstudio_models::ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl WorkerError {
    pub fn job_failed(msg: impl Into<String>) -> Self {
        Self::JobFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Failure kind stored with a failed analysis record.
    pub fn kind(&self) -> &'static str {
        match self {
            WorkerError::JobFailed(_) => "job_failed",
            WorkerError::Timeout { .. } => "timeout",
            WorkerError::ConfigError(_) => "config",
            WorkerError::Store(_) => "store",
            WorkerError::Media(e) => e.kind(),
            WorkerError::Model(_) => "invalid_record",
            WorkerError::Io(_) => "io",
            WorkerError::Json(_) => "json",
        }
    }
}
