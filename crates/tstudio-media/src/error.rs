//! Error types for media operations.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while reading frames or detecting transitions.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Cannot open frame source {source_name}: {message}")]
    SourceOpen {
        source_name: String,
        message: String,
    },

    #[error("Frame {index} could not be decoded: {message}")]
    Decode { index: u64, message: String },

    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFprobe not found in PATH")]
    FfprobeNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("FFprobe command failed: {message}")]
    FfprobeFailed {
        message: String,
        stderr: Option<String>,
    },

    #[error("Invalid video file: {0}")]
    InvalidVideo(String),

    #[error("Invalid detection config: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl MediaError {
    /// Create a source-open failure.
    pub fn source_open(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceOpen {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Create a per-frame decode failure.
    pub fn decode(index: u64, message: impl Into<String>) -> Self {
        Self::Decode {
            index,
            message: message.into(),
        }
    }

    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Stable snake_case kind, stored with failed analysis records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SourceOpen { .. } => "source_open",
            Self::Decode { .. } => "decode_skip",
            Self::FfmpegNotFound => "ffmpeg_not_found",
            Self::FfprobeNotFound => "ffprobe_not_found",
            Self::FfmpegFailed { .. } => "ffmpeg_failed",
            Self::FfprobeFailed { .. } => "ffprobe_failed",
            Self::InvalidVideo(_) => "invalid_video",
            Self::InvalidConfig(_) => "invalid_config",
            Self::Io(_) => "io",
            Self::JsonParse(_) => "json_parse",
        }
    }

    /// Whether this error aborts a detection run.
    ///
    /// Only single-frame decode failures are recoverable; the frame is
    /// skipped and the run continues.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Decode { .. })
    }
}
