//! Video analysis records.
//!
//! A `VideoAnalysis` is the persistent record of one transition detection
//! job. It is created in `processing`, then moves once to either
//! `completed` (with the full transition list) or `failed` (with an error
//! message). Transitions are never attached to a record that is not
//! completed.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{ModelError, ModelResult};
use crate::transition::{is_well_spaced, Transition};

/// Unique identifier for an analysis record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AnalysisId(pub String);

impl AnalysisId {
    /// Generate a new random analysis ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AnalysisId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AnalysisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AnalysisId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Status of an analysis job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisStatus {
    /// Job accepted and running
    #[default]
    Processing,
    /// Analysis finished, results attached
    Completed,
    /// Analysis failed, error attached
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Returns true if no further updates are expected.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structured failure attached to a failed analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisFailure {
    /// Stable machine-readable kind (e.g. `source_open`, `timeout`)
    pub kind: String,
    /// Human-readable message
    pub message: String,
}

/// Persistent record of a transition analysis.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VideoAnalysis {
    pub id: AnalysisId,

    /// Where the source video can be fetched from
    pub video_url: String,

    /// Original file name as uploaded
    pub video_name: String,

    #[serde(rename = "analysis_status")]
    pub status: AnalysisStatus,

    /// Video duration in seconds (0 until completed)
    #[serde(default)]
    pub duration: f64,

    #[serde(default)]
    pub transitions: Vec<Transition>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AnalysisFailure>,

    pub created_date: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub processed_at: Option<DateTime<Utc>>,
}

impl VideoAnalysis {
    /// Create a new record in the `processing` state.
    pub fn new(video_url: impl Into<String>, video_name: impl Into<String>) -> Self {
        Self {
            id: AnalysisId::new(),
            video_url: video_url.into(),
            video_name: video_name.into(),
            status: AnalysisStatus::Processing,
            duration: 0.0,
            transitions: Vec::new(),
            error: None,
            created_date: Utc::now(),
            processed_at: None,
        }
    }

    /// Attach results and mark completed.
    ///
    /// Rejects a transition list that is not strictly increasing with gaps
    /// greater than `min_gap`, and refuses to overwrite a terminal record.
    pub fn complete(
        &mut self,
        duration: f64,
        transitions: Vec<Transition>,
        min_gap: f64,
    ) -> ModelResult<()> {
        self.ensure_open()?;
        if !is_well_spaced(&transitions, min_gap) {
            return Err(ModelError::invalid_record(
                "transitions must be strictly increasing and separated by the dedup gap",
            ));
        }
        if transitions
            .iter()
            .any(|t| !(0.0..=1.0).contains(&t.confidence))
        {
            return Err(ModelError::invalid_record("confidence outside [0, 1]"));
        }

        self.duration = duration.max(0.0);
        self.transitions = transitions;
        self.status = AnalysisStatus::Completed;
        self.processed_at = Some(Utc::now());
        Ok(())
    }

    /// Mark failed with a structured error. Any partial results are dropped.
    pub fn fail(&mut self, kind: impl Into<String>, message: impl Into<String>) -> ModelResult<()> {
        self.ensure_open()?;
        self.status = AnalysisStatus::Failed;
        self.transitions.clear();
        self.error = Some(AnalysisFailure {
            kind: kind.into(),
            message: message.into(),
        });
        self.processed_at = Some(Utc::now());
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn ensure_open(&self) -> ModelResult<()> {
        if self.is_terminal() {
            return Err(ModelError::AlreadyFinished {
                id: self.id.to_string(),
                status: self.status,
            });
        }
        Ok(())
    }
}
