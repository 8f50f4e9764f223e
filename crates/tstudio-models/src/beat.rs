//! Audio beat analysis records.
//!
//! Beat tracking itself runs in an external service. These types only
//! describe the record it produces so that it can be stored next to the
//! visual transition analysis.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::analysis::{AnalysisFailure, AnalysisId, AnalysisStatus};

/// Multiplier on the activation standard deviation for a beat to count as prominent.
pub const PROMINENCE_FACTOR: f64 = 1.5;

/// A single beat position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Beat {
    pub timestamp: f64,
}

/// A beat whose activation stands out from the rest of the track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StrongBeat {
    pub timestamp: f64,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Persistent record of a beat analysis.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BeatAnalysis {
    pub id: AnalysisId,
    #[serde(rename = "audio_url")]
    pub audio_url: String,
    #[serde(rename = "audio_name")]
    pub audio_name: String,
    #[serde(rename = "analysis_status")]
    pub status: AnalysisStatus,
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub beats: Vec<Beat>,
    #[serde(default)]
    pub strong_beats: Vec<StrongBeat>,
    #[serde(default)]
    pub total_beats: usize,
    #[serde(default)]
    pub total_strong_beats: usize,
    #[serde(default)]
    pub tempo: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<AnalysisFailure>,
    #[serde(rename = "created_date")]
    pub created_date: DateTime<Utc>,
}

impl BeatAnalysis {
    pub fn new(audio_url: impl Into<String>, audio_name: impl Into<String>) -> Self {
        Self {
            id: AnalysisId::new(),
            audio_url: audio_url.into(),
            audio_name: audio_name.into(),
            status: AnalysisStatus::Processing,
            duration: 0.0,
            beats: Vec::new(),
            strong_beats: Vec::new(),
            total_beats: 0,
            total_strong_beats: 0,
            tempo: 0,
            error: None,
            created_date: Utc::now(),
        }
    }

    /// Attach tracker output. Strong beats are selected from `activations`,
    /// which must hold one activation per beat.
    pub fn complete(&mut self, duration: f64, beats: &[f64], activations: &[f64], tempo: u32) {
        self.duration = duration.max(0.0);
        self.beats = beats.iter().map(|&timestamp| Beat { timestamp }).collect();
        self.strong_beats = prominent_beats(beats, activations)
            .into_iter()
            .map(|timestamp| StrongBeat {
                timestamp,
                kind: "hook".to_string(),
            })
            .collect();
        self.total_beats = self.beats.len();
        self.total_strong_beats = self.strong_beats.len();
        self.tempo = tempo;
        self.status = AnalysisStatus::Completed;
    }
}

/// Beats whose activation is at least `mean + 1.5 * stddev` of all beat activations.
pub fn prominent_beats(beats: &[f64], activations: &[f64]) -> Vec<f64> {
    let n = beats.len().min(activations.len());
    if n == 0 {
        return Vec::new();
    }
    let acts = &activations[..n];
    let mean = acts.iter().sum::<f64>() / n as f64;
    let variance = acts.iter().map(|a| (a - mean).powi(2)).sum::<f64>() / n as f64;
    let threshold = mean + PROMINENCE_FACTOR * variance.sqrt();

    beats[..n]
        .iter()
        .zip(acts)
        .filter(|(_, a)| **a >= threshold)
        .map(|(&b, _)| b)
        .collect()
}
