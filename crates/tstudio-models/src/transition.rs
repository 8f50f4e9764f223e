//! Scene transition records.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of visual transition between two shots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransitionType {
    /// Hard cut between unrelated shots
    Cut,
    /// Fade to or from a flat field (usually black)
    Fade,
    /// Cross-dissolve blending two shots
    Dissolve,
    /// One shot pushing the other off screen
    Wipe,
    /// Horizontal camera move
    Pan,
    /// Scale change of the framed subject
    Zoom,
}

impl TransitionType {
    /// All variants in declaration order.
    pub const ALL: [TransitionType; 6] = [
        TransitionType::Cut,
        TransitionType::Fade,
        TransitionType::Dissolve,
        TransitionType::Wipe,
        TransitionType::Pan,
        TransitionType::Zoom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionType::Cut => "cut",
            TransitionType::Fade => "fade",
            TransitionType::Dissolve => "dissolve",
            TransitionType::Wipe => "wipe",
            TransitionType::Pan => "pan",
            TransitionType::Zoom => "zoom",
        }
    }
}

impl fmt::Display for TransitionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A detected scene transition.
///
/// `confidence` is a heuristic certainty in `[0, 1]`, not a calibrated
/// probability. `detection_score` is the weighted composite of the
/// normalized frame-difference signals that triggered the detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transition {
    /// Position in the video, in seconds
    pub timestamp: f64,

    /// Classified transition kind
    #[serde(rename = "type")]
    pub kind: TransitionType,

    /// Classifier certainty in [0, 1]
    pub confidence: f64,

    /// Composite score that fired the detection
    pub detection_score: f64,

    /// Human-readable note about the visual evidence
    #[serde(default)]
    pub visual_cue: String,

    /// Human-readable note about the expected audio behaviour
    #[serde(default)]
    pub audio_cue: String,
}

impl Transition {
    /// Create a transition with the standard cue annotations.
    pub fn new(timestamp: f64, kind: TransitionType, confidence: f64, detection_score: f64) -> Self {
        Self {
            timestamp,
            kind,
            confidence: confidence.clamp(0.0, 1.0),
            detection_score,
            visual_cue: format!("Detected {} based on brightness/color change.", kind),
            audio_cue: "Audio change likely.".to_string(),
        }
    }
}

/// Check that transitions are strictly increasing and separated by more than `min_gap`.
pub fn is_well_spaced(transitions: &[Transition], min_gap: f64) -> bool {
    transitions
        .windows(2)
        .all(|pair| pair[1].timestamp - pair[0].timestamp > min_gap)
}
