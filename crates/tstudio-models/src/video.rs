//! Video metadata models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Frame rate substituted when the container reports none.
pub const DEFAULT_FPS: f64 = 30.0;

/// Source video metadata read from the container.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VideoStats {
    /// Frames per second (always > 0 once normalized)
    pub fps: f64,
    /// Number of frames reported by the container
    pub total_frames: u64,
    /// Duration in seconds
    pub duration_seconds: f64,
}

impl VideoStats {
    /// Build stats from a frame count, deriving duration as `total_frames / fps`.
    pub fn from_frame_count(fps: f64, total_frames: u64) -> Self {
        let fps = normalize_fps(fps);
        Self {
            fps,
            total_frames,
            duration_seconds: Self::duration_from_frames(total_frames, fps),
        }
    }

    /// Duration implied by a frame count at the given rate.
    pub fn duration_from_frames(total_frames: u64, fps: f64) -> f64 {
        let fps = normalize_fps(fps);
        total_frames as f64 / fps
    }

    /// Copy of these stats with a usable frame rate.
    pub fn normalized(self) -> Self {
        Self {
            fps: normalize_fps(self.fps),
            duration_seconds: self.duration_seconds.max(0.0),
            ..self
        }
    }
}

/// Replace a missing or nonsensical frame rate with [`DEFAULT_FPS`].
pub fn normalize_fps(fps: f64) -> f64 {
    if fps.is_finite() && fps > 0.0 {
        fps
    } else {
        DEFAULT_FPS
    }
}
