//! Shared data models for Transition Studio.
//!
//! This crate provides Serde-serializable types for:
//! - Detected scene transitions
//! - Source video metadata
//! - Video and beat analysis records

pub mod analysis;
pub mod beat;
pub mod error;
pub mod transition;
pub mod video;

// Re-export common types
pub use analysis::{AnalysisFailure, AnalysisId, AnalysisStatus, VideoAnalysis};
pub use beat::{prominent_beats, Beat, BeatAnalysis, StrongBeat};
pub use error::{ModelError, ModelResult};
pub use transition::{is_well_spaced, Transition, TransitionType};
pub use video::{normalize_fps, VideoStats, DEFAULT_FPS};
