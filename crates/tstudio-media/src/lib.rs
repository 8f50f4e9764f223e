#![deny(unreachable_patterns)]
//! Scene transition detection for decoded video.
//!
//! This crate provides:
//! - Frame sources over FFmpeg, image sequences and in-memory rasters
//! - FFprobe stream probing
//! - Fixed-cadence sampling, per-frame features and pairwise diffs
//! - Adaptive thresholds and a rule-based transition classifier

pub mod error;
pub mod probe;
pub mod source;
pub mod transitions;

pub use error::{MediaError, MediaResult};
pub use probe::{probe_video, VideoInfo};
pub use source::{
    DecodedFrame, FfmpegFrameSource, FrameSource, ImageSequenceSource, MemoryFrameSource,
};
pub use transitions::{
    detect_transitions, detect_transitions_with_rng, DetectionConfig, TieBreak, TransitionReport,
};
