//! Scene transition detection.
//!
//! Samples a decoded video at a fixed cadence, reduces each sampled frame to
//! a small feature vector and labels the jumps between consecutive frames.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐    ┌──────────────┐    ┌──────────────┐
//! │ FrameSource  │───►│ FrameSampler │───►│ Features     │
//! │ (decoded RGB)│    │ (every Nth)  │    │ (luma/color/ │
//! └──────────────┘    └──────────────┘    │ edges/hist)  │
//!                                         └──────────────┘
//!                                                │
//!                        ┌───────────────────────┤
//!                        ▼                       ▼
//!                 ┌──────────────┐    ┌──────────────┐
//!                 │ ThresholdSet │───►│ Classifier   │◄── DiffRecord
//!                 │ (whole video)│    │ (5 rules)    │    (pairwise)
//!                 └──────────────┘    └──────────────┘
//!                                                │
//!                                                ▼
//!                                     ┌──────────────┐
//!                                     │ deduplicate  │
//!                                     │ (0.25s gap)  │
//!                                     └──────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use tstudio_media::transitions::{detect_transitions, DetectionConfig};
//! use tstudio_media::source::MemoryFrameSource;
//!
//! let mut source = MemoryFrameSource::new(30.0, frames);
//! let report = detect_transitions(&mut source, &DetectionConfig::seeded(7))?;
//! for t in &report.transitions {
//!     println!("{:.2}s {} ({:.2})", t.timestamp, t.kind, t.confidence);
//! }
//! ```

mod classifier;
mod config;
mod dedup;
mod diff;
mod edges;
mod features;
mod pipeline;
mod sampler;
mod threshold;

#[cfg(test)]
mod tests;

pub use classifier::{SignalScores, TransitionClassifier};
pub use config::{ClassifierConfig, DetectionConfig, ThresholdConfig, TieBreak};
pub use dedup::deduplicate;
pub use diff::{chi_squared, diff_pairs, DiffRecord};
pub use edges::{canny, edge_strength};
pub use features::{luminance, ColorHistogram, FeatureExtractor, FrameFeatures, HISTOGRAM_BINS};
pub use pipeline::{detect_transitions, detect_transitions_with_rng, RunStats, TransitionReport};
pub use sampler::{FrameSampler, SampledFrames};
pub use threshold::{BrightnessStats, ThresholdSet};
