//! End-to-end transition detection over one frame source.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tracing::{debug, info, warn};
use tstudio_models::Transition;

use super::classifier::TransitionClassifier;
use super::config::DetectionConfig;
use super::dedup::deduplicate;
use super::diff::diff_pairs;
use super::features::{FeatureExtractor, FrameFeatures};
use super::sampler::FrameSampler;
use super::threshold::ThresholdSet;
use crate::error::{MediaError, MediaResult};
use crate::source::FrameSource;

/// Counters for one detection run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Source frames consumed, sampled or not
    pub frames_read: u64,
    /// Sampled frames with usable features
    pub frames_sampled: u64,
    /// Sampled frames skipped because they could not be decoded
    pub decode_skips: u64,
    /// Candidates before deduplication
    pub candidates: u64,
    pub frame_skip: u64,
}

/// Output of [`detect_transitions`].
#[derive(Debug, Clone, Serialize)]
pub struct TransitionReport {
    pub duration_seconds: f64,
    /// Deduplicated transitions in increasing timestamp order
    pub transitions: Vec<Transition>,
    /// `None` when no sampled frame was usable
    pub thresholds: Option<ThresholdSet>,
    pub stats: RunStats,
}

/// Detect transitions, seeding the classifier RNG from the config (or the OS
/// when no seed is set).
pub fn detect_transitions<S>(source: &mut S, config: &DetectionConfig) -> MediaResult<TransitionReport>
where
    S: FrameSource + ?Sized,
{
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    detect_transitions_with_rng(source, config, &mut rng)
}

/// Detect transitions with an explicit random source for the tie-break.
///
/// All features are gathered before anything is classified, since the
/// thresholds depend on the brightness distribution of the whole video.
/// Any fatal error aborts the run without partial output.
pub fn detect_transitions_with_rng<S, R>(
    source: &mut S,
    config: &DetectionConfig,
    rng: &mut R,
) -> MediaResult<TransitionReport>
where
    S: FrameSource + ?Sized,
    R: Rng,
{
    config.validate()?;

    let video = source.stats().normalized();
    let sampler = FrameSampler::new(video.fps, config.sample_rate_hz);
    let extractor = FeatureExtractor::new(config.canny_low, config.canny_high);
    let mut stats = RunStats {
        frame_skip: sampler.frame_skip(),
        ..Default::default()
    };

    debug!(
        fps = video.fps,
        total_frames = video.total_frames,
        frame_skip = stats.frame_skip,
        "Starting transition detection"
    );

    let features = {
        let mut frames = sampler.sample(source);
        let mut features: Vec<FrameFeatures> = Vec::new();
        for frame in frames.by_ref() {
            let frame = frame?;
            let extracted = frame
                .image
                .and_then(|img| extractor.extract(frame.index, frame.timestamp, &img));
            match extracted {
                Ok(f) => features.push(f),
                Err(e @ MediaError::Decode { .. }) => {
                    stats.decode_skips += 1;
                    warn!(index = frame.index, error = %e, "Skipping undecodable frame");
                }
                Err(e) => return Err(e),
            }
        }
        stats.frames_read = frames.frames_read();
        features
    };
    stats.frames_sampled = features.len() as u64;

    if under_delivered(stats.frames_read, video.total_frames) {
        warn!(
            frames_read = stats.frames_read,
            total_frames = video.total_frames,
            "Source ended well before its reported frame count"
        );
    }

    let duration_seconds = if video.duration_seconds > 0.0 {
        video.duration_seconds
    } else {
        stats.frames_read as f64 / video.fps
    };

    let Some(thresholds) = ThresholdSet::from_features(&features, &config.thresholds) else {
        info!(
            frames_read = stats.frames_read,
            decode_skips = stats.decode_skips,
            "No usable frames, no transitions detected"
        );
        return Ok(TransitionReport {
            duration_seconds,
            transitions: Vec::new(),
            thresholds: None,
            stats,
        });
    };

    let classifier = TransitionClassifier::new(config.classifier.clone(), thresholds);

    let candidates: Vec<Transition> = diff_pairs(&features)
        .iter()
        .filter_map(|diff| classifier.classify(diff, &mut *rng))
        .collect();
    stats.candidates = candidates.len() as u64;

    let transitions = deduplicate(candidates, config.min_gap_secs);

    if stats.decode_skips > 0 {
        warn!(
            decode_skips = stats.decode_skips,
            frames_sampled = stats.frames_sampled,
            "Some sampled frames could not be decoded"
        );
    }

    info!(
        duration_secs = duration_seconds,
        frames_sampled = stats.frames_sampled,
        candidates = stats.candidates,
        transitions = transitions.len(),
        brightness_threshold = thresholds.brightness_threshold,
        color_threshold = thresholds.color_threshold,
        "Transition detection complete"
    );

    Ok(TransitionReport {
        duration_seconds,
        transitions,
        thresholds: Some(thresholds),
        stats,
    })
}

/// Whether a source delivered less than half of the frames its metadata
/// promised. An unknown frame count never counts as short.
fn under_delivered(frames_read: u64, total_frames: u64) -> bool {
    total_frames > 0 && frames_read.saturating_mul(2) < total_frames
}
