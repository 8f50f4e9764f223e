//! Configuration for transition detection.
//!
//! The defaults reproduce the production detector. Every constant of the
//! sampler, feature extractor, threshold calculator, classifier and
//! deduplicator lives here so a caller can tune one knob without touching
//! the algorithm.

use serde::{Deserialize, Serialize};

use crate::error::{MediaError, MediaResult};

/// How the classifier picks a label when several types are plausible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Uniform random pick from the plausible types (varied labels)
    #[default]
    Random,
    /// Pick the type whose supporting sub-score is largest (reproducible)
    HighestScore,
}

/// Adaptive threshold parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Lower bound for the brightness threshold
    pub brightness_floor: f64,
    /// Brightness threshold as a multiple of brightness stddev
    pub brightness_stddev_factor: f64,
    /// Lower bound for the summed color threshold
    pub color_floor: f64,
    /// Color threshold as a multiple of brightness stddev
    pub color_stddev_factor: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            brightness_floor: 8.0,
            brightness_stddev_factor: 0.4,
            color_floor: 25.0,
            color_stddev_factor: 1.2,
        }
    }
}

/// Classifier weights, firing conditions and rule constants.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Weights of the normalized brightness, color, edge and histogram scores
    pub brightness_weight: f64,
    pub color_weight: f64,
    pub edge_weight: f64,
    pub hist_weight: f64,

    /// Divisors that bring each raw diff to roughly [0, 1]
    pub brightness_scale: f64,
    pub color_scale: f64,
    pub edge_scale: f64,
    pub hist_scale: f64,

    /// Composite score above which a transition fires
    pub detection_score_trigger: f64,
    /// Histogram distance above which a transition fires
    pub hist_trigger: f64,

    /// Fade: brightness diff above `brightness_threshold * fade_factor`
    pub fade_factor: f64,
    /// Cut: histogram distance above this
    pub cut_hist: f64,
    /// Cut: color diff above `color_threshold * cut_color_factor`
    pub cut_color_factor: f64,
    /// Dissolve: both brightness and color above their threshold times this
    pub dissolve_factor: f64,
    /// Wipe/pan: edge diff above this
    pub motion_edge: f64,
    /// Wipe/pan: red channel shift above `color_threshold * motion_red_factor`
    pub motion_red_factor: f64,

    pub fade_confidence: f64,
    pub cut_confidence: f64,
    pub dissolve_confidence: f64,
    pub motion_confidence: f64,
    /// Range for the fallback rule's base confidence
    pub fallback_confidence_min: f64,
    pub fallback_confidence_max: f64,

    /// Confidence gained per unit of detection score
    pub score_gain: f64,
    pub max_confidence: f64,

    pub tie_break: TieBreak,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            brightness_weight: 0.35,
            color_weight: 0.35,
            edge_weight: 0.15,
            hist_weight: 0.15,
            brightness_scale: 255.0,
            color_scale: 255.0 * 3.0,
            edge_scale: 100.0,
            hist_scale: 10.0,
            detection_score_trigger: 0.06,
            hist_trigger: 3.0,
            fade_factor: 3.5,
            cut_hist: 8.0,
            cut_color_factor: 4.0,
            dissolve_factor: 1.5,
            motion_edge: 4.0,
            motion_red_factor: 0.8,
            fade_confidence: 0.88,
            cut_confidence: 0.94,
            dissolve_confidence: 0.80,
            motion_confidence: 0.75,
            fallback_confidence_min: 0.68,
            fallback_confidence_max: 0.80,
            score_gain: 0.4,
            max_confidence: 0.98,
            tie_break: TieBreak::Random,
        }
    }
}

/// Configuration for a transition detection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Target sampling rate in frames per second
    pub sample_rate_hz: f64,

    /// Canny hysteresis thresholds for the edge map
    pub canny_low: f32,
    pub canny_high: f32,

    pub thresholds: ThresholdConfig,
    pub classifier: ClassifierConfig,

    /// Transitions closer than this (seconds) to an accepted one are dropped
    pub min_gap_secs: f64,

    /// Seed for the classifier's random tie-break. `None` draws from the OS.
    pub seed: Option<u64>,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 10.0,
            canny_low: 50.0,
            canny_high: 150.0,
            thresholds: ThresholdConfig::default(),
            classifier: ClassifierConfig::default(),
            min_gap_secs: 0.25,
            seed: None,
        }
    }
}

impl DetectionConfig {
    /// Reproducible configuration: fixed seed for the random tie-break.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Default::default()
        }
    }

    /// Builder-style setter for the sampling rate.
    pub fn with_sample_rate(mut self, hz: f64) -> Self {
        self.sample_rate_hz = hz;
        self
    }

    /// Builder-style setter for the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder-style setter for the tie-break strategy.
    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.classifier.tie_break = tie_break;
        self
    }

    /// Builder-style setter for the deduplication gap.
    pub fn with_min_gap(mut self, secs: f64) -> Self {
        self.min_gap_secs = secs;
        self
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> MediaResult<()> {
        if !(self.sample_rate_hz.is_finite() && self.sample_rate_hz > 0.0) {
            return Err(MediaError::invalid_config(format!(
                "sample_rate_hz must be positive, got {}",
                self.sample_rate_hz
            )));
        }
        if !(self.min_gap_secs.is_finite() && self.min_gap_secs >= 0.0) {
            return Err(MediaError::invalid_config(format!(
                "min_gap_secs must be non-negative, got {}",
                self.min_gap_secs
            )));
        }
        if self.canny_low > self.canny_high {
            return Err(MediaError::invalid_config(
                "canny_low must not exceed canny_high",
            ));
        }
        let c = &self.classifier;
        if c.fallback_confidence_min > c.fallback_confidence_max {
            return Err(MediaError::invalid_config(
                "fallback confidence range is empty",
            ));
        }
        if [c.brightness_scale, c.color_scale, c.edge_scale, c.hist_scale]
            .iter()
            .any(|s| *s <= 0.0)
        {
            return Err(MediaError::invalid_config("score scales must be positive"));
        }
        Ok(())
    }
}
