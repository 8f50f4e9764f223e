//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use tstudio_media::{DetectionConfig, TieBreak};

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Maximum concurrent analyses
    pub max_concurrent_jobs: usize,
    /// Wall-clock limit for one analysis
    pub job_timeout: Duration,
    /// Directory where analysis records are written
    pub output_dir: PathBuf,
    /// Target sampling rate in frames per second
    pub sample_rate_hz: f64,
    /// Seed for the classifier tie-break
    pub classifier_seed: Option<u64>,
    /// Use the highest-score tie-break instead of the random one
    pub deterministic: bool,
    /// Frame rate assumed for image-sequence inputs
    pub frames_fps: f64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 2,
            job_timeout: Duration::from_secs(1800), // 30 minutes
            output_dir: PathBuf::from("./analyses"),
            sample_rate_hz: 10.0,
            classifier_seed: None,
            deterministic: false,
            frames_fps: 30.0,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_concurrent_jobs: std::env::var("TSTUDIO_MAX_JOBS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_concurrent_jobs),
            job_timeout: Duration::from_secs(
                std::env::var("TSTUDIO_JOB_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.job_timeout.as_secs()),
            ),
            output_dir: std::env::var("TSTUDIO_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
            sample_rate_hz: std::env::var("TSTUDIO_SAMPLE_RATE_HZ")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.sample_rate_hz),
            classifier_seed: std::env::var("TSTUDIO_CLASSIFIER_SEED")
                .ok()
                .and_then(|s| s.parse().ok()),
            deterministic: std::env::var("TSTUDIO_DETERMINISTIC")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.deterministic),
            frames_fps: std::env::var("TSTUDIO_FRAMES_FPS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.frames_fps),
        }
    }

    /// Detection settings derived from this config.
    pub fn detection_config(&self) -> DetectionConfig {
        let mut config = DetectionConfig::default().with_sample_rate(self.sample_rate_hz);
        if let Some(seed) = self.classifier_seed {
            config = config.with_seed(seed);
        }
        if self.deterministic {
            config = config.with_tie_break(TieBreak::HighestScore);
        }
        config
    }
}
