//! Adaptive thresholds from the brightness distribution of a whole video.

use serde::{Deserialize, Serialize};

use super::config::ThresholdConfig;
use super::features::FrameFeatures;

/// Population mean and standard deviation of per-frame brightness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BrightnessStats {
    pub mean: f64,
    pub stddev: f64,
    pub samples: usize,
}

impl BrightnessStats {
    /// Statistics over `values`, or `None` when there are none.
    pub fn from_values<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let values: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        Some(Self {
            mean,
            stddev: variance.sqrt(),
            samples: values.len(),
        })
    }
}

/// Per-video firing thresholds handed to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSet {
    pub brightness_threshold: f64,
    pub color_threshold: f64,
    pub brightness_stats: BrightnessStats,
}

impl ThresholdSet {
    /// Thresholds for a video, or `None` when no frame was usable.
    pub fn from_features(features: &[FrameFeatures], config: &ThresholdConfig) -> Option<Self> {
        let stats = BrightnessStats::from_values(features.iter().map(|f| f.avg_brightness))?;
        Some(Self::from_stats(stats, config))
    }

    pub fn from_stats(stats: BrightnessStats, config: &ThresholdConfig) -> Self {
        Self {
            brightness_threshold: config
                .brightness_floor
                .max(stats.stddev * config.brightness_stddev_factor),
            color_threshold: config
                .color_floor
                .max(stats.stddev * config.color_stddev_factor),
            brightness_stats: stats,
        }
    }

    /// Thresholds for a known brightness stddev.
    pub fn from_stddev(stddev: f64, config: &ThresholdConfig) -> Self {
        Self::from_stats(
            BrightnessStats {
                mean: 0.0,
                stddev,
                samples: 0,
            },
            config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_floors_apply_at_zero_variance() {
        let stats = BrightnessStats::from_values([120.0, 120.0, 120.0]).unwrap();
        assert_eq!(stats.stddev, 0.0);

        let t = ThresholdSet::from_stats(stats, &ThresholdConfig::default());
        assert_eq!(t.brightness_threshold, 8.0);
        assert_eq!(t.color_threshold, 25.0);
    }

    #[test]
    fn test_population_stddev() {
        let stats = BrightnessStats::from_values([2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.stddev, 2.0);
        assert_eq!(stats.samples, 8);
    }

    #[test]
    fn test_noisy_video_raises_thresholds() {
        let t = ThresholdSet::from_stddev(50.0, &ThresholdConfig::default());
        assert!((t.brightness_threshold - 20.0).abs() < 1e-12);
        assert!((t.color_threshold - 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_input() {
        assert!(BrightnessStats::from_values(Vec::new()).is_none());
        assert!(ThresholdSet::from_features(&[], &ThresholdConfig::default()).is_none());
    }
}
