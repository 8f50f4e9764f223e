//! Pairwise feature distances.

use super::features::FrameFeatures;

/// Distances between two consecutive sampled frames.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DiffRecord {
    /// Timestamp of the later frame of the pair
    pub timestamp: f64,
    pub brightness_diff: f64,
    /// Sum of the absolute per-channel mean differences
    pub color_diff: f64,
    pub edge_diff: f64,
    /// Chi-squared histogram distance summed over the three channels
    pub hist_diff: f64,
    /// Absolute red channel mean difference, used by the motion rule
    pub red_diff: f64,
}

impl DiffRecord {
    /// Distances from `prev` to `curr`, stamped at `curr`.
    pub fn between(prev: &FrameFeatures, curr: &FrameFeatures) -> Self {
        let red_diff = (curr.avg_r - prev.avg_r).abs();
        let color_diff =
            red_diff + (curr.avg_g - prev.avg_g).abs() + (curr.avg_b - prev.avg_b).abs();

        let hist_diff = prev
            .color_histogram
            .channels()
            .into_iter()
            .zip(curr.color_histogram.channels())
            .map(|(a, b)| chi_squared(a, b))
            .sum();

        Self {
            timestamp: curr.timestamp,
            brightness_diff: (curr.avg_brightness - prev.avg_brightness).abs(),
            color_diff,
            edge_diff: (curr.edge_strength - prev.edge_strength).abs(),
            hist_diff,
            red_diff,
        }
    }
}

/// Chi-squared distance `Σ (a - b)² / (a + b)`, skipping bins empty in both.
///
/// For two L1-normalized histograms the result lies in [0, 2].
pub fn chi_squared(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b)
        .filter(|(x, y)| *x + *y > 0.0)
        .map(|(x, y)| {
            let d = x - y;
            d * d / (x + y)
        })
        .sum()
}

/// Diff every adjacent pair of a feature sequence.
pub fn diff_pairs(features: &[FrameFeatures]) -> Vec<DiffRecord> {
    features
        .windows(2)
        .map(|pair| DiffRecord::between(&pair[0], &pair[1]))
        .collect()
}
