//! Rule-based transition classifier.
//!
//! Each [`DiffRecord`] is reduced to a weighted detection score. When the
//! score or one of the raw diffs crosses its trigger, the first matching
//! rule labels the transition:
//!
//! 1. large brightness swing: fade
//! 2. large histogram or color jump: cut
//! 3. moderate brightness and color change together: dissolve
//! 4. edge structure or red channel shift: wipe or pan
//! 5. anything else: zoom, pan or dissolve
//!
//! Rules 4 and 5 have several plausible labels. Under [`TieBreak::Random`]
//! the label (and for rule 5 the base confidence) is drawn from the caller's
//! RNG; under [`TieBreak::HighestScore`] the strongest sub-score decides.

use rand::Rng;
use tracing::debug;
use tstudio_models::{Transition, TransitionType};

use super::config::{ClassifierConfig, TieBreak};
use super::diff::DiffRecord;
use super::threshold::ThresholdSet;

/// Normalized per-signal scores of one diff.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalScores {
    pub brightness: f64,
    pub color: f64,
    pub edge: f64,
    pub hist: f64,
}

/// Labels diffs against the thresholds of one video.
#[derive(Debug, Clone)]
pub struct TransitionClassifier {
    config: ClassifierConfig,
    thresholds: ThresholdSet,
}

impl TransitionClassifier {
    pub fn new(config: ClassifierConfig, thresholds: ThresholdSet) -> Self {
        Self { config, thresholds }
    }

    pub fn thresholds(&self) -> &ThresholdSet {
        &self.thresholds
    }

    pub fn scores(&self, diff: &DiffRecord) -> SignalScores {
        let c = &self.config;
        SignalScores {
            brightness: diff.brightness_diff / c.brightness_scale,
            color: diff.color_diff / c.color_scale,
            edge: diff.edge_diff / c.edge_scale,
            hist: diff.hist_diff / c.hist_scale,
        }
    }

    /// Weighted composite of the normalized scores.
    pub fn detection_score(&self, diff: &DiffRecord) -> f64 {
        let c = &self.config;
        let s = self.scores(diff);
        c.brightness_weight * s.brightness
            + c.color_weight * s.color
            + c.edge_weight * s.edge
            + c.hist_weight * s.hist
    }

    /// Whether this diff is a transition candidate at all.
    pub fn fires(&self, diff: &DiffRecord) -> bool {
        self.detection_score(diff) > self.config.detection_score_trigger
            || diff.brightness_diff > self.thresholds.brightness_threshold
            || diff.color_diff > self.thresholds.color_threshold
            || diff.hist_diff > self.config.hist_trigger
    }

    /// Classify a diff, returning `None` when nothing fires.
    pub fn classify<R: Rng>(&self, diff: &DiffRecord, rng: &mut R) -> Option<Transition> {
        if !self.fires(diff) {
            return None;
        }

        let c = &self.config;
        let bt = self.thresholds.brightness_threshold;
        let ct = self.thresholds.color_threshold;
        let score = self.detection_score(diff);

        let (kind, base) = if diff.brightness_diff > bt * c.fade_factor {
            (TransitionType::Fade, c.fade_confidence)
        } else if diff.hist_diff > c.cut_hist || diff.color_diff > ct * c.cut_color_factor {
            (TransitionType::Cut, c.cut_confidence)
        } else if diff.brightness_diff > bt * c.dissolve_factor
            && diff.color_diff > ct * c.dissolve_factor
        {
            (TransitionType::Dissolve, c.dissolve_confidence)
        } else if diff.edge_diff > c.motion_edge || diff.red_diff > ct * c.motion_red_factor {
            (self.motion_kind(diff, rng), c.motion_confidence)
        } else {
            self.fallback(diff, rng)
        };

        let confidence = c.max_confidence.min(base + score * c.score_gain);

        debug!(
            timestamp = diff.timestamp,
            kind = %kind,
            confidence,
            detection_score = score,
            "Transition candidate"
        );

        Some(Transition::new(diff.timestamp, kind, confidence, score))
    }

    fn motion_kind<R: Rng>(&self, diff: &DiffRecord, rng: &mut R) -> TransitionType {
        const CHOICES: [TransitionType; 2] = [TransitionType::Wipe, TransitionType::Pan];
        match self.config.tie_break {
            TieBreak::Random => CHOICES[rng.random_range(0..CHOICES.len())],
            TieBreak::HighestScore => {
                let edge = diff.edge_diff / self.config.edge_scale;
                let red = diff.red_diff / self.config.brightness_scale;
                if edge >= red {
                    TransitionType::Wipe
                } else {
                    TransitionType::Pan
                }
            }
        }
    }

    fn fallback<R: Rng>(&self, diff: &DiffRecord, rng: &mut R) -> (TransitionType, f64) {
        const CHOICES: [TransitionType; 3] =
            [TransitionType::Zoom, TransitionType::Pan, TransitionType::Dissolve];
        let c = &self.config;
        match c.tie_break {
            TieBreak::Random => {
                let kind = CHOICES[rng.random_range(0..CHOICES.len())];
                let base = if c.fallback_confidence_min < c.fallback_confidence_max {
                    rng.random_range(c.fallback_confidence_min..=c.fallback_confidence_max)
                } else {
                    c.fallback_confidence_min
                };
                (kind, base)
            }
            TieBreak::HighestScore => {
                let s = self.scores(diff);
                let kind = if s.edge >= s.color && s.edge >= s.brightness {
                    TransitionType::Zoom
                } else if s.color >= s.brightness {
                    TransitionType::Pan
                } else {
                    TransitionType::Dissolve
                };
                (kind, (c.fallback_confidence_min + c.fallback_confidence_max) / 2.0)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transitions::config::ThresholdConfig;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn classifier(tie_break: TieBreak) -> TransitionClassifier {
        let config = ClassifierConfig {
            tie_break,
            ..Default::default()
        };
        TransitionClassifier::new(config, ThresholdSet::from_stddev(0.0, &ThresholdConfig::default()))
    }

    fn diff(brightness: f64, color: f64, edge: f64, hist: f64, red: f64) -> DiffRecord {
        DiffRecord {
            timestamp: 1.0,
            brightness_diff: brightness,
            color_diff: color,
            edge_diff: edge,
            hist_diff: hist,
            red_diff: red,
        }
    }

    #[test]
    fn test_quiet_diff_does_not_fire() {
        let c = classifier(TieBreak::Random);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(c.classify(&DiffRecord::default(), &mut rng).is_none());
        assert!(c.classify(&diff(1.0, 2.0, 0.5, 0.1, 1.0), &mut rng).is_none());
    }

    #[test]
    fn test_detection_score_weights() {
        let c = classifier(TieBreak::Random);
        let score = c.detection_score(&diff(255.0, 765.0, 100.0, 10.0, 0.0));
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_fade_above_three_and_a_half_thresholds() {
        let c = classifier(TieBreak::Random);
        let mut rng = StdRng::seed_from_u64(1);
        let t = c.classify(&diff(8.0 * 3.5 + 1.0, 0.0, 0.0, 0.0, 0.0), &mut rng).unwrap();

        assert_eq!(t.kind, TransitionType::Fade);
        assert!(t.confidence >= 0.88);
    }

    #[test]
    fn test_histogram_jump_is_cut() {
        let c = classifier(TieBreak::Random);
        let mut rng = StdRng::seed_from_u64(1);
        let t = c.classify(&diff(0.0, 0.0, 0.0, 9.0, 0.0), &mut rng).unwrap();

        assert_eq!(t.kind, TransitionType::Cut);
        assert!((t.detection_score - 0.135).abs() < 1e-12);
        // 0.94 + 0.054 is over the cap
        assert_eq!(t.confidence, 0.98);
    }

    #[test]
    fn test_fade_wins_over_cut() {
        let c = classifier(TieBreak::Random);
        let mut rng = StdRng::seed_from_u64(1);
        let t = c.classify(&diff(100.0, 300.0, 0.0, 9.0, 100.0), &mut rng).unwrap();
        assert_eq!(t.kind, TransitionType::Fade);
    }

    #[test]
    fn test_dissolve() {
        let c = classifier(TieBreak::Random);
        let mut rng = StdRng::seed_from_u64(1);
        // Above 1.5x both thresholds, below fade and cut
        let t = c.classify(&diff(13.0, 40.0, 0.0, 0.5, 0.0), &mut rng).unwrap();
        assert_eq!(t.kind, TransitionType::Dissolve);
    }

    #[test]
    fn test_motion_rule_labels() {
        let mut rng = StdRng::seed_from_u64(9);
        let random = classifier(TieBreak::Random);
        for _ in 0..20 {
            let t = random.classify(&diff(0.0, 0.0, 50.0, 0.0, 0.0), &mut rng).unwrap();
            assert!(matches!(t.kind, TransitionType::Wipe | TransitionType::Pan));
            assert!((t.confidence - (0.75 + t.detection_score * 0.4)).abs() < 1e-12);
        }

        let det = classifier(TieBreak::HighestScore);
        let wipe = det.classify(&diff(0.0, 0.0, 50.0, 0.0, 0.0), &mut rng).unwrap();
        assert_eq!(wipe.kind, TransitionType::Wipe);
        let pan = det.classify(&diff(0.0, 26.0, 0.0, 0.0, 26.0), &mut rng).unwrap();
        assert_eq!(pan.kind, TransitionType::Pan);
    }

    #[test]
    fn test_fallback_rule() {
        // Fires on brightness only, matches none of rules 1-4
        let d = diff(9.0, 0.0, 0.0, 0.0, 0.0);
        let mut rng = StdRng::seed_from_u64(3);

        let random = classifier(TieBreak::Random);
        for _ in 0..20 {
            let t = random.classify(&d, &mut rng).unwrap();
            assert!(matches!(
                t.kind,
                TransitionType::Zoom | TransitionType::Pan | TransitionType::Dissolve
            ));
            let base = t.confidence - t.detection_score * 0.4;
            assert!((0.68 - 1e-9..=0.80 + 1e-9).contains(&base));
        }

        let det = classifier(TieBreak::HighestScore);
        let t = det.classify(&d, &mut rng).unwrap();
        assert_eq!(t.kind, TransitionType::Dissolve);
        assert!((t.confidence - (0.74 + t.detection_score * 0.4)).abs() < 1e-12);
    }

    #[test]
    fn test_same_seed_same_labels() {
        let c = classifier(TieBreak::Random);
        let diffs: Vec<_> = (0..10)
            .map(|i| diff(9.0 + i as f64 * 0.1, 0.0, 0.0, 0.0, 0.0))
            .collect();

        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            diffs
                .iter()
                .filter_map(|d| c.classify(d, &mut rng))
                .map(|t| (t.kind, t.confidence))
                .collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_confidence_is_capped() {
        let c = classifier(TieBreak::Random);
        let mut rng = StdRng::seed_from_u64(1);
        let t = c.classify(&diff(255.0, 765.0, 255.0, 6.0, 255.0), &mut rng).unwrap();
        assert_eq!(t.confidence, 0.98);
    }
}
