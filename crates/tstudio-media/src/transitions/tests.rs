//! End-to-end tests for transition detection over synthetic frames.

#[cfg(test)]
mod pipeline_tests {
    use image::{Rgb, RgbImage};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use tstudio_models::{is_well_spaced, TransitionType, VideoStats};

    use crate::error::{MediaError, MediaResult};
    use crate::source::{DecodedFrame, FrameSource, MemoryFrameSource};
    use crate::transitions::{detect_transitions, DetectionConfig, TieBreak};

    const RED: Rgb<u8> = Rgb([255, 0, 0]);
    // Same Rec.601 luma as RED, so only color and histograms change
    const GREEN: Rgb<u8> = Rgb([0, 130, 0]);

    fn solid(color: Rgb<u8>) -> RgbImage {
        RgbImage::from_pixel(16, 16, color)
    }

    fn noisy_frames(count: usize, seed: u64) -> Vec<RgbImage> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                let base: [u8; 3] = [rng.random(), rng.random(), rng.random()];
                RgbImage::from_fn(16, 16, |x, y| {
                    if (x + y) % 5 == 0 {
                        Rgb([255 - base[0], base[1], 255 - base[2]])
                    } else {
                        Rgb(base)
                    }
                })
            })
            .collect()
    }

    #[test]
    fn test_static_video_has_no_transitions() {
        let mut source = MemoryFrameSource::new(30.0, vec![solid(Rgb([90, 90, 90])); 90]);
        let report = detect_transitions(&mut source, &DetectionConfig::seeded(1)).unwrap();

        assert!(report.transitions.is_empty());
        let thresholds = report.thresholds.unwrap();
        assert_eq!(thresholds.brightness_threshold, 8.0);
        assert_eq!(thresholds.color_threshold, 25.0);
        assert_eq!(report.stats.frames_read, 90);
        assert_eq!(report.stats.frames_sampled, 30);
        assert_eq!(report.duration_seconds, 3.0);
    }

    #[test]
    fn test_color_cut_is_detected_at_decoded_time() {
        let mut frames = vec![solid(RED); 30];
        frames.extend(vec![solid(GREEN); 30]);
        let mut source = MemoryFrameSource::new(30.0, frames);

        let report = detect_transitions(&mut source, &DetectionConfig::seeded(1)).unwrap();

        assert_eq!(report.transitions.len(), 1);
        let cut = &report.transitions[0];
        assert_eq!(cut.kind, TransitionType::Cut);
        assert_eq!(cut.timestamp, 1.0);
        assert!(cut.confidence >= 0.94 && cut.confidence <= 0.98);
    }

    #[test]
    fn test_black_to_white_is_fade() {
        let mut frames = vec![solid(Rgb([0, 0, 0])); 30];
        frames.extend(vec![solid(Rgb([255, 255, 255])); 30]);
        let mut source = MemoryFrameSource::new(30.0, frames);

        let report = detect_transitions(&mut source, &DetectionConfig::seeded(1)).unwrap();

        assert_eq!(report.transitions.len(), 1);
        assert_eq!(report.transitions[0].kind, TransitionType::Fade);
    }

    #[test]
    fn test_flicker_is_deduplicated() {
        // Color flips on every sampled frame
        let frames: Vec<_> = (0..90)
            .map(|i| if (i / 3) % 2 == 0 { solid(RED) } else { solid(GREEN) })
            .collect();
        let mut source = MemoryFrameSource::new(30.0, frames);

        let report = detect_transitions(&mut source, &DetectionConfig::seeded(1)).unwrap();

        assert!(report.stats.candidates as usize > report.transitions.len());
        assert!(is_well_spaced(&report.transitions, 0.25));
        assert_eq!(report.transitions[0].timestamp, 0.1);
    }

    #[test]
    fn test_invariants_hold_on_noise() {
        for seed in 0..5 {
            let mut source = MemoryFrameSource::new(30.0, noisy_frames(150, seed));
            let report = detect_transitions(&mut source, &DetectionConfig::seeded(seed)).unwrap();

            assert!(is_well_spaced(&report.transitions, 0.25));
            for t in &report.transitions {
                assert!((0.0..=0.98).contains(&t.confidence));
                assert!(t.detection_score >= 0.0);
            }
        }
    }

    #[test]
    fn test_same_seed_is_reproducible() {
        let run = |seed| {
            let mut source = MemoryFrameSource::new(30.0, noisy_frames(120, 11));
            detect_transitions(&mut source, &DetectionConfig::seeded(seed))
                .unwrap()
                .transitions
        };
        assert_eq!(run(5), run(5));
    }

    #[test]
    fn test_highest_score_ignores_seed() {
        let run = |seed| {
            let mut source = MemoryFrameSource::new(30.0, noisy_frames(120, 11));
            let config = DetectionConfig::seeded(seed).with_tie_break(TieBreak::HighestScore);
            detect_transitions(&mut source, &config).unwrap().transitions
        };
        assert_eq!(run(1), run(2));
    }

    #[test]
    fn test_undecodable_frame_is_skipped() {
        let mut source = MemoryFrameSource::new(30.0, vec![solid(RED); 3]);
        source.push_undecodable(0.1, "corrupt packet");
        for i in 4..9 {
            source.push(i as f64 / 30.0, solid(RED));
        }

        let report = detect_transitions(&mut source, &DetectionConfig::seeded(1)).unwrap();

        assert_eq!(report.stats.decode_skips, 1);
        assert_eq!(report.stats.frames_sampled, 2);
        assert!(report.transitions.is_empty());
    }

    #[test]
    fn test_empty_source() {
        let mut source = MemoryFrameSource::new(30.0, Vec::new());
        let report = detect_transitions(&mut source, &DetectionConfig::default()).unwrap();

        assert!(report.transitions.is_empty());
        assert!(report.thresholds.is_none());
        assert_eq!(report.duration_seconds, 0.0);
    }

    #[test]
    fn test_single_frame_yields_no_pairs() {
        let mut source = MemoryFrameSource::new(30.0, vec![solid(RED)]);
        let report = detect_transitions(&mut source, &DetectionConfig::default()).unwrap();

        assert!(report.transitions.is_empty());
        assert!(report.thresholds.is_some());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let mut source = MemoryFrameSource::new(30.0, vec![solid(RED); 4]);
        let config = DetectionConfig::default().with_sample_rate(0.0);
        let err = detect_transitions(&mut source, &config).unwrap_err();
        assert_eq!(err.kind(), "invalid_config");
    }

    struct BrokenSource {
        served: u64,
    }

    impl FrameSource for BrokenSource {
        fn stats(&self) -> VideoStats {
            VideoStats::from_frame_count(30.0, 100)
        }

        fn next_frame(&mut self) -> MediaResult<Option<DecodedFrame>> {
            if self.served == 6 {
                return Err(MediaError::Io(std::io::Error::other("pipe closed")));
            }
            let index = self.served;
            self.served += 1;
            Ok(Some(DecodedFrame::new(index, index as f64 / 30.0, solid(RED))))
        }
    }

    #[test]
    fn test_fatal_read_error_aborts_run() {
        let mut source = BrokenSource { served: 0 };
        let err = detect_transitions(&mut source, &DetectionConfig::seeded(1)).unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(err.kind(), "io");
    }

    #[test]
    fn test_boxed_source() {
        let mut source: Box<dyn FrameSource> =
            Box::new(MemoryFrameSource::new(30.0, vec![solid(RED); 30]));
        let report = detect_transitions(&mut source, &DetectionConfig::seeded(1)).unwrap();
        assert_eq!(report.stats.frames_sampled, 10);
    }
}
