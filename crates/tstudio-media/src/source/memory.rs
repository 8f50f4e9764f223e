use std::collections::VecDeque;

use image::RgbImage;
use tstudio_models::{normalize_fps, VideoStats};

use super::{DecodedFrame, FrameSource};
use crate::error::{MediaError, MediaResult};

/// Frame source over rasters that are already in memory.
pub struct MemoryFrameSource {
    fps: f64,
    frames: VecDeque<DecodedFrame>,
    total_frames: u64,
}

impl MemoryFrameSource {
    /// Frames at a constant rate; frame `i` is stamped `i / fps`.
    pub fn new(fps: f64, images: Vec<RgbImage>) -> Self {
        let fps = normalize_fps(fps);
        let frames: VecDeque<DecodedFrame> = images
            .into_iter()
            .enumerate()
            .map(|(i, img)| DecodedFrame::new(i as u64, i as f64 / fps, img))
            .collect();
        let total_frames = frames.len() as u64;
        Self {
            fps,
            frames,
            total_frames,
        }
    }

    /// Frames with explicit decoded timestamps.
    pub fn with_timestamps(fps: f64, frames: Vec<(f64, RgbImage)>) -> Self {
        let frames: VecDeque<DecodedFrame> = frames
            .into_iter()
            .enumerate()
            .map(|(i, (ts, img))| DecodedFrame::new(i as u64, ts, img))
            .collect();
        let total_frames = frames.len() as u64;
        Self {
            fps: normalize_fps(fps),
            frames,
            total_frames,
        }
    }

    /// Append a frame that fails to decode.
    pub fn push_undecodable(&mut self, timestamp: f64, message: impl Into<String>) {
        let index = self.total_frames;
        self.frames.push_back(DecodedFrame {
            index,
            timestamp,
            image: Err(MediaError::decode(index, message)),
        });
        self.total_frames += 1;
    }

    /// Append a decodable frame.
    pub fn push(&mut self, timestamp: f64, image: RgbImage) {
        let index = self.total_frames;
        self.frames
            .push_back(DecodedFrame::new(index, timestamp, image));
        self.total_frames += 1;
    }
}

impl FrameSource for MemoryFrameSource {
    fn stats(&self) -> VideoStats {
        VideoStats::from_frame_count(self.fps, self.total_frames)
    }

    fn next_frame(&mut self) -> MediaResult<Option<DecodedFrame>> {
        Ok(self.frames.pop_front())
    }
}
