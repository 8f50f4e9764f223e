//! Fixed-cadence frame sampling.

use tstudio_models::normalize_fps;

use crate::error::MediaResult;
use crate::source::{DecodedFrame, FrameSource};

/// Picks every `frame_skip`-th source frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameSampler {
    frame_skip: u64,
}

impl FrameSampler {
    /// `frame_skip = max(1, floor(fps / target_rate))`, with a missing fps
    /// treated as 30.
    pub fn new(source_fps: f64, target_rate_hz: f64) -> Self {
        let fps = normalize_fps(source_fps);
        let ratio = fps / target_rate_hz;
        let frame_skip = if ratio.is_finite() && ratio >= 1.0 {
            ratio.floor() as u64
        } else {
            1
        };
        Self { frame_skip }
    }

    pub fn frame_skip(&self) -> u64 {
        self.frame_skip
    }

    /// Whether the frame at this zero-based source position is sampled.
    pub fn is_sampled(&self, position: u64) -> bool {
        position % self.frame_skip == 0
    }

    /// Iterate the sampled frames of `source` in presentation order.
    pub fn sample<'a, S: FrameSource + ?Sized>(&self, source: &'a mut S) -> SampledFrames<'a, S> {
        SampledFrames {
            sampler: *self,
            source,
            position: 0,
            done: false,
        }
    }
}

/// Iterator over sampled frames. A fatal read error ends the iteration.
pub struct SampledFrames<'a, S: FrameSource + ?Sized> {
    sampler: FrameSampler,
    source: &'a mut S,
    position: u64,
    done: bool,
}

impl<'a, S: FrameSource + ?Sized> SampledFrames<'a, S> {
    /// Source frames consumed so far, sampled or not.
    pub fn frames_read(&self) -> u64 {
        self.position
    }

    fn advance(&mut self) -> MediaResult<Option<DecodedFrame>> {
        loop {
            if self.sampler.is_sampled(self.position) {
                let frame = self.source.next_frame()?;
                if frame.is_some() {
                    self.position += 1;
                }
                return Ok(frame);
            }
            if !self.source.skip_frame()? {
                return Ok(None);
            }
            self.position += 1;
        }
    }
}

impl<'a, S: FrameSource + ?Sized> Iterator for SampledFrames<'a, S> {
    type Item = MediaResult<DecodedFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(frame)) => Some(Ok(frame)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
