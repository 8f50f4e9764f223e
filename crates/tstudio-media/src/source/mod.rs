//! Decoded frame sources.
//!
//! A [`FrameSource`] hands out decoded RGB rasters in presentation order,
//! each tagged with its position in the stream. Opening a source is the
//! only fatal step; a single frame that fails to decode is reported in
//! place (as an `Err` raster) so the caller can skip it and keep going.

mod ffmpeg;
mod image_sequence;
mod memory;

pub use ffmpeg::FfmpegFrameSource;
pub use image_sequence::ImageSequenceSource;
pub use memory::MemoryFrameSource;

use image::RgbImage;
use tstudio_models::VideoStats;

use crate::error::MediaResult;

/// A frame as it came out of the decoder.
#[derive(Debug)]
pub struct DecodedFrame {
    /// Zero-based position in the source stream
    pub index: u64,
    /// Decoded presentation time in seconds
    pub timestamp: f64,
    /// The raster, or the reason it could not be decoded
    pub image: MediaResult<RgbImage>,
}

impl DecodedFrame {
    pub fn new(index: u64, timestamp: f64, image: RgbImage) -> Self {
        Self {
            index,
            timestamp,
            image: Ok(image),
        }
    }
}

/// Sequential access to decoded video frames.
pub trait FrameSource {
    /// Container metadata for the stream.
    fn stats(&self) -> VideoStats;

    /// Decode the next frame. `Ok(None)` marks the end of the stream; `Err`
    /// is a fatal read failure.
    fn next_frame(&mut self) -> MediaResult<Option<DecodedFrame>>;

    /// Advance past the next frame without needing its pixels.
    ///
    /// Returns `false` at the end of the stream. Sources that can skip
    /// cheaply (no decode) should override this.
    fn skip_frame(&mut self) -> MediaResult<bool> {
        Ok(self.next_frame()?.is_some())
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn stats(&self) -> VideoStats {
        (**self).stats()
    }

    fn next_frame(&mut self) -> MediaResult<Option<DecodedFrame>> {
        (**self).next_frame()
    }

    fn skip_frame(&mut self) -> MediaResult<bool> {
        (**self).skip_frame()
    }
}
