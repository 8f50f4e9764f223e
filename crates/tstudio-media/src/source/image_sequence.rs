use std::path::{Path, PathBuf};

use tracing::debug;
use tstudio_models::{normalize_fps, VideoStats};

use super::{DecodedFrame, FrameSource};
use crate::error::{MediaError, MediaResult};

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "webp"];

/// Frame source over a directory of still images, one image per frame.
///
/// Files are ordered by name, so zero-padded names (`frame_00001.png`)
/// give presentation order.
pub struct ImageSequenceSource {
    files: Vec<PathBuf>,
    fps: f64,
    position: usize,
}

impl ImageSequenceSource {
    /// Open a directory of frames played back at `fps`.
    pub fn open(dir: impl AsRef<Path>, fps: f64) -> MediaResult<Self> {
        let dir = dir.as_ref();
        let entries = std::fs::read_dir(dir)
            .map_err(|e| MediaError::source_open(dir.display().to_string(), e.to_string()))?;

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && has_image_extension(path))
            .collect();
        files.sort();

        debug!(
            dir = %dir.display(),
            frames = files.len(),
            "Opened image sequence"
        );

        Ok(Self {
            files,
            fps: normalize_fps(fps),
            position: 0,
        })
    }

    fn timestamp_of(&self, index: usize) -> f64 {
        index as f64 / self.fps
    }
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

impl FrameSource for ImageSequenceSource {
    fn stats(&self) -> VideoStats {
        VideoStats::from_frame_count(self.fps, self.files.len() as u64)
    }

    fn next_frame(&mut self) -> MediaResult<Option<DecodedFrame>> {
        let Some(path) = self.files.get(self.position) else {
            return Ok(None);
        };
        let index = self.position as u64;
        let image = image::open(path)
            .map(|img| img.to_rgb8())
            .map_err(|e| MediaError::decode(index, format!("{}: {}", path.display(), e)));
        let frame = DecodedFrame {
            index,
            timestamp: self.timestamp_of(self.position),
            image,
        };
        self.position += 1;
        Ok(Some(frame))
    }

    fn skip_frame(&mut self) -> MediaResult<bool> {
        if self.position < self.files.len() {
            self.position += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
