use std::io::{BufReader, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use std::thread::JoinHandle;

use image::RgbImage;
use tracing::{debug, warn};
use tstudio_models::VideoStats;

use super::{DecodedFrame, FrameSource};
use crate::error::{MediaError, MediaResult};
use crate::probe::VideoInfo;

/// Frame source that decodes a video with an `ffmpeg` child process.
///
/// FFmpeg emits constant-rate `rgb24` rawvideo at the container frame rate,
/// so frame `i` is presented at `i / fps`.
pub struct FfmpegFrameSource {
    child: Child,
    stdout: BufReader<ChildStdout>,
    width: u32,
    height: u32,
    stats: VideoStats,
    index: u64,
    finished: bool,
    stderr: Option<JoinHandle<String>>,
}

impl FfmpegFrameSource {
    /// Spawn FFmpeg for `path` using probed stream information.
    pub fn open(path: impl AsRef<Path>, info: &VideoInfo) -> MediaResult<Self> {
        let ffmpeg = which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;
        Self::open_with_binary(ffmpeg, path, info)
    }

    /// Like [`open`](Self::open), with an explicit FFmpeg executable.
    pub fn open_with_binary(
        ffmpeg: impl AsRef<Path>,
        path: impl AsRef<Path>,
        info: &VideoInfo,
    ) -> MediaResult<Self> {
        let path = path.as_ref();
        let source_name = path.display().to_string();

        if !path.exists() {
            return Err(MediaError::source_open(source_name, "file not found"));
        }
        if info.width == 0 || info.height == 0 {
            return Err(MediaError::source_open(
                source_name,
                format!("invalid frame size {}x{}", info.width, info.height),
            ));
        }

        let stats = info.stats.normalized();
        let mut cmd = Command::new(ffmpeg.as_ref());
        cmd.args(["-hide_banner", "-loglevel", "error", "-i"])
            .arg(path)
            .args([
                "-map",
                "0:v:0",
                "-fps_mode",
                "cfr",
                "-r",
                &format!("{}", stats.fps),
                "-pix_fmt",
                "rgb24",
                "-f",
                "rawvideo",
                "-",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!(path = %source_name, fps = stats.fps, "Spawning FFmpeg frame decoder");

        let mut child = cmd
            .spawn()
            .map_err(|e| MediaError::source_open(&source_name, format!("failed to spawn FFmpeg: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| MediaError::source_open(&source_name, "failed to capture FFmpeg stdout"))?;

        // Drained on its own thread so a chatty decoder cannot block on a full pipe
        let stderr = child.stderr.take().map(|mut pipe| {
            std::thread::spawn(move || {
                let mut text = String::new();
                let _ = pipe.read_to_string(&mut text);
                text
            })
        });

        Ok(Self {
            child,
            stdout: BufReader::new(stdout),
            width: info.width,
            height: info.height,
            stats,
            index: 0,
            finished: false,
            stderr,
        })
    }

    fn frame_bytes(&self) -> usize {
        self.width as usize * self.height as usize * 3
    }

    /// Fill `buf` from the pipe, returning how many bytes were read before EOF.
    fn read_frame_bytes(&mut self, buf: &mut [u8]) -> MediaResult<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.stdout.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        Ok(filled)
    }

    /// Reap the decoder. A non-zero exit means the stream ended early.
    fn finish(&mut self) -> MediaResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        let status = self.child.wait()?;
        let stderr = self
            .stderr
            .take()
            .and_then(|handle| handle.join().ok())
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        if status.success() {
            debug!(frames = self.index, "FFmpeg decoder finished");
            return Ok(());
        }

        warn!(
            exit_code = ?status.code(),
            frames = self.index,
            "FFmpeg decoder exited with non-zero status"
        );
        Err(MediaError::ffmpeg_failed(
            format!("decoder exited with {} after {} frames", status, self.index),
            stderr,
            status.code(),
        ))
    }
}

impl FrameSource for FfmpegFrameSource {
    fn stats(&self) -> VideoStats {
        self.stats
    }

    fn next_frame(&mut self) -> MediaResult<Option<DecodedFrame>> {
        if self.finished {
            return Ok(None);
        }

        let mut buf = vec![0u8; self.frame_bytes()];
        let filled = self.read_frame_bytes(&mut buf)?;
        if filled == 0 {
            self.finish()?;
            return Ok(None);
        }

        let index = self.index;
        let timestamp = index as f64 / self.stats.fps;
        self.index += 1;

        let image = if filled < buf.len() {
            // Truncated tail frame; nothing follows it
            self.finish()?;
            Err(MediaError::decode(
                index,
                format!("truncated frame ({} of {} bytes)", filled, buf.len()),
            ))
        } else {
            RgbImage::from_raw(self.width, self.height, buf)
                .ok_or_else(|| MediaError::decode(index, "raster size mismatch"))
        };

        Ok(Some(DecodedFrame {
            index,
            timestamp,
            image,
        }))
    }
}

impl Drop for FfmpegFrameSource {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(width: u32, height: u32) -> VideoInfo {
        VideoInfo {
            width,
            height,
            codec: "h264".to_string(),
            stats: VideoStats::from_frame_count(10.0, 30),
        }
    }

    #[test]
    fn test_missing_file_fails_to_open() {
        let err = FfmpegFrameSource::open_with_binary("ffmpeg", "/no/such/video.mp4", &info(64, 64))
            .err()
            .unwrap();
        assert_eq!(err.kind(), "source_open");
    }

    #[test]
    fn test_zero_sized_stream_fails_to_open() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = FfmpegFrameSource::open_with_binary("ffmpeg", file.path(), &info(0, 0))
            .err()
            .unwrap();
        assert_eq!(err.kind(), "source_open");
    }

    #[cfg(unix)]
    mod decoding {
        use std::path::{Path, PathBuf};

        use image::Rgb;

        use super::*;
        use crate::transitions::{detect_transitions, DetectionConfig};

        /// Write a fake `ffmpeg` that prints `raw` to stdout and exits with `code`.
        fn fake_ffmpeg(dir: &Path, raw: &[u8], code: i32) -> PathBuf {
            use std::os::unix::fs::PermissionsExt;

            let data = dir.join("frames.rgb");
            std::fs::write(&data, raw).unwrap();
            let script = dir.join("ffmpeg");
            std::fs::write(
                &script,
                format!(
                    "#!/bin/sh\ncat '{}'\necho 'Error while decoding stream #0:0' >&2\nexit {}\n",
                    data.display(),
                    code
                ),
            )
            .unwrap();
            std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();
            script
        }

        fn raw_frames(colors: &[[u8; 3]], width: u32, height: u32) -> Vec<u8> {
            colors
                .iter()
                .flat_map(|c| c.repeat((width * height) as usize))
                .collect()
        }

        fn open(dir: &Path, raw: &[u8], code: i32, width: u32, height: u32) -> FfmpegFrameSource {
            let ffmpeg = fake_ffmpeg(dir, raw, code);
            let video = dir.join("clip.mp4");
            std::fs::write(&video, b"").unwrap();
            FfmpegFrameSource::open_with_binary(ffmpeg, video, &info(width, height)).unwrap()
        }

        #[test]
        fn test_reads_frames_at_index_over_fps() {
            let dir = tempfile::tempdir().unwrap();
            let raw = raw_frames(&[[255, 0, 0], [0, 255, 0], [0, 0, 255]], 2, 2);
            let mut source = open(dir.path(), &raw, 0, 2, 2);

            let mut frames = Vec::new();
            while let Some(frame) = source.next_frame().unwrap() {
                frames.push(frame);
            }

            assert_eq!(frames.len(), 3);
            let stamps: Vec<f64> = frames.iter().map(|f| f.timestamp).collect();
            assert_eq!(stamps, vec![0.0, 0.1, 0.2]);
            let last = frames.pop().unwrap();
            assert_eq!(last.index, 2);
            assert_eq!(last.image.unwrap().get_pixel(1, 1), &Rgb([0, 0, 255]));
            assert!(source.next_frame().unwrap().is_none());
        }

        #[test]
        fn test_truncated_tail_is_a_decode_skip() {
            let dir = tempfile::tempdir().unwrap();
            let mut raw = raw_frames(&[[10, 10, 10], [20, 20, 20]], 2, 2);
            raw.extend_from_slice(&[1, 2, 3, 4, 5]);
            let mut source = open(dir.path(), &raw, 0, 2, 2);

            assert!(source.next_frame().unwrap().unwrap().image.is_ok());
            assert!(source.next_frame().unwrap().unwrap().image.is_ok());
            let tail = source.next_frame().unwrap().unwrap();
            assert_eq!(tail.index, 2);
            let err = tail.image.unwrap_err();
            assert_eq!(err.kind(), "decode_skip");
            assert!(!err.is_fatal());
            assert!(source.next_frame().unwrap().is_none());
        }

        #[test]
        fn test_decoder_failure_at_end_of_stream_is_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let raw = raw_frames(&[[10, 10, 10], [20, 20, 20]], 2, 2);
            let mut source = open(dir.path(), &raw, 1, 2, 2);

            assert!(source.next_frame().unwrap().is_some());
            assert!(source.next_frame().unwrap().is_some());
            let err = source.next_frame().unwrap_err();
            assert_eq!(err.kind(), "ffmpeg_failed");
            assert!(err.is_fatal());
            match err {
                MediaError::FfmpegFailed {
                    stderr, exit_code, ..
                } => {
                    assert_eq!(exit_code, Some(1));
                    assert!(stderr.unwrap().contains("Error while decoding"));
                }
                other => panic!("unexpected error: {}", other),
            }
        }

        #[test]
        fn test_decoder_failure_after_truncated_tail_is_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let mut raw = raw_frames(&[[10, 10, 10]], 2, 2);
            raw.extend_from_slice(&[7, 7, 7]);
            let mut source = open(dir.path(), &raw, 1, 2, 2);

            assert!(source.next_frame().unwrap().unwrap().image.is_ok());
            let err = source.next_frame().unwrap_err();
            assert_eq!(err.kind(), "ffmpeg_failed");
        }

        #[test]
        fn test_crashed_decoder_aborts_detection() {
            let dir = tempfile::tempdir().unwrap();
            let mut colors = vec![[255, 0, 0]; 6];
            colors.extend(vec![[0, 130, 0]; 6]);
            let raw = raw_frames(&colors, 4, 4);
            let mut source = open(dir.path(), &raw, 1, 4, 4);

            let err = detect_transitions(&mut source, &DetectionConfig::seeded(1)).unwrap_err();
            assert_eq!(err.kind(), "ffmpeg_failed");
        }

        #[test]
        fn test_clean_exit_detects_cut() {
            let dir = tempfile::tempdir().unwrap();
            let mut colors = vec![[255, 0, 0]; 6];
            colors.extend(vec![[0, 130, 0]; 6]);
            let raw = raw_frames(&colors, 4, 4);
            let mut source = open(dir.path(), &raw, 0, 4, 4);

            let report = detect_transitions(&mut source, &DetectionConfig::seeded(1)).unwrap();
            assert_eq!(report.stats.frames_read, 12);
            assert_eq!(report.transitions.len(), 1);
            assert!((report.transitions[0].timestamp - 0.6).abs() < 1e-9);
        }
    }
}
