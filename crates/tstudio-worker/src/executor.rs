//! Analysis executor.
//!
//! Runs one transition analysis per input. Each job writes a `processing`
//! record first and then replaces it with either the complete transition
//! list or a failure; nothing in between is ever stored.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, Instrument};
use tstudio_media::{
    detect_transitions, probe_video, FfmpegFrameSource, FrameSource, ImageSequenceSource,
    TransitionReport,
};
use tstudio_models::{AnalysisId, VideoAnalysis};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;
use crate::store::AnalysisStore;

/// How an input path is read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// A video file decoded with FFmpeg
    Video,
    /// A directory of still images in name order
    Frames,
}

/// A single analysis request.
#[derive(Debug, Clone)]
pub struct AnalysisJob {
    pub id: AnalysisId,
    pub input: PathBuf,
    pub kind: InputKind,
}

impl AnalysisJob {
    pub fn video(path: impl Into<PathBuf>) -> Self {
        Self {
            id: AnalysisId::new(),
            input: path.into(),
            kind: InputKind::Video,
        }
    }

    pub fn frames(dir: impl Into<PathBuf>) -> Self {
        Self {
            id: AnalysisId::new(),
            input: dir.into(),
            kind: InputKind::Frames,
        }
    }

    fn display_name(&self) -> String {
        self.input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.input.display().to_string())
    }
}

/// Executes analysis jobs with bounded concurrency.
pub struct AnalysisExecutor<S> {
    config: WorkerConfig,
    store: Arc<S>,
    job_semaphore: Arc<Semaphore>,
}

impl<S: AnalysisStore + 'static> AnalysisExecutor<S> {
    pub fn new(config: WorkerConfig, store: S) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1)));
        Self {
            config,
            store: Arc::new(store),
            job_semaphore,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Run every job and return the final records in input order.
    ///
    /// A job that fails produces a `failed` record; only store errors are
    /// returned as `Err`.
    pub async fn run_all(&self, jobs: Vec<AnalysisJob>) -> WorkerResult<Vec<VideoAnalysis>> {
        info!(
            jobs = jobs.len(),
            max_concurrent = self.config.max_concurrent_jobs,
            "Starting analysis executor"
        );

        let mut tasks = JoinSet::new();
        for (index, job) in jobs.into_iter().enumerate() {
            let permit = Arc::clone(&self.job_semaphore)
                .acquire_owned()
                .await
                .map_err(|e| WorkerError::job_failed(format!("Semaphore closed: {}", e)))?;
            let config = self.config.clone();
            let store = Arc::clone(&self.store);

            tasks.spawn(async move {
                let _permit = permit;
                (index, Self::execute_job(&config, store.as_ref(), job).await)
            });
        }

        let mut results = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            let (index, result) =
                joined.map_err(|e| WorkerError::job_failed(format!("Job task join error: {}", e)))?;
            results.push((index, result?));
        }
        results.sort_by_key(|(index, _)| *index);

        Ok(results.into_iter().map(|(_, record)| record).collect())
    }

    /// Run one job to a terminal record and store it.
    pub async fn execute(&self, job: AnalysisJob) -> WorkerResult<VideoAnalysis> {
        Self::execute_job(&self.config, self.store.as_ref(), job).await
    }

    async fn execute_job(
        config: &WorkerConfig,
        store: &S,
        job: AnalysisJob,
    ) -> WorkerResult<VideoAnalysis> {
        let mut record = VideoAnalysis::new(job.input.display().to_string(), job.display_name());
        record.id = job.id.clone();
        store.save(&record).await?;

        let logger = JobLogger::new(&record.id, "transition_analysis");
        logger.log_start(&record.video_name);

        let result = analyze(config, &job.input, job.kind, &logger)
            .instrument(logger.create_span())
            .await;
        let min_gap = config.detection_config().min_gap_secs;

        match result {
            Ok(report) => {
                let count = report.transitions.len();
                if report.stats.decode_skips > 0 {
                    logger.log_warning(&format!(
                        "{} sampled frames could not be decoded",
                        report.stats.decode_skips
                    ));
                }
                match record.complete(report.duration_seconds, report.transitions, min_gap) {
                    Ok(()) => logger.log_completion(&format!(
                        "{} transitions over {:.2}s",
                        count, report.duration_seconds
                    )),
                    Err(e) => {
                        logger.log_error(&e.to_string());
                        record.fail("invalid_record", e.to_string())?;
                    }
                }
            }
            Err(e) => {
                logger.log_error(&e.to_string());
                record.fail(e.kind(), e.to_string())?;
            }
        }

        store.save(&record).await?;
        Ok(record)
    }
}

/// Probe, decode and detect for one input under the job timeout.
async fn analyze(
    config: &WorkerConfig,
    input: &Path,
    kind: InputKind,
    logger: &JobLogger,
) -> WorkerResult<TransitionReport> {
    let detection = config.detection_config();
    let input = input.to_path_buf();
    let frames_fps = config.frames_fps;
    let logger = logger.clone();

    let work = async move {
        let task = match kind {
            InputKind::Video => {
                let info = probe_video(&input).await?;
                logger.log_progress(&format!(
                    "probed {}x{} {} at {:.3} fps, {} frames",
                    info.width, info.height, info.codec, info.stats.fps, info.stats.total_frames
                ));
                tokio::task::spawn_blocking(move || -> WorkerResult<TransitionReport> {
                    let mut source = FfmpegFrameSource::open(&input, &info)?;
                    Ok(detect_transitions(&mut source, &detection)?)
                })
            }
            InputKind::Frames => tokio::task::spawn_blocking(move || -> WorkerResult<TransitionReport> {
                let mut source = ImageSequenceSource::open(&input, frames_fps)?;
                logger.log_progress(&format!(
                    "opened {} frames at {:.3} fps",
                    source.stats().total_frames,
                    source.stats().fps
                ));
                Ok(detect_transitions(&mut source, &detection)?)
            }),
        };
        task.await
            .map_err(|e| WorkerError::job_failed(format!("Blocking task join error: {}", e)))?
    };

    match tokio::time::timeout(config.job_timeout, work).await {
        Ok(result) => result,
        Err(_) => Err(WorkerError::Timeout {
            secs: config.job_timeout.as_secs(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonFileStore;
    use image::{Rgb, RgbImage};
    use tstudio_models::{AnalysisStatus, TransitionType};

    fn write_frames(dir: &Path, colors: &[[u8; 3]]) {
        for (i, color) in colors.iter().enumerate() {
            RgbImage::from_pixel(16, 16, Rgb(*color))
                .save(dir.join(format!("frame_{:04}.png", i)))
                .unwrap();
        }
    }

    fn config(output_dir: &Path) -> WorkerConfig {
        WorkerConfig {
            output_dir: output_dir.to_path_buf(),
            classifier_seed: Some(7),
            // One sampled frame per image
            frames_fps: 10.0,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_frames_job_completes() {
        let frames = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let mut colors = vec![[255, 0, 0]; 10];
        colors.extend(vec![[0, 130, 0]; 10]);
        write_frames(frames.path(), &colors);

        let store = JsonFileStore::open(out.path()).await.unwrap();
        let executor = AnalysisExecutor::new(config(out.path()), store);
        let record = executor.execute(AnalysisJob::frames(frames.path())).await.unwrap();

        assert_eq!(record.status, AnalysisStatus::Completed);
        assert_eq!(record.transitions.len(), 1);
        assert_eq!(record.transitions[0].kind, TransitionType::Cut);
        assert_eq!(record.transitions[0].timestamp, 1.0);
        assert_eq!(record.duration, 2.0);

        let stored = executor.store().load(&record.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AnalysisStatus::Completed);
        assert_eq!(stored.transitions.len(), 1);
    }

    #[tokio::test]
    async fn test_missing_input_fails_record() {
        let out = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(out.path()).await.unwrap();
        let executor = AnalysisExecutor::new(config(out.path()), store);

        let record = executor
            .execute(AnalysisJob::frames(out.path().join("does-not-exist")))
            .await
            .unwrap();

        assert_eq!(record.status, AnalysisStatus::Failed);
        assert!(record.transitions.is_empty());
        assert_eq!(record.error.as_ref().unwrap().kind, "source_open");

        let stored = executor.store().load(&record.id).await.unwrap().unwrap();
        assert_eq!(stored.status, AnalysisStatus::Failed);
    }

    #[tokio::test]
    async fn test_run_all_keeps_input_order() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        write_frames(a.path(), &[[10, 10, 10]; 5]);
        write_frames(b.path(), &[[200, 200, 200]; 5]);

        let store = JsonFileStore::open(out.path()).await.unwrap();
        let executor = AnalysisExecutor::new(config(out.path()), store);

        let jobs = vec![
            AnalysisJob::frames(a.path()),
            AnalysisJob::frames(out.path().join("missing")),
            AnalysisJob::frames(b.path()),
        ];
        let ids: Vec<_> = jobs.iter().map(|j| j.id.clone()).collect();
        let records = executor.run_all(jobs).await.unwrap();

        assert_eq!(records.len(), 3);
        for (record, id) in records.iter().zip(&ids) {
            assert_eq!(&record.id, id);
        }
        assert_eq!(records[0].status, AnalysisStatus::Completed);
        assert_eq!(records[1].status, AnalysisStatus::Failed);
        assert_eq!(records[2].status, AnalysisStatus::Completed);
    }
}
