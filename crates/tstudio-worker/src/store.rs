//! Persistence for analysis records.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;
use tstudio_models::{AnalysisId, VideoAnalysis};

use crate::error::{WorkerError, WorkerResult};

/// Where finished and in-flight analysis records are kept.
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Insert or replace a record.
    async fn save(&self, record: &VideoAnalysis) -> WorkerResult<()>;

    /// Fetch a record by id.
    async fn load(&self, id: &AnalysisId) -> WorkerResult<Option<VideoAnalysis>>;
}

/// Stores each record as `<id>.json` in a directory.
///
/// Writes go to a temporary file that is renamed into place, so a reader
/// never sees a half-written record.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Open a store, creating the directory if needed.
    pub async fn open(dir: impl Into<PathBuf>) -> WorkerResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record file for `id`.
    pub fn record_path(&self, id: &AnalysisId) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}

#[async_trait]
impl AnalysisStore for JsonFileStore {
    async fn save(&self, record: &VideoAnalysis) -> WorkerResult<()> {
        let id = record.id.as_str();
        if id.is_empty() || id.contains(|c: char| c == '/' || c == '\\') {
            return Err(WorkerError::store(format!("invalid record id {:?}", id)));
        }
        let path = self.record_path(&record.id);
        let tmp = path.with_extension("json.tmp");
        let body = serde_json::to_vec_pretty(record)?;

        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &path).await?;

        debug!(
            analysis_id = %record.id,
            status = %record.status,
            path = %path.display(),
            "Saved analysis record"
        );
        Ok(())
    }

    async fn load(&self, id: &AnalysisId) -> WorkerResult<Option<VideoAnalysis>> {
        let path = self.record_path(id);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
