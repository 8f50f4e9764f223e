//! Model validation errors.

use thiserror::Error;

use crate::analysis::AnalysisStatus;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Analysis {id} is already {status}")]
    AlreadyFinished { id: String, status: AnalysisStatus },
}

impl ModelError {
    pub fn invalid_record(msg: impl Into<String>) -> Self {
        Self::InvalidRecord(msg.into())
    }
}
