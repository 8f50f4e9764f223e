//! Transition analysis worker.
//!
//! This crate provides:
//! - Environment-driven worker configuration
//! - Analysis executor with bounded concurrency and job timeouts
//! - JSON file persistence for analysis records
//! - Structured per-job logging

pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod store;

pub use config::WorkerConfig;
pub use error::{WorkerError, WorkerResult};
pub use executor::{AnalysisExecutor, AnalysisJob, InputKind};
pub use logging::JobLogger;
pub use store::{AnalysisStore, JsonFileStore};
