//! # Ingest Module
//!
//! Turns a list of image paths into fingerprinted records.
//!
//! ## Concurrency
//! A fixed pool of worker threads drains a shared, closed work queue. The
//! pool never has more workers than [`PipelineContext::worker_cap`], and each
//! worker holds at most one file open, so open descriptors stay within the
//! budget computed in [`limits`].
//!
//! ## Failures
//! A file that cannot be read or decoded is logged, reported as an
//! [`IngestEvent::Error`](crate::events::IngestEvent::Error) and skipped.
//! The run carries on with the remaining files.
//!
//! [`PipelineContext::worker_cap`]: crate::core::pipeline::PipelineContext::worker_cap

pub mod limits;
mod pool;

pub use pool::IngestPool;

use crate::core::hasher::Icon;
use crate::error::HashError;
use std::path::PathBuf;

/// A decoded and fingerprinted image
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub path: PathBuf,
    pub icon: Icon,
}

/// A file that was skipped, with the reason
#[derive(Debug)]
pub struct IngestFailure {
    pub path: PathBuf,
    pub error: HashError,
}

/// Output of one ingestion run
#[derive(Debug, Default)]
pub struct IngestResult {
    /// One record per successfully ingested file, sorted by path
    pub records: Vec<ImageRecord>,
    /// Files that could not be ingested
    pub failures: Vec<IngestFailure>,
}

impl IngestResult {
    /// Files processed, successful or not
    pub fn processed(&self) -> usize {
        self.records.len() + self.failures.len()
    }
}
