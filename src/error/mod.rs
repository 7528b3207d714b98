//! # Error Module
//!
//! User-friendly error types for the duplicate pair finder.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Fatal vs. skippable** - configuration, walk and persistence errors stop
//!   the run; per-file ingestion and review-cache errors are collected and reported
//! - **Recovery hints** - suggest how to fix when possible

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum DupePairsError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Ingestion error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Comparison error: {0}")]
    Compare(#[from] CompareError),

    #[error("Results file error: {0}")]
    Store(#[from] StoreError),

    #[error("Review error: {0}")]
    Review(#[from] ReviewError),

    #[error("Failed to initialise logging: {0}")]
    Tracing(String),
}

/// Invalid settings, detected before any work begins
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Minimum confidence must be between 1 and 5, got {value}")]
    InvalidMinConfidence { value: u8 },

    #[error(
        "Confidence thresholds must be five strictly increasing positive values, got {values:?}"
    )]
    InvalidThresholds { values: Vec<f64> },

    #[error("Directory not found: {path}")]
    MissingDirectory { path: PathBuf },

    #[error(
        "Directory name is not valid UTF-8 and cannot be stored in the results file: {path}"
    )]
    NonUtf8Directory { path: PathBuf },

    #[error("Worker count must be at least 1")]
    ZeroWorkers,

    #[error(
        "Open file limit {ceiling} leaves no room for scan workers. \
         Raise it with `ulimit -n` and try again."
    )]
    DescriptorCeilingTooLow { ceiling: u64 },

    #[error("Cannot open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while walking a directory tree
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Skipped {path}: the file name is not valid UTF-8 and cannot be stored \
         in the results file. Rename it to include it."
    )]
    NonUtf8Path { path: PathBuf },
}

impl ScanError {
    /// The path the error refers to
    pub fn path(&self) -> &Path {
        match self {
            ScanError::DirectoryNotFound { path }
            | ScanError::PermissionDenied { path }
            | ScanError::ReadDirectory { path, .. }
            | ScanError::NonUtf8Path { path } => path,
        }
    }
}

/// Errors that occur while decoding or fingerprinting a single image
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to decode image {path}: {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Image is empty or corrupted: {path}")]
    EmptyImage { path: PathBuf },

    #[error("Fingerprint computation failed: {0}")]
    ComputationFailed(String),

    #[error("Failed to open image file {path} after {attempts} attempt(s): {source}")]
    IoError {
        path: PathBuf,
        attempts: u32,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that stop the ingestion pool as a whole
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Failed to start scan worker: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("A scan worker panicked")]
    WorkerPanicked,

    #[error("Scan was cancelled")]
    Cancelled,
}

/// Errors that occur during pair matching
#[derive(Error, Debug)]
pub enum CompareError {
    #[error("Pair store lock was poisoned by a panicking comparison")]
    Poisoned,

    #[error("Comparison was cancelled")]
    Cancelled,
}

/// Errors reading or writing the results file
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to read results file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Failed to write results file {path}: {source}. \
         Your review progress has NOT been saved."
    )]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Results file {path} is not valid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize results: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Results file {path} is inconsistent: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Errors raised by the review cache and session
#[derive(Error, Debug)]
pub enum ReviewError {
    #[error("There are no image pairs to review")]
    Empty,

    #[error("Start index {index} is out of range for {len} images")]
    IndexOutOfRange { index: usize, len: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, DupePairsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_error_includes_path() {
        let error = ScanError::DirectoryNotFound {
            path: PathBuf::from("/photos/vacation"),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/vacation"));
    }

    #[test]
    fn hash_error_includes_path() {
        let error = HashError::DecodeError {
            path: PathBuf::from("/photos/broken.jpg"),
            reason: "invalid JPEG".to_string(),
        };
        let message = error.to_string();
        assert!(message.contains("/photos/broken.jpg"));
        assert!(message.contains("invalid JPEG"));
    }

    #[test]
    fn descriptor_error_suggests_recovery() {
        let error = ConfigError::DescriptorCeilingTooLow { ceiling: 1 };
        assert!(error.to_string().contains("ulimit -n"));
    }

    #[test]
    fn write_error_warns_progress_lost() {
        let error = StoreError::Write {
            path: PathBuf::from("/tmp/results.json"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        let message = error.to_string();
        assert!(message.contains("/tmp/results.json"));
        assert!(message.contains("NOT been saved"));
    }

    #[test]
    fn phase_errors_convert_to_top_level() {
        let error: DupePairsError = CompareError::Cancelled.into();
        assert!(matches!(error, DupePairsError::Compare(CompareError::Cancelled)));
    }
}
