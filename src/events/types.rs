//! Event type definitions for progress reporting.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the detection pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Directory walking events
    Scan(ScanEvent),
    /// Decode-and-fingerprint events
    Ingest(IngestEvent),
    /// Pair matching events
    Compare(CompareEvent),
    /// Pipeline-level events
    Pipeline(PipelineEvent),
}

/// Events during the directory walk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ScanEvent {
    /// Walking has started
    Started { root: PathBuf },
    /// Progress update during walking
    Progress(ScanProgress),
    /// An image was found
    PhotoFound { path: PathBuf },
    /// An error occurred but walking continues
    Error { path: PathBuf, message: String },
    /// Walking completed
    Completed { total_photos: usize },
}

/// Progress information during walking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanProgress {
    /// Number of directories entered so far
    pub directories_scanned: usize,
    /// Number of images found so far
    pub photos_found: usize,
    /// Current directory being walked
    pub current_path: PathBuf,
}

/// Events during ingestion (decode + fingerprint)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum IngestEvent {
    /// Ingestion has started
    Started { total_photos: usize, workers: usize },
    /// One file finished, successfully or not. This is the completion tick.
    Progress(IngestProgress),
    /// A file could not be ingested and was skipped
    Error { path: PathBuf, message: String },
    /// Ingestion completed
    Completed { ingested: usize, failed: usize },
}

/// Progress information during ingestion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestProgress {
    /// Number of files finished so far
    pub completed: usize,
    /// Total number of files to ingest
    pub total: usize,
    /// File that just finished
    pub current_path: PathBuf,
}

/// Events during pair matching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CompareEvent {
    /// Matching has started
    Started {
        reference_photos: usize,
        evaluation_photos: usize,
    },
    /// A reference image has been compared against the whole evaluation set
    Progress(CompareProgress),
    /// Matching completed
    Completed { total_pairs: usize },
}

/// Progress information during matching
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareProgress {
    /// Reference images fully compared
    pub references_completed: usize,
    /// Total reference images
    pub total_references: usize,
}

/// Pipeline-level events
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PipelineEvent {
    /// Pipeline has started
    Started,
    /// Moving to a new phase
    PhaseChanged { phase: PipelinePhase },
    /// Pipeline completed successfully
    Completed { summary: PipelineSummary },
    /// Pipeline was cancelled
    Cancelled,
    /// Pipeline encountered a fatal error
    Error { message: String },
}

/// Phases of the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PipelinePhase {
    ScanningReference,
    ScanningEvaluation,
    IngestingReference,
    IngestingEvaluation,
    Comparing,
    Saving,
}

/// Summary of pipeline results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineSummary {
    /// Reference images fingerprinted
    pub reference_photos: usize,
    /// Evaluation images fingerprinted
    pub evaluation_photos: usize,
    /// Candidate pairs retained
    pub pairs_found: usize,
    /// Files that could not be read or decoded
    pub skipped_files: usize,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

impl std::fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelinePhase::ScanningReference => write!(f, "Scanning reference"),
            PipelinePhase::ScanningEvaluation => write!(f, "Scanning evaluation"),
            PipelinePhase::IngestingReference => write!(f, "Reading reference"),
            PipelinePhase::IngestingEvaluation => write!(f, "Reading evaluation"),
            PipelinePhase::Comparing => write!(f, "Comparing"),
            PipelinePhase::Saving => write!(f, "Saving"),
        }
    }
}
