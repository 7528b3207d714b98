//! # Core Module
//!
//! The UI-agnostic near-duplicate detection engine.
//!
//! ## Modules
//! - `scanner` - Lists image files under a directory tree
//! - `hasher` - Decodes images and computes icon fingerprints
//! - `ingest` - Bounded worker pool that fingerprints image lists
//! - `progress` - Terminal progress bar fed by pipeline events
//! - `matcher` - Scores reference/evaluation pairs by confidence
//! - `results` - The persisted pair list and review cursor
//! - `review` - Resumable review with a sliding image cache
//! - `actions` - Moves or deletes confirmed duplicates
//! - `pipeline` - Orchestrates a full detection run

pub mod actions;
pub mod hasher;
pub mod ingest;
pub mod matcher;
pub mod pipeline;
pub mod progress;
pub mod results;
pub mod review;
pub mod scanner;

// Re-export commonly used types
pub use matcher::ConfidenceThresholds;
pub use pipeline::{DetectConfig, DetectConfigBuilder, DetectionPipeline, PipelineContext};
pub use results::{Pair, ResultSet};
pub use review::{ReviewPair, ReviewSession};
