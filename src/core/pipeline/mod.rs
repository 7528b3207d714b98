//! # Pipeline Module
//!
//! Orchestrates a full detection run.
//!
//! ## Pipeline Stages
//! 1. **Walk** - List image files under the reference and evaluation trees
//! 2. **Ingest** - Decode and fingerprint both lists on a bounded worker pool
//! 3. **Match** - Score every reference against every evaluation image
//! 4. **Save** - Write the result set, cursor at 0
//!
//! ## Context
//! Settings, the worker cap and the cancellation token travel together in
//! a [`PipelineContext`] passed to each stage; nothing is process-global.

mod config;
mod context;
mod executor;

pub use config::{DetectConfig, DetectConfigBuilder, DEFAULT_MIN_CONFIDENCE, DEFAULT_RESULTS_FILE};
pub use context::{CancellationToken, PipelineContext};
pub use executor::{DetectionPipeline, DetectionReport};
