//! # Dupe Pairs
//!
//! Finds near-duplicate images between a *reference* folder and an
//! *evaluation* folder and records every candidate pair for human review.
//!
//! ## Core Philosophy
//! - **Never auto-delete** - Pairs are only acted on after a person confirms them
//! - **Resumable** - Review progress is written to disk after every action
//! - **Bounded** - Scans never hold more open files, or decoded review images, than budgeted
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation layers:
//! - `core` - Walking, ingestion, matching, results and review
//! - `events` - Event-driven progress reporting
//! - `error` - User-friendly error types
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{DupePairsError, Result};

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Initialize tracing for the library
///
/// This should be called by the application entry point. When `log_file` is
/// given, output is appended to that file instead of stderr.
pub fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let outcome = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    DupePairsError::Config(error::ConfigError::LogFile {
                        path: path.to_path_buf(),
                        source: e,
                    })
                })?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    outcome.map_err(|e| DupePairsError::Tracing(e.to_string()))
}
