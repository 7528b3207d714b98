//! Run-wide state shared by every pipeline phase.

use super::config::DetectConfig;
use crate::core::ingest::limits::{default_parallelism, probe_descriptor_ceiling, worker_cap};
use crate::error::ConfigError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// Cooperative cancellation flag.
///
/// Clones share the same flag. Workers check it between files and between
/// comparisons, so a cancelled run stops within one unit of work.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this token to stop
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Resolved settings plus the cancellation handle for one detection run.
///
/// Built once from a validated [`DetectConfig`] and passed by reference to
/// the ingestion pool and matcher; nothing in here changes during a run.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    config: DetectConfig,
    descriptor_ceiling: u64,
    worker_cap: usize,
    cancel: CancellationToken,
}

impl PipelineContext {
    /// Resolve the descriptor ceiling and worker cap for `config`.
    ///
    /// The ceiling comes from the config when set, otherwise from the
    /// process limit (raised to its hard maximum where the OS allows).
    pub fn new(config: DetectConfig) -> Result<Self, ConfigError> {
        let descriptor_ceiling = config
            .fd_ceiling
            .unwrap_or_else(probe_descriptor_ceiling);
        let requested = config.worker_cap.unwrap_or_else(default_parallelism);
        let worker_cap = worker_cap(requested, descriptor_ceiling)?;

        info!(
            descriptor_ceiling,
            requested, worker_cap, "resolved ingestion worker cap"
        );

        Ok(Self {
            config,
            descriptor_ceiling,
            worker_cap,
            cancel: CancellationToken::new(),
        })
    }

    /// Share an externally owned cancellation token (e.g. a Ctrl-C handler's)
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn config(&self) -> &DetectConfig {
        &self.config
    }

    pub fn descriptor_ceiling(&self) -> u64 {
        self.descriptor_ceiling
    }

    /// Upper bound on concurrently open image files
    pub fn worker_cap(&self) -> usize {
        self.worker_cap
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
