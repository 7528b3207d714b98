//! Worker-count budgeting against the open file descriptor limit.
//!
//! An ingestion worker reading a JPEG or PNG holds one descriptor, and only
//! while `fs::read` runs. A HEIC worker holds the converter's stderr pipe
//! while the converter runs and then one descriptor to read its output; the
//! temporary output file is kept by path, not by handle. Spawning the
//! converter briefly needs two or three more descriptors for the child's
//! pipe ends. The worker count is kept at or below 80% of the process limit,
//! so those short spikes come out of the remaining 20%, along with the
//! runtime, the results file, logging and the terminal.

use crate::error::ConfigError;
use tracing::{debug, warn};

/// Descriptor limit assumed when the platform offers no way to query it
pub const FALLBACK_DESCRIPTOR_CEILING: u64 = 1024;

/// Share of the descriptor ceiling available to workers, as a fraction
const BUDGET_NUMERATOR: u64 = 4;
const BUDGET_DENOMINATOR: u64 = 5;

/// Descriptors available to workers: `floor(ceiling * 0.8)`
pub fn descriptor_budget(ceiling: u64) -> u64 {
    // Integer form of the 80% rule, exact for every u64 input
    ceiling / BUDGET_DENOMINATOR * BUDGET_NUMERATOR
        + (ceiling % BUDGET_DENOMINATOR) * BUDGET_NUMERATOR / BUDGET_DENOMINATOR
}

/// Clamp a requested worker count to the descriptor budget.
pub fn worker_cap(requested: usize, ceiling: u64) -> Result<usize, ConfigError> {
    if requested == 0 {
        return Err(ConfigError::ZeroWorkers);
    }

    let budget = descriptor_budget(ceiling);
    if budget == 0 {
        return Err(ConfigError::DescriptorCeilingTooLow { ceiling });
    }

    let cap = (requested as u64).min(budget) as usize;
    if cap < requested {
        debug!(requested, cap, ceiling, "worker count clamped to descriptor budget");
    }
    Ok(cap)
}

/// Host parallelism, used when no worker count is configured
pub fn default_parallelism() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Find the open-file ceiling for this process.
///
/// The soft limit is first raised as far as the hard limit allows; the
/// resulting soft limit is the ceiling.
#[cfg(unix)]
pub fn probe_descriptor_ceiling() -> u64 {
    match rlimit::increase_nofile_limit(u64::MAX) {
        Ok(limit) => {
            debug!(limit, "open file limit raised");
            limit
        }
        Err(e) => {
            warn!(error = %e, "could not raise open file limit");
            match rlimit::Resource::NOFILE.get() {
                Ok((soft, _hard)) => soft,
                Err(e) => {
                    warn!(error = %e, "could not read open file limit");
                    FALLBACK_DESCRIPTOR_CEILING
                }
            }
        }
    }
}

#[cfg(not(unix))]
pub fn probe_descriptor_ceiling() -> u64 {
    FALLBACK_DESCRIPTOR_CEILING
}
