//! Bounded retry with exponential backoff for file reads.
//!
//! Opening a file can fail transiently when the process is close to its
//! descriptor limit. Reads are retried a fixed number of times; errors that
//! cannot go away on their own are returned immediately.

use std::io;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// How often, and how patiently, to retry a failing read
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Pause before the second attempt; doubled for each later attempt
    pub initial_backoff: Duration,
}

impl RetryPolicy {
    /// Never retry
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
        }
    }

    fn is_permanent(error: &io::Error) -> bool {
        matches!(
            error.kind(),
            io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied | io::ErrorKind::InvalidInput
        )
    }

    /// Run `op` until it succeeds or the attempts are used up.
    ///
    /// On failure returns the last error and the number of attempts made.
    pub fn run<T, F>(&self, mut op: F) -> Result<T, (io::Error, u32)>
    where
        F: FnMut() -> io::Result<T>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut backoff = self.initial_backoff;
        let mut attempt = 1;

        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= max_attempts || Self::is_permanent(&e) => {
                    return Err((e, attempt));
                }
                Err(e) => {
                    debug!(attempt, error = %e, "read failed, retrying in {:?}", backoff);
                    thread::sleep(backoff);
                    backoff = backoff.saturating_mul(2);
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(25),
        }
    }
}
