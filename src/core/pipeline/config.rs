//! Detection run configuration.

use crate::core::hasher::RetryPolicy;
use crate::core::matcher::ConfidenceThresholds;
use crate::core::scanner::{ScanConfig, WalkErrorPolicy};
use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Results file written next to the working directory by default
pub const DEFAULT_RESULTS_FILE: &str = "dupe_pairs_results.json";

/// Pairs below this confidence are dropped unless configured otherwise
pub const DEFAULT_MIN_CONFIDENCE: u8 = 4;

/// Everything a detection run needs to know up front
#[derive(Debug, Clone)]
pub struct DetectConfig {
    /// Tree holding the originals
    pub reference_dir: PathBuf,
    /// Tree searched for near-duplicates of the originals
    pub evaluation_dir: PathBuf,
    /// Lowest confidence (1-5) kept in the results
    pub min_confidence: u8,
    /// Distance cut-offs for each confidence level
    pub thresholds: ConfidenceThresholds,
    /// Requested ingestion workers (None = host parallelism)
    pub worker_cap: Option<usize>,
    /// Open-file ceiling to budget against (None = probe the process limit)
    pub fd_ceiling: Option<u64>,
    /// Directory walk settings, shared by both trees
    pub scan: ScanConfig,
    /// File-open retry settings for the decoder
    pub retry: RetryPolicy,
    /// Where the results file is written
    pub output: PathBuf,
}

impl DetectConfig {
    /// Check the invariants every run relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=5).contains(&self.min_confidence) {
            return Err(ConfigError::InvalidMinConfidence {
                value: self.min_confidence,
            });
        }
        if self.worker_cap == Some(0) {
            return Err(ConfigError::ZeroWorkers);
        }
        for dir in [&self.reference_dir, &self.evaluation_dir] {
            if !dir.is_dir() {
                return Err(ConfigError::MissingDirectory { path: dir.clone() });
            }
            if dir.to_str().is_none() {
                return Err(ConfigError::NonUtf8Directory { path: dir.clone() });
            }
        }
        Ok(())
    }
}

/// Builder for [`DetectConfig`]
#[derive(Debug, Clone)]
pub struct DetectConfigBuilder {
    config: DetectConfig,
}

impl DetectConfigBuilder {
    pub fn new(reference_dir: impl AsRef<Path>, evaluation_dir: impl AsRef<Path>) -> Self {
        Self {
            config: DetectConfig {
                reference_dir: reference_dir.as_ref().to_path_buf(),
                evaluation_dir: evaluation_dir.as_ref().to_path_buf(),
                min_confidence: DEFAULT_MIN_CONFIDENCE,
                thresholds: ConfidenceThresholds::default(),
                worker_cap: None,
                fd_ceiling: None,
                scan: ScanConfig::default(),
                retry: RetryPolicy::default(),
                output: PathBuf::from(DEFAULT_RESULTS_FILE),
            },
        }
    }

    pub fn min_confidence(mut self, value: u8) -> Self {
        self.config.min_confidence = value;
        self
    }

    pub fn thresholds(mut self, thresholds: ConfidenceThresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    /// Request a worker count; it is still clamped to the descriptor budget
    pub fn worker_cap(mut self, workers: usize) -> Self {
        self.config.worker_cap = Some(workers);
        self
    }

    pub fn fd_ceiling(mut self, ceiling: u64) -> Self {
        self.config.fd_ceiling = Some(ceiling);
        self
    }

    pub fn walk_errors(mut self, policy: WalkErrorPolicy) -> Self {
        self.config.scan.on_error = policy;
        self
    }

    pub fn include_hidden(mut self, include: bool) -> Self {
        self.config.scan.include_hidden = include;
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.config.scan.follow_symlinks = follow;
        self
    }

    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config.retry = retry;
        self
    }

    pub fn output(mut self, path: impl AsRef<Path>) -> Self {
        self.config.output = path.as_ref().to_path_buf();
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<DetectConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_are_applied() {
        let dir = TempDir::new().unwrap();
        let config = DetectConfigBuilder::new(dir.path(), dir.path())
            .build()
            .unwrap();

        assert_eq!(config.min_confidence, 4);
        assert_eq!(config.output, PathBuf::from("dupe_pairs_results.json"));
        assert_eq!(config.scan.on_error, WalkErrorPolicy::Abort);
        assert!(config.scan.include_hidden);
        assert!(config.worker_cap.is_none());
    }

    #[test]
    fn min_confidence_out_of_range_is_rejected() {
        let dir = TempDir::new().unwrap();
        for value in [0u8, 6, 255] {
            let result = DetectConfigBuilder::new(dir.path(), dir.path())
                .min_confidence(value)
                .build();
            assert!(matches!(
                result,
                Err(ConfigError::InvalidMinConfidence { .. })
            ));
        }
    }

    #[test]
    fn missing_directory_is_rejected() {
        let dir = TempDir::new().unwrap();
        let result = DetectConfigBuilder::new(dir.path(), dir.path().join("nope")).build();
        assert!(matches!(result, Err(ConfigError::MissingDirectory { .. })));
    }

    #[test]
    fn zero_workers_is_rejected() {
        let dir = TempDir::new().unwrap();
        let result = DetectConfigBuilder::new(dir.path(), dir.path())
            .worker_cap(0)
            .build();
        assert!(matches!(result, Err(ConfigError::ZeroWorkers)));
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_directory_is_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = TempDir::new().unwrap();
        let bad = dir.path().join(OsStr::from_bytes(b"r\xe9f"));
        std::fs::create_dir(&bad).unwrap();

        let result = DetectConfigBuilder::new(&bad, dir.path()).build();
        assert!(matches!(result, Err(ConfigError::NonUtf8Directory { .. })));
    }

    #[test]
    fn builder_sets_walk_options() {
        let dir = TempDir::new().unwrap();
        let config = DetectConfigBuilder::new(dir.path(), dir.path())
            .walk_errors(WalkErrorPolicy::Skip)
            .include_hidden(false)
            .follow_symlinks(true)
            .output(dir.path().join("out.json"))
            .build()
            .unwrap();

        assert_eq!(config.scan.on_error, WalkErrorPolicy::Skip);
        assert!(!config.scan.include_hidden);
        assert!(config.scan.follow_symlinks);
        assert!(config.output.ends_with("out.json"));
    }
}
