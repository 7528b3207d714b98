//! Directory walking implementation using walkdir.

use super::filter::{is_hidden, ImageFilter};
use super::{ImageScanner, ScanResult};
use crate::error::ScanError;
use crate::events::{Event, EventSender, ScanEvent, ScanProgress};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// What to do when part of the tree cannot be read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WalkErrorPolicy {
    /// Stop the whole walk on the first traversal error
    #[default]
    Abort,
    /// Record the error, skip the unreadable entry or subtree, keep walking
    Skip,
}

/// Configuration for the directory scanner
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Reaction to traversal errors
    pub on_error: WalkErrorPolicy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            follow_symlinks: false,
            include_hidden: true,
            max_depth: None,
            on_error: WalkErrorPolicy::Abort,
        }
    }
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: ImageFilter,
}

impl WalkDirScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        let filter = ImageFilter::new().with_hidden(config.include_hidden);
        Self { config, filter }
    }

    fn record(error: ScanError, errors: &mut Vec<ScanError>, events: &EventSender) {
        events.send(Event::Scan(ScanEvent::Error {
            path: error.path().to_path_buf(),
            message: error.to_string(),
        }));
        errors.push(error);
    }

    fn convert_error(error: walkdir::Error) -> ScanError {
        let path = error.path().map(Path::to_path_buf).unwrap_or_default();

        if error.io_error().map(|e| e.kind()) == Some(std::io::ErrorKind::PermissionDenied) {
            return ScanError::PermissionDenied { path };
        }

        let source = error
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop"));
        ScanError::ReadDirectory { path, source }
    }
}

impl ImageScanner for WalkDirScanner {
    fn scan(&self, root: &Path) -> Result<ScanResult, ScanError> {
        self.scan_with_events(root, &crate::events::null_sender())
    }

    fn scan_with_events(&self, root: &Path, events: &EventSender) -> Result<ScanResult, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        events.send(Event::Scan(ScanEvent::Started {
            root: root.to_path_buf(),
        }));

        let mut paths: Vec<PathBuf> = Vec::new();
        let mut errors = Vec::new();
        let mut directories_scanned = 0;

        let mut walker = WalkDir::new(root).follow_links(self.config.follow_symlinks);
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let include_hidden = self.config.include_hidden;
        let entries = walker
            .into_iter()
            .filter_entry(|entry| include_hidden || entry.depth() == 0 || !is_hidden(entry.path()));

        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let error = Self::convert_error(e);
                    if self.config.on_error == WalkErrorPolicy::Abort {
                        return Err(error);
                    }

                    warn!(error = %error, "skipping unreadable entry");
                    Self::record(error, &mut errors, events);
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                directories_scanned += 1;
                events.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                    directories_scanned,
                    photos_found: paths.len(),
                    current_path: entry.path().to_path_buf(),
                })));
                continue;
            }

            if !self.filter.should_include(entry.path()) {
                continue;
            }

            // The results file stores paths as JSON strings
            if entry.path().to_str().is_none() {
                let error = ScanError::NonUtf8Path {
                    path: entry.into_path(),
                };
                warn!(error = %error, "skipping image with non UTF-8 name");
                Self::record(error, &mut errors, events);
                continue;
            }

            debug!(path = %entry.path().display(), "found image");
            events.send(Event::Scan(ScanEvent::PhotoFound {
                path: entry.path().to_path_buf(),
            }));
            paths.push(entry.into_path());
        }

        events.send(Event::Scan(ScanEvent::Completed {
            total_photos: paths.len(),
        }));

        Ok(ScanResult { paths, errors })
    }
}
