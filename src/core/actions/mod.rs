//! # Actions Module
//!
//! Moves or deletes the duplicate side of reviewed pairs.
//!
//! Only the duplicate image of a pair is ever touched; reference images are
//! left where they are. By default only confirmed pairs are acted on. A
//! failure on one file is recorded and the rest of the batch continues.

use crate::core::results::ResultSet;
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// What to do with each duplicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Move into this directory, keeping the file name
    Move { destination: PathBuf },
    /// Remove from disk
    Delete,
}

/// Which pairs to act on, and whether to touch the disk at all
#[derive(Debug, Clone, Copy, Default)]
pub struct ActionOptions {
    /// Include pairs that were never confirmed
    pub include_unconfirmed: bool,
    /// Report what would happen without changing anything
    pub dry_run: bool,
}

/// A per-file failure
#[derive(Debug, Clone, Serialize)]
pub struct ActionFailure {
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of a batch
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActionReport {
    /// Files moved or deleted (or that would be, on a dry run)
    pub processed: Vec<PathBuf>,
    pub failures: Vec<ActionFailure>,
    pub dry_run: bool,
    pub duration_ms: u64,
}

/// Executes move/delete batches over a result set
pub struct DuplicateActions;

impl DuplicateActions {
    /// Duplicate images selected by `options`, each listed once, in pair order.
    ///
    /// The same file can be the duplicate of several references.
    pub fn targets(results: &ResultSet, options: ActionOptions) -> Vec<PathBuf> {
        let mut seen = HashSet::new();
        results
            .image_pairs
            .iter()
            .filter(|p| options.include_unconfirmed || p.confirmed)
            .map(|p| p.duplicate_image.clone())
            .filter(|path| seen.insert(path.clone()))
            .collect()
    }

    /// Apply `action` to every selected duplicate.
    ///
    /// `on_progress` receives (done, total, current file) at most every 100ms
    /// and once at the end.
    pub fn execute<F>(
        results: &ResultSet,
        action: &Action,
        options: ActionOptions,
        mut on_progress: F,
    ) -> ActionReport
    where
        F: FnMut(usize, usize, &Path),
    {
        const PROGRESS_INTERVAL: Duration = Duration::from_millis(100);

        let start = Instant::now();
        let targets = Self::targets(results, options);
        let total = targets.len();
        let mut report = ActionReport {
            dry_run: options.dry_run,
            ..Default::default()
        };
        let mut last_progress = Instant::now();

        if let (Action::Move { destination }, false) = (action, options.dry_run) {
            if let Err(e) = fs::create_dir_all(destination) {
                warn!(
                    destination = %destination.display(),
                    error = %e,
                    "cannot create destination"
                );
                report.failures = targets
                    .into_iter()
                    .map(|path| ActionFailure {
                        path,
                        message: format!("cannot create {}: {}", destination.display(), e),
                    })
                    .collect();
                report.duration_ms = start.elapsed().as_millis() as u64;
                return report;
            }
        }

        for (i, source) in targets.iter().enumerate() {
            let now = Instant::now();
            if now.duration_since(last_progress) >= PROGRESS_INTERVAL {
                on_progress(i + 1, total, source);
                last_progress = now;
            }

            let outcome = if options.dry_run {
                Self::check(source, action)
            } else {
                Self::apply(source, action)
            };

            match outcome {
                Ok(()) => report.processed.push(source.clone()),
                Err(e) => {
                    warn!(path = %source.display(), error = %e, "action failed");
                    report.failures.push(ActionFailure {
                        path: source.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        if let Some(last) = targets.last() {
            on_progress(total, total, last);
        }

        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            processed = report.processed.len(),
            failed = report.failures.len(),
            dry_run = report.dry_run,
            "duplicate action finished"
        );
        report
    }

    /// Where a moved file ends up
    pub fn destination_for(source: &Path, destination: &Path) -> io::Result<PathBuf> {
        let name = source.file_name().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "path has no file name")
        })?;
        Ok(destination.join(name))
    }

    /// Dry-run validation: would `apply` be attempted on a real file?
    fn check(source: &Path, action: &Action) -> io::Result<()> {
        if !source.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }
        if let Action::Move { destination } = action {
            let target = Self::destination_for(source, destination)?;
            if target.exists() {
                return Err(already_exists(&target));
            }
        }
        Ok(())
    }

    fn apply(source: &Path, action: &Action) -> io::Result<()> {
        if !source.is_file() {
            return Err(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        }

        match action {
            Action::Delete => fs::remove_file(source),
            Action::Move { destination } => {
                let target = Self::destination_for(source, destination)?;
                if target.exists() {
                    return Err(already_exists(&target));
                }
                fs::rename(source, &target).or_else(|_| copy_then_remove(source, &target))
            }
        }
    }
}

fn already_exists(target: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::AlreadyExists,
        format!("{} already exists", target.display()),
    )
}

/// Move across filesystems: copy, verify the size, then remove the source
fn copy_then_remove(source: &Path, target: &Path) -> io::Result<()> {
    let source_size = fs::metadata(source)?.len();
    fs::copy(source, target)?;

    let target_size = fs::metadata(target)?.len();
    if target_size != source_size {
        let _ = fs::remove_file(target);
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!(
                "copy verification failed: source {} bytes, copy {} bytes",
                source_size, target_size
            ),
        ));
    }

    fs::remove_file(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::results::Pair;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        root: PathBuf,
        results: ResultSet,
    }

    /// Three pairs; the first and third are confirmed
    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_path_buf();
        let reference = root.join("ref");
        let evaluation = root.join("eval");
        fs::create_dir_all(&reference).unwrap();
        fs::create_dir_all(&evaluation).unwrap();

        let mut pairs = Vec::new();
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            fs::write(reference.join(name), name).unwrap();
            fs::write(evaluation.join(name), name).unwrap();
            pairs.push(Pair::new(reference.join(name), evaluation.join(name), 5));
        }
        pairs[0].confirmed = true;
        pairs[2].confirmed = true;

        Fixture {
            _dir: dir,
            results: ResultSet::new(&reference, &evaluation, pairs),
            root,
        }
    }

    #[test]
    fn targets_default_to_confirmed() {
        let f = fixture();
        let targets = DuplicateActions::targets(&f.results, ActionOptions::default());
        assert_eq!(
            targets,
            vec![f.root.join("eval/a.jpg"), f.root.join("eval/c.jpg")]
        );
    }

    #[test]
    fn targets_with_all_include_unconfirmed_once_each() {
        let mut f = fixture();
        let mut extra = f.results.image_pairs[0].clone();
        extra.reference_image = f.root.join("ref/b.jpg");
        f.results.image_pairs.push(extra);

        let targets = DuplicateActions::targets(
            &f.results,
            ActionOptions {
                include_unconfirmed: true,
                dry_run: false,
            },
        );
        assert_eq!(targets.len(), 3);
    }

    #[test]
    fn delete_removes_only_duplicates() {
        let f = fixture();
        let report = DuplicateActions::execute(
            &f.results,
            &Action::Delete,
            ActionOptions::default(),
            |_, _, _| {},
        );

        assert_eq!(report.processed.len(), 2);
        assert!(report.failures.is_empty());
        assert!(!f.root.join("eval/a.jpg").exists());
        assert!(f.root.join("eval/b.jpg").exists());
        assert!(!f.root.join("eval/c.jpg").exists());
        assert!(f.root.join("ref/a.jpg").exists());
    }

    #[test]
    fn move_keeps_file_names() {
        let f = fixture();
        let destination = f.root.join("trash");
        let report = DuplicateActions::execute(
            &f.results,
            &Action::Move {
                destination: destination.clone(),
            },
            ActionOptions::default(),
            |_, _, _| {},
        );

        assert_eq!(report.processed.len(), 2);
        assert!(destination.join("a.jpg").exists());
        assert!(destination.join("c.jpg").exists());
        assert!(!f.root.join("eval/a.jpg").exists());
        assert_eq!(fs::read_to_string(destination.join("a.jpg")).unwrap(), "a.jpg");
    }

    #[test]
    fn dry_run_touches_nothing() {
        let f = fixture();
        let destination = f.root.join("trash");
        let options = ActionOptions {
            include_unconfirmed: true,
            dry_run: true,
        };

        let report = DuplicateActions::execute(
            &f.results,
            &Action::Move {
                destination: destination.clone(),
            },
            options,
            |_, _, _| {},
        );

        assert!(report.dry_run);
        assert_eq!(report.processed.len(), 3);
        assert!(!destination.exists());
        assert!(f.root.join("eval/b.jpg").exists());
    }

    #[test]
    fn missing_file_is_reported_and_batch_continues() {
        let f = fixture();
        fs::remove_file(f.root.join("eval/a.jpg")).unwrap();

        let report = DuplicateActions::execute(
            &f.results,
            &Action::Delete,
            ActionOptions::default(),
            |_, _, _| {},
        );

        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, f.root.join("eval/a.jpg"));
        assert_eq!(report.processed, vec![f.root.join("eval/c.jpg")]);
    }

    #[test]
    fn move_refuses_to_overwrite() {
        let f = fixture();
        let destination = f.root.join("trash");
        fs::create_dir_all(&destination).unwrap();
        fs::write(destination.join("a.jpg"), "already here").unwrap();

        let report = DuplicateActions::execute(
            &f.results,
            &Action::Move {
                destination: destination.clone(),
            },
            ActionOptions::default(),
            |_, _, _| {},
        );

        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].message.contains("already exists"));
        assert_eq!(
            fs::read_to_string(destination.join("a.jpg")).unwrap(),
            "already here"
        );
        assert!(f.root.join("eval/a.jpg").exists());
    }

    #[test]
    fn final_progress_reports_completion() {
        let f = fixture();
        let mut last = (0, 0);
        DuplicateActions::execute(
            &f.results,
            &Action::Delete,
            ActionOptions {
                include_unconfirmed: false,
                dry_run: true,
            },
            |done, total, _| last = (done, total),
        );
        assert_eq!(last, (2, 2));
    }
}
