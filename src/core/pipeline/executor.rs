//! Pipeline execution implementation.

use super::context::PipelineContext;
use crate::core::hasher::{HashPrimitive, IconHasher, ImageDecoder};
use crate::core::ingest::{IngestFailure, IngestPool};
use crate::core::matcher::Matcher;
use crate::core::results::{JsonFileStore, ResultSet, ResultsStore};
use crate::core::scanner::{ImageScanner, WalkDirScanner};
use crate::error::{DupePairsError, IngestError, ScanError};
use crate::events::{null_sender, Event, EventSender, PipelineEvent, PipelinePhase, PipelineSummary};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Result of a detection run
#[derive(Debug)]
pub struct DetectionReport {
    /// The saved result set
    pub results: ResultSet,
    /// Where the result set was written
    pub output: PathBuf,
    /// Reference images fingerprinted
    pub reference_photos: usize,
    /// Evaluation images fingerprinted
    pub evaluation_photos: usize,
    /// Entries skipped during the walk (unreadable, or names the results file cannot hold)
    pub scan_errors: Vec<ScanError>,
    /// Images that could not be decoded
    pub failures: Vec<IngestFailure>,
    /// Duration in milliseconds
    pub duration_ms: u64,
}

/// Walk, ingest, match and save
pub struct DetectionPipeline {
    ctx: PipelineContext,
    hasher: Arc<dyn HashPrimitive>,
}

impl DetectionPipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        Self {
            ctx,
            hasher: Arc::new(IconHasher::default()),
        }
    }

    /// Swap the fingerprint primitive
    pub fn with_hasher(mut self, hasher: Arc<dyn HashPrimitive>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    /// Run the pipeline without events
    pub fn run(&self) -> Result<DetectionReport, DupePairsError> {
        self.run_with_events(&null_sender())
    }

    /// Run the pipeline with event reporting.
    ///
    /// On cancellation or a fatal error nothing is written.
    pub fn run_with_events(&self, events: &EventSender) -> Result<DetectionReport, DupePairsError> {
        events.send(Event::Pipeline(PipelineEvent::Started));

        match self.execute(events) {
            Ok(report) => Ok(report),
            Err(e) if self.ctx.is_cancelled() => {
                info!("detection cancelled");
                events.send(Event::Pipeline(PipelineEvent::Cancelled));
                Err(e)
            }
            Err(e) => {
                error!(error = %e, "detection failed");
                events.send(Event::Pipeline(PipelineEvent::Error {
                    message: e.to_string(),
                }));
                Err(e)
            }
        }
    }

    fn execute(&self, events: &EventSender) -> Result<DetectionReport, DupePairsError> {
        let start_time = Instant::now();
        let config = self.ctx.config();
        let announce = |phase| events.send(Event::Pipeline(PipelineEvent::PhaseChanged { phase }));

        // Phase 1: walk both trees
        let scanner = WalkDirScanner::new(config.scan.clone());

        announce(PipelinePhase::ScanningReference);
        let reference_scan = scanner.scan_with_events(&config.reference_dir, events)?;
        announce(PipelinePhase::ScanningEvaluation);
        let evaluation_scan = scanner.scan_with_events(&config.evaluation_dir, events)?;

        let mut scan_errors = reference_scan.errors;
        scan_errors.extend(evaluation_scan.errors);
        info!(
            reference = reference_scan.paths.len(),
            evaluation = evaluation_scan.paths.len(),
            skipped = scan_errors.len(),
            "walk finished"
        );
        self.check_cancelled()?;

        // Phase 2: ingest reference, then evaluation
        let pool = IngestPool::new(ImageDecoder::new(config.retry), Arc::clone(&self.hasher));

        announce(PipelinePhase::IngestingReference);
        let references = pool.run(reference_scan.paths, &self.ctx, events)?;
        announce(PipelinePhase::IngestingEvaluation);
        let evaluations = pool.run(evaluation_scan.paths, &self.ctx, events)?;

        let mut failures = references.failures;
        failures.extend(evaluations.failures);
        if !failures.is_empty() {
            warn!(count = failures.len(), "some images could not be read and were skipped");
        }

        // Phase 3: match
        announce(PipelinePhase::Comparing);
        let matcher = Matcher::new(
            self.hasher.as_ref(),
            config.thresholds,
            config.min_confidence,
        );
        let pairs = matcher.run(
            &references.records,
            &evaluations.records,
            self.ctx.cancellation(),
            events,
        )?;
        info!(pairs = pairs.len(), "matching finished");

        // Phase 4: save
        announce(PipelinePhase::Saving);
        let results = ResultSet::new(&config.reference_dir, &config.evaluation_dir, pairs);
        JsonFileStore::new(&config.output).save(&results)?;

        let duration_ms = start_time.elapsed().as_millis() as u64;
        let report = DetectionReport {
            results,
            output: config.output.clone(),
            reference_photos: references.records.len(),
            evaluation_photos: evaluations.records.len(),
            scan_errors,
            failures,
            duration_ms,
        };

        events.send(Event::Pipeline(PipelineEvent::Completed {
            summary: PipelineSummary {
                reference_photos: report.reference_photos,
                evaluation_photos: report.evaluation_photos,
                pairs_found: report.results.len(),
                skipped_files: report.failures.len() + report.scan_errors.len(),
                duration_ms,
            },
        }));

        Ok(report)
    }

    fn check_cancelled(&self) -> Result<(), DupePairsError> {
        if self.ctx.is_cancelled() {
            return Err(IngestError::Cancelled.into());
        }
        Ok(())
    }
}
