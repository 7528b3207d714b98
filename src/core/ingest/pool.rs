//! Bounded worker pool that decodes and fingerprints images.

use super::{ImageRecord, IngestFailure, IngestResult};
use crate::core::hasher::{HashPrimitive, Icon, ImageDecoder};
use crate::core::pipeline::PipelineContext;
use crate::error::{HashError, IngestError};
use crate::events::{Event, EventSender, IngestEvent, IngestProgress};
use crossbeam_channel::{Receiver, Sender};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, warn};

type Outcome = Result<ImageRecord, IngestFailure>;

/// Decodes and fingerprints image files on a fixed number of threads
pub struct IngestPool {
    decoder: ImageDecoder,
    hasher: Arc<dyn HashPrimitive>,
}

impl IngestPool {
    pub fn new(decoder: ImageDecoder, hasher: Arc<dyn HashPrimitive>) -> Self {
        Self { decoder, hasher }
    }

    /// Ingest every path in `paths`.
    ///
    /// Starts `min(paths.len(), ctx.worker_cap())` workers. The queue is
    /// filled and closed before the workers finish, so each path is handed
    /// to exactly one worker. Every processed path produces one
    /// [`IngestEvent::Progress`] tick, whether it succeeded or was skipped.
    pub fn run(
        &self,
        paths: Vec<PathBuf>,
        ctx: &PipelineContext,
        events: &EventSender,
    ) -> Result<IngestResult, IngestError> {
        let total = paths.len();
        let workers = ctx.worker_cap().min(total);

        events.send(Event::Ingest(IngestEvent::Started {
            total_photos: total,
            workers,
        }));

        if total == 0 {
            events.send(Event::Ingest(IngestEvent::Completed {
                ingested: 0,
                failed: 0,
            }));
            return Ok(IngestResult::default());
        }

        debug!(total, workers, "starting ingestion pool");
        let completed = AtomicUsize::new(0);

        let outcomes = thread::scope(|scope| -> Result<Vec<Outcome>, IngestError> {
            let (work_tx, work_rx) = crossbeam_channel::bounded::<PathBuf>(workers * 2);
            let (done_tx, done_rx) = crossbeam_channel::unbounded::<Outcome>();

            let mut handles = Vec::with_capacity(workers);
            for id in 0..workers {
                let work_rx = work_rx.clone();
                let done_tx = done_tx.clone();
                let completed = &completed;
                let handle = thread::Builder::new()
                    .name(format!("ingest-{id}"))
                    .spawn_scoped(scope, move || {
                        self.work(work_rx, done_tx, ctx, events, completed, total)
                    })
                    .map_err(IngestError::WorkerSpawn)?;
                handles.push(handle);
            }
            drop(work_rx);
            drop(done_tx);

            for path in paths {
                if ctx.is_cancelled() || work_tx.send(path).is_err() {
                    break;
                }
            }
            // Closing the queue lets idle workers exit
            drop(work_tx);

            let outcomes: Vec<Outcome> = done_rx.iter().collect();

            for handle in handles {
                handle.join().map_err(|_| IngestError::WorkerPanicked)?;
            }
            Ok(outcomes)
        })?;

        if ctx.is_cancelled() {
            return Err(IngestError::Cancelled);
        }

        let mut result = IngestResult::default();
        for outcome in outcomes {
            match outcome {
                Ok(record) => result.records.push(record),
                Err(failure) => result.failures.push(failure),
            }
        }
        result.records.sort_by(|a, b| a.path.cmp(&b.path));
        result.failures.sort_by(|a, b| a.path.cmp(&b.path));

        events.send(Event::Ingest(IngestEvent::Completed {
            ingested: result.records.len(),
            failed: result.failures.len(),
        }));

        Ok(result)
    }

    fn work(
        &self,
        queue: Receiver<PathBuf>,
        done: Sender<Outcome>,
        ctx: &PipelineContext,
        events: &EventSender,
        completed: &AtomicUsize,
        total: usize,
    ) {
        for path in queue.iter() {
            if ctx.is_cancelled() {
                break;
            }

            let outcome = match self.ingest_one(&path) {
                Ok(icon) => Ok(ImageRecord {
                    path: path.clone(),
                    icon,
                }),
                Err(error) => {
                    warn!(path = %path.display(), error = %error, "skipping unreadable image");
                    events.send(Event::Ingest(IngestEvent::Error {
                        path: path.clone(),
                        message: error.to_string(),
                    }));
                    Err(IngestFailure {
                        path: path.clone(),
                        error,
                    })
                }
            };

            let finished = completed.fetch_add(1, Ordering::SeqCst) + 1;
            events.send(Event::Ingest(IngestEvent::Progress(IngestProgress {
                completed: finished,
                total,
                current_path: path,
            })));

            if done.send(outcome).is_err() {
                break;
            }
        }
    }

    fn ingest_one(&self, path: &Path) -> Result<Icon, HashError> {
        let image = self.decoder.decode(path)?;
        self.hasher.fingerprint(&image)
    }
}
