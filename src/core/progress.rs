//! Progress monitor: turns pipeline events into a terminal progress bar.
//!
//! The monitor runs on its own thread and only reads events, so removing
//! it (or hiding the bar) never changes what the pipeline produces.

use crate::events::{CompareEvent, Event, EventReceiver, IngestEvent, PipelineEvent, Received};
use indicatif::{ProgressBar, ProgressStyle};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::warn;

/// How often the spinner is redrawn while no events arrive
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Totals observed by the monitor over a whole run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProgressSummary {
    /// Ingestion completion ticks, across both trees
    pub completed: usize,
    /// Files reported as skipped
    pub failed: usize,
}

/// Background observer of pipeline events
pub struct ProgressMonitor {
    handle: JoinHandle<ProgressSummary>,
}

/// Bar style used for every phase
pub fn default_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{spinner:.green} {msg:<20} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓░")
}

impl ProgressMonitor {
    /// Start draining `receiver` into `bar`.
    ///
    /// The monitor stops once every sender of the channel has been dropped.
    pub fn spawn(receiver: EventReceiver, bar: ProgressBar) -> Self {
        let handle = thread::spawn(move || Self::drain(receiver, bar));
        Self { handle }
    }

    /// Wait for the monitor to stop and return what it counted.
    ///
    /// Drop the pipeline's sender first, or this blocks forever.
    pub fn finish(self) -> ProgressSummary {
        self.handle.join().unwrap_or_else(|_| {
            warn!("progress monitor panicked");
            ProgressSummary::default()
        })
    }

    fn drain(receiver: EventReceiver, bar: ProgressBar) -> ProgressSummary {
        let mut summary = ProgressSummary::default();

        loop {
            match receiver.recv_timeout(TICK_INTERVAL) {
                Received::Event(event) => Self::apply(&event, &bar, &mut summary),
                Received::Idle => bar.tick(),
                Received::Closed => break,
            }
        }

        bar.finish_and_clear();
        summary
    }

    fn apply(event: &Event, bar: &ProgressBar, summary: &mut ProgressSummary) {
        match event {
            Event::Pipeline(PipelineEvent::PhaseChanged { phase }) => {
                bar.set_message(phase.to_string());
            }
            Event::Ingest(IngestEvent::Started { total_photos, .. }) => {
                bar.set_length(*total_photos as u64);
                bar.set_position(0);
            }
            Event::Ingest(IngestEvent::Progress(_)) => {
                summary.completed += 1;
                bar.inc(1);
            }
            Event::Ingest(IngestEvent::Error { .. }) => {
                summary.failed += 1;
            }
            Event::Compare(CompareEvent::Started {
                reference_photos, ..
            }) => {
                bar.set_length(*reference_photos as u64);
                bar.set_position(0);
            }
            Event::Compare(CompareEvent::Progress(p)) => {
                bar.set_position(p.references_completed as u64);
            }
            Event::Pipeline(PipelineEvent::Completed { .. })
            | Event::Pipeline(PipelineEvent::Cancelled) => {
                bar.finish_and_clear();
            }
            _ => {}
        }
    }
}
