//! # Matcher Module
//!
//! Compares every reference image against every evaluation image and keeps
//! the pairs that look alike.
//!
//! ## Confidence Levels
//! | Mean distance | Confidence |
//! |---------------|------------|
//! | < 2000        | 5          |
//! | < 5000        | 4          |
//! | < 8000        | 3          |
//! | < 11000       | 2          |
//! | < 14000       | 1          |
//! | otherwise     | 0 (never kept) |
//!
//! ## Parallelism
//! One rayon task per reference image. Tasks share nothing but the
//! [`PairArena`], so the output does not depend on scheduling.

mod arena;
mod confidence;

pub use arena::PairArena;
pub use confidence::ConfidenceThresholds;

use crate::core::hasher::{HashPrimitive, Icon};
use crate::core::ingest::ImageRecord;
use crate::core::pipeline::CancellationToken;
use crate::core::results::Pair;
use crate::error::CompareError;
use crate::events::{CompareEvent, CompareProgress, Event, EventSender};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, trace};

/// Cross-set pair matcher
pub struct Matcher<'a> {
    hasher: &'a dyn HashPrimitive,
    thresholds: ConfidenceThresholds,
    min_confidence: u8,
}

impl<'a> Matcher<'a> {
    pub fn new(
        hasher: &'a dyn HashPrimitive,
        thresholds: ConfidenceThresholds,
        min_confidence: u8,
    ) -> Self {
        Self {
            hasher,
            thresholds,
            min_confidence,
        }
    }

    /// Confidence that `a` and `b` show the same picture
    pub fn score(&self, a: &Icon, b: &Icon) -> u8 {
        let distance = self.hasher.distance(a, b);
        self.thresholds.confidence(distance.mean())
    }

    /// Compare every reference against every evaluation record.
    ///
    /// Pairs scoring at least the minimum confidence are returned, ordered
    /// by (reference path, duplicate path). An image never pairs with
    /// itself when both trees contain the same file.
    pub fn run(
        &self,
        references: &[ImageRecord],
        evaluations: &[ImageRecord],
        cancel: &CancellationToken,
        events: &EventSender,
    ) -> Result<Vec<Pair>, CompareError> {
        events.send(Event::Compare(CompareEvent::Started {
            reference_photos: references.len(),
            evaluation_photos: evaluations.len(),
        }));

        let arena = PairArena::new();
        let finished = AtomicUsize::new(0);
        let total_references = references.len();

        references.par_iter().try_for_each(|reference| {
            for candidate in evaluations {
                if cancel.is_cancelled() {
                    return Err(CompareError::Cancelled);
                }
                if candidate.path == reference.path {
                    continue;
                }

                let confidence = self.score(&reference.icon, &candidate.icon);
                if confidence >= self.min_confidence {
                    trace!(
                        reference = %reference.path.display(),
                        duplicate = %candidate.path.display(),
                        confidence,
                        "pair kept"
                    );
                    arena.insert(Pair::new(
                        reference.path.clone(),
                        candidate.path.clone(),
                        confidence,
                    ))?;
                }
            }

            let references_completed = finished.fetch_add(1, Ordering::SeqCst) + 1;
            events.send(Event::Compare(CompareEvent::Progress(CompareProgress {
                references_completed,
                total_references,
            })));
            Ok(())
        })?;

        let pairs = arena.into_pairs()?;
        debug!(pairs = pairs.len(), "matching finished");

        events.send(Event::Compare(CompareEvent::Completed {
            total_pairs: pairs.len(),
        }));
        Ok(pairs)
    }
}
