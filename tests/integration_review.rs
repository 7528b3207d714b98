//! Integration tests for resumable review.
//!
//! These tests drive a review session against a results file on disk and
//! real decoded images:
//! - Cursor movement and persistence across reopen
//! - Confirmations surviving a restart
//! - The three-slot window sliding over the list

use dupe_pairs::core::hasher::ImageDecoder;
use dupe_pairs::core::results::{JsonFileStore, Pair, ResultSet, ResultsStore};
use dupe_pairs::core::review::{ReviewCache, ReviewSession};
use image::{DynamicImage, ImageBuffer, Luma};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Writes `count` distinct PNGs; image `i` is (i+1) pixels wide
fn create_images(dir: &Path, prefix: &str, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| {
            let path = dir.join(format!("{}_{}.png", prefix, i));
            DynamicImage::ImageLuma8(ImageBuffer::from_pixel(
                i as u32 + 1,
                4,
                Luma([(i * 40) as u8]),
            ))
            .save(&path)
            .unwrap();
            path
        })
        .collect()
}

struct Fixture {
    dir: TempDir,
    results_path: PathBuf,
}

impl Fixture {
    fn new(pairs: usize, start_index: usize) -> Self {
        let dir = TempDir::new().unwrap();
        let reference = dir.path().join("reference");
        let evaluation = dir.path().join("evaluation");
        fs::create_dir(&reference).unwrap();
        fs::create_dir(&evaluation).unwrap();

        let references = create_images(&reference, "ref", pairs);
        let duplicates = create_images(&evaluation, "dup", pairs);
        let mut results = ResultSet::new(
            &reference,
            &evaluation,
            references
                .into_iter()
                .zip(duplicates)
                .map(|(r, d)| Pair::new(r, d, 5))
                .collect(),
        );
        results.start_index = start_index;

        let results_path = dir.path().join("results.json");
        JsonFileStore::new(&results_path).save(&results).unwrap();
        Self { dir, results_path }
    }

    fn open(&self) -> ReviewSession<JsonFileStore, ImageDecoder> {
        ReviewSession::open(
            JsonFileStore::new(&self.results_path),
            Arc::new(ImageDecoder::default()),
        )
        .unwrap()
    }

    fn saved(&self) -> ResultSet {
        JsonFileStore::new(&self.results_path).load().unwrap()
    }
}

#[test]
fn cursor_moves_and_is_saved() {
    let fixture = Fixture::new(5, 2);
    let mut session = fixture.open();

    session.next().unwrap();
    session.next().unwrap();
    session.next().unwrap();
    session.previous().unwrap();

    assert_eq!(session.cursor(), 4);
    assert_eq!(fixture.saved().start_index, 4);
}

#[test]
fn review_resumes_after_reopen() {
    let fixture = Fixture::new(5, 0);
    {
        let mut session = fixture.open();
        session.next().unwrap();
        session.confirm().unwrap();
    }

    let mut session = fixture.open();
    assert_eq!(session.cursor(), 2);

    let shown = session.current();
    assert_eq!(shown.index, 2);
    assert_eq!(
        shown.reference.path,
        fixture.dir.path().join("reference/ref_2.png")
    );
    assert_eq!(shown.reference.dimensions(), Some((3, 4)));
}

#[test]
fn confirmations_are_persisted() {
    let fixture = Fixture::new(3, 0);
    {
        let mut session = fixture.open();
        session.confirm().unwrap();
        session.next().unwrap();
        session.confirm().unwrap();
    }

    let saved = fixture.saved();
    let confirmed: Vec<bool> = saved.image_pairs.iter().map(|p| p.confirmed).collect();
    assert_eq!(confirmed, vec![true, false, true]);
    assert_eq!(saved.start_index, 3);

    let session = fixture.open();
    assert!(session.is_complete());
}

#[test]
fn unreadable_image_does_not_stop_review() {
    let fixture = Fixture::new(3, 0);
    fs::write(
        fixture.dir.path().join("evaluation/dup_1.png"),
        b"not a png",
    )
    .unwrap();

    let mut session = fixture.open();
    session.next().unwrap();
    let shown = session.current();

    assert_eq!(shown.index, 1);
    assert!(shown.duplicate.image.failure().is_some());
    assert!(shown.reference.image.image().is_some());

    session.next().unwrap();
    assert_eq!(session.current().index, 2);
}

#[test]
fn cache_window_slides_over_decoded_images() {
    let dir = TempDir::new().unwrap();
    let paths = create_images(dir.path(), "img", 10);

    let mut cache = ReviewCache::new(paths.clone(), 2, Arc::new(ImageDecoder::default())).unwrap();
    assert_eq!(cache.window_indices(), [1, 2, 3]);

    let shown = cache.next();
    assert_eq!(shown.index, 2);
    assert_eq!(shown.path, paths[2]);
    assert_eq!(cache.window_indices(), [2, 3, 4]);
    assert_eq!(cache.current().dimensions(), Some((4, 4)));

    let shown = cache.previous();
    assert_eq!(shown.index, 2);
    assert_eq!(cache.window_indices(), [1, 2, 3]);
    assert!(cache.resident_images() <= 3);
}
