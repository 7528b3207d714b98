//! Resumable review of stored pairs.

use super::cache::{ReviewCache, ReviewItem};
use super::loader::ImageLoader;
use crate::core::results::{Pair, ResultSet, ResultsStore};
use crate::error::ReviewError;
use std::sync::Arc;
use tracing::info;

/// A pair as presented to the reviewer
#[derive(Debug, Clone)]
pub struct ReviewPair {
    /// Position of the pair in the result set
    pub index: usize,
    pub pair: Pair,
    pub reference: ReviewItem,
    pub duplicate: ReviewItem,
}

/// Walks the stored pairs with a persistent cursor.
///
/// The cursor runs from 0 to the number of pairs; it equals the number of
/// pairs once every pair has been passed. Every action that moves the
/// cursor or confirms a pair is saved before it returns, so an interrupted
/// review resumes where it stopped.
pub struct ReviewSession<S: ResultsStore, L: ImageLoader> {
    store: S,
    results: ResultSet,
    references: ReviewCache<L>,
    duplicates: ReviewCache<L>,
}

impl<S: ResultsStore, L: ImageLoader> ReviewSession<S, L> {
    /// Load the result set and open both image caches at the saved cursor
    pub fn open(store: S, loader: Arc<L>) -> Result<Self, ReviewError> {
        let results = store.load()?;
        if results.is_empty() {
            return Err(ReviewError::Empty);
        }

        let at = results.start_index.min(results.len() - 1);
        let references = ReviewCache::new(
            results
                .image_pairs
                .iter()
                .map(|p| p.reference_image.clone())
                .collect(),
            at,
            Arc::clone(&loader),
        )?;
        let duplicates = ReviewCache::new(
            results
                .image_pairs
                .iter()
                .map(|p| p.duplicate_image.clone())
                .collect(),
            at,
            loader,
        )?;

        info!(
            pairs = results.len(),
            cursor = results.start_index,
            "review session opened"
        );
        Ok(Self {
            store,
            results,
            references,
            duplicates,
        })
    }

    pub fn cursor(&self) -> usize {
        self.results.start_index
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// True once the cursor has passed the last pair
    pub fn is_complete(&self) -> bool {
        self.cursor() >= self.len()
    }

    pub fn results(&self) -> &ResultSet {
        &self.results
    }

    /// The pair under the cursor (the last pair once review is complete)
    pub fn current(&mut self) -> ReviewPair {
        let reference = self.references.current();
        let duplicate = self.duplicates.current();
        self.pair(reference, duplicate)
    }

    /// Hand out the pair under the cursor and advance past it.
    ///
    /// Once review is complete this returns the last pair and changes nothing.
    pub fn next(&mut self) -> Result<ReviewPair, ReviewError> {
        self.advance(false)
    }

    /// Step the cursor back one pair and return the pair now under it.
    pub fn previous(&mut self) -> Result<ReviewPair, ReviewError> {
        if self.cursor() == 0 {
            return Ok(self.current());
        }

        let was_complete = self.is_complete();
        let mut staged = self.results.clone();
        staged.start_index -= 1;
        self.commit(staged)?;

        if was_complete {
            // The caches never left the last pair
            return Ok(self.current());
        }

        let reference = self.references.previous();
        let duplicate = self.duplicates.previous();
        Ok(self.pair(reference, duplicate))
    }

    /// Confirm the pair under the cursor, then advance like [`Self::next`]
    pub fn confirm(&mut self) -> Result<ReviewPair, ReviewError> {
        self.advance(true)
    }

    /// Save the moved cursor (and confirmation) first; session state and
    /// caches only change once the save succeeded.
    fn advance(&mut self, confirm: bool) -> Result<ReviewPair, ReviewError> {
        if self.is_complete() {
            return Ok(self.current());
        }

        let mut staged = self.results.clone();
        if confirm {
            staged.image_pairs[staged.start_index].confirmed = true;
        }
        staged.start_index += 1;
        self.commit(staged)?;

        let reference = self.references.next();
        let duplicate = self.duplicates.next();
        Ok(self.pair(reference, duplicate))
    }

    fn pair(&self, reference: ReviewItem, duplicate: ReviewItem) -> ReviewPair {
        let index = reference.index;
        ReviewPair {
            index,
            pair: self.results.image_pairs[index].clone(),
            reference,
            duplicate,
        }
    }

    fn commit(&mut self, staged: ResultSet) -> Result<(), ReviewError> {
        self.store.save(&staged)?;
        self.results = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::results::InMemoryStore;
    use crate::error::{HashError, StoreError};
    use image::{DynamicImage, ImageBuffer, Luma};
    use std::path::{Path, PathBuf};

    struct BlankLoader;

    impl ImageLoader for BlankLoader {
        fn load(&self, _path: &Path) -> Result<DynamicImage, HashError> {
            Ok(DynamicImage::ImageLuma8(ImageBuffer::from_pixel(
                2,
                2,
                Luma([0]),
            )))
        }
    }

    /// Loads fine, refuses every save
    struct ReadOnlyStore(ResultSet);

    impl ResultsStore for ReadOnlyStore {
        fn load(&self) -> Result<ResultSet, StoreError> {
            Ok(self.0.clone())
        }

        fn save(&self, _results: &ResultSet) -> Result<(), StoreError> {
            Err(StoreError::Write {
                path: PathBuf::from("/read-only/results.json"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
    }

    fn results(n: usize, cursor: usize) -> ResultSet {
        let pairs = (0..n)
            .map(|i| {
                Pair::new(
                    PathBuf::from(format!("/ref/{i}.jpg")),
                    PathBuf::from(format!("/eval/{i}.jpg")),
                    5,
                )
            })
            .collect();
        let mut set = ResultSet::new(Path::new("/ref"), Path::new("/eval"), pairs);
        set.start_index = cursor;
        set
    }

    fn open(n: usize, cursor: usize) -> ReviewSession<Arc<InMemoryStore>, BlankLoader> {
        ReviewSession::open(Arc::new(InMemoryStore::new(results(n, cursor))), Arc::new(BlankLoader))
            .unwrap()
    }

    #[test]
    fn empty_result_set_cannot_be_reviewed() {
        let store = InMemoryStore::new(results(0, 0));
        let result = ReviewSession::open(store, Arc::new(BlankLoader));
        assert!(matches!(result, Err(ReviewError::Empty)));
    }

    #[test]
    fn opens_at_saved_cursor() {
        let mut session = open(5, 3);
        assert_eq!(session.cursor(), 3);
        assert_eq!(session.current().index, 3);
    }

    #[test]
    fn three_steps_forward_then_one_back() {
        let mut session = open(5, 2);
        session.next().unwrap();
        session.next().unwrap();
        session.next().unwrap();
        assert_eq!(session.cursor(), 5);
        assert!(session.is_complete());

        let shown = session.previous().unwrap();
        assert_eq!(session.cursor(), 4);
        assert_eq!(shown.index, 4);
    }

    #[test]
    fn next_hands_out_pair_under_cursor() {
        let mut session = open(3, 0);
        let shown = session.next().unwrap();
        assert_eq!(shown.index, 0);
        assert_eq!(shown.pair.reference_image, PathBuf::from("/ref/0.jpg"));
        assert_eq!(shown.duplicate.path, PathBuf::from("/eval/0.jpg"));
        assert_eq!(session.cursor(), 1);
    }

    #[test]
    fn next_after_completion_changes_nothing() {
        let mut session = open(2, 2);
        let shown = session.next().unwrap();
        assert_eq!(shown.index, 1);
        assert_eq!(session.cursor(), 2);
    }

    #[test]
    fn previous_at_start_changes_nothing() {
        let mut session = open(3, 0);
        let shown = session.previous().unwrap();
        assert_eq!(shown.index, 0);
        assert_eq!(session.cursor(), 0);
    }

    #[test]
    fn confirm_marks_and_advances() {
        let store = Arc::new(InMemoryStore::new(results(3, 1)));
        let mut session = ReviewSession::open(Arc::clone(&store), Arc::new(BlankLoader)).unwrap();

        let shown = session.confirm().unwrap();
        assert_eq!(shown.index, 1);
        assert!(shown.pair.confirmed);
        assert_eq!(session.cursor(), 2);

        let saved = store.snapshot().unwrap();
        assert_eq!(saved.start_index, 2);
        assert!(saved.image_pairs[1].confirmed);
        assert!(!saved.image_pairs[0].confirmed);
        assert!(!saved.image_pairs[2].confirmed);
    }

    #[test]
    fn every_action_is_saved() {
        let store = Arc::new(InMemoryStore::new(results(4, 0)));
        let mut session = ReviewSession::open(Arc::clone(&store), Arc::new(BlankLoader)).unwrap();

        session.next().unwrap();
        assert_eq!(store.snapshot().unwrap().start_index, 1);
        session.next().unwrap();
        assert_eq!(store.snapshot().unwrap().start_index, 2);
        session.previous().unwrap();
        assert_eq!(store.snapshot().unwrap().start_index, 1);
    }

    #[test]
    fn reopening_resumes_where_review_stopped() {
        let store = Arc::new(InMemoryStore::new(results(5, 0)));
        {
            let mut session =
                ReviewSession::open(Arc::clone(&store), Arc::new(BlankLoader)).unwrap();
            session.next().unwrap();
            session.confirm().unwrap();
        }

        let mut resumed = ReviewSession::open(Arc::clone(&store), Arc::new(BlankLoader)).unwrap();
        assert_eq!(resumed.cursor(), 2);
        assert_eq!(resumed.current().index, 2);
        assert!(resumed.results().image_pairs[1].confirmed);
    }

    #[test]
    fn failed_save_is_reported() {
        let store = ReadOnlyStore(results(3, 0));
        let mut session = ReviewSession::open(store, Arc::new(BlankLoader)).unwrap();

        let error = session.next().unwrap_err();
        assert!(matches!(error, ReviewError::Store(StoreError::Write { .. })));
        assert!(error.to_string().contains("NOT been saved"));
    }

    #[test]
    fn failed_save_leaves_session_unchanged() {
        let store = ReadOnlyStore(results(4, 1));
        let mut session = ReviewSession::open(store, Arc::new(BlankLoader)).unwrap();

        assert!(session.confirm().is_err());
        assert_eq!(session.cursor(), 1);
        assert!(!session.results().image_pairs[1].confirmed);
        assert_eq!(session.current().index, 1);

        assert!(session.next().is_err());
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.current().index, 1);

        assert!(session.previous().is_err());
        assert_eq!(session.cursor(), 1);
        assert_eq!(session.current().index, 1);
        assert_eq!(session.current().duplicate.path, PathBuf::from("/eval/1.jpg"));
    }
}
