//! # Results Module
//!
//! The candidate pairs found by a detection run, plus the review cursor.
//!
//! ## File Format
//! JSON, field names as below:
//! ```json
//! {
//!   "ReferenceDirectory": "/photos/originals",
//!   "EvaluationDirectory": "/photos/imports",
//!   "StartIndex": 0,
//!   "ImagePairs": [
//!     {
//!       "ReferenceImage": "/photos/originals/a.jpg",
//!       "DuplicateImage": "/photos/imports/a_copy.jpg",
//!       "Confirmed": false,
//!       "Confidence": 5
//!     }
//!   ]
//! }
//! ```

mod store;

pub use store::{InMemoryStore, JsonFileStore, ResultsStore};

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Identity of a pair: (reference path, duplicate path)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PairKey {
    pub reference: PathBuf,
    pub duplicate: PathBuf,
}

/// A reference image and a candidate duplicate of it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    #[serde(rename = "ReferenceImage")]
    pub reference_image: PathBuf,
    #[serde(rename = "DuplicateImage")]
    pub duplicate_image: PathBuf,
    /// Set by the user during review
    #[serde(rename = "Confirmed", default)]
    pub confirmed: bool,
    /// 1 (weak) to 5 (near-identical)
    #[serde(rename = "Confidence")]
    pub confidence: u8,
}

impl Pair {
    pub fn new(reference_image: PathBuf, duplicate_image: PathBuf, confidence: u8) -> Self {
        Self {
            reference_image,
            duplicate_image,
            confirmed: false,
            confidence,
        }
    }

    pub fn key(&self) -> PairKey {
        PairKey {
            reference: self.reference_image.clone(),
            duplicate: self.duplicate_image.clone(),
        }
    }
}

/// Everything persisted between detection and review
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(rename = "ReferenceDirectory")]
    pub reference_directory: PathBuf,
    #[serde(rename = "EvaluationDirectory")]
    pub evaluation_directory: PathBuf,
    /// Review cursor; equal to the pair count once review is complete
    #[serde(rename = "StartIndex", default)]
    pub start_index: usize,
    #[serde(rename = "ImagePairs", default)]
    pub image_pairs: Vec<Pair>,
}

impl ResultSet {
    /// A fresh, unreviewed result set
    pub fn new(reference_directory: &Path, evaluation_directory: &Path, pairs: Vec<Pair>) -> Self {
        Self {
            reference_directory: reference_directory.to_path_buf(),
            evaluation_directory: evaluation_directory.to_path_buf(),
            start_index: 0,
            image_pairs: pairs,
        }
    }

    pub fn len(&self) -> usize {
        self.image_pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.image_pairs.is_empty()
    }

    /// Pairs the user has confirmed as duplicates
    pub fn confirmed(&self) -> impl Iterator<Item = &Pair> {
        self.image_pairs.iter().filter(|p| p.confirmed)
    }

    /// Check the invariants a loaded file must satisfy.
    ///
    /// Returns a description of the first violation found.
    pub fn check(&self) -> Result<(), String> {
        if self.start_index > self.image_pairs.len() {
            return Err(format!(
                "StartIndex {} is past the end of {} pairs",
                self.start_index,
                self.image_pairs.len()
            ));
        }

        let mut seen = HashSet::with_capacity(self.image_pairs.len());
        for pair in &self.image_pairs {
            if !(1..=5).contains(&pair.confidence) {
                return Err(format!(
                    "pair {} -> {} has confidence {}, expected 1 to 5",
                    pair.reference_image.display(),
                    pair.duplicate_image.display(),
                    pair.confidence
                ));
            }
            if !seen.insert(pair.key()) {
                return Err(format!(
                    "pair {} -> {} appears more than once",
                    pair.reference_image.display(),
                    pair.duplicate_image.display()
                ));
            }
        }
        Ok(())
    }
}
