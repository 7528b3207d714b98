//! Concurrent collection point for matched pairs.

use crate::core::results::{Pair, PairKey};
use crate::error::CompareError;
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Pairs found so far, keyed by (reference, duplicate).
///
/// Comparison tasks only ever call [`PairArena::insert`]; the map is
/// handed out once, in key order, after every task has finished.
#[derive(Debug, Default)]
pub struct PairArena {
    pairs: Mutex<BTreeMap<PairKey, Pair>>,
}

impl PairArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pair. Returns `false` if the key was already present, in
    /// which case the first pair recorded is kept.
    pub fn insert(&self, pair: Pair) -> Result<bool, CompareError> {
        let mut pairs = self.pairs.lock().map_err(|_| CompareError::Poisoned)?;
        let key = pair.key();
        if pairs.contains_key(&key) {
            return Ok(false);
        }
        pairs.insert(key, pair);
        Ok(true)
    }

    pub fn len(&self) -> Result<usize, CompareError> {
        Ok(self.pairs.lock().map_err(|_| CompareError::Poisoned)?.len())
    }

    /// All recorded pairs, ordered by reference path then duplicate path
    pub fn into_pairs(self) -> Result<Vec<Pair>, CompareError> {
        let pairs = self.pairs.into_inner().map_err(|_| CompareError::Poisoned)?;
        Ok(pairs.into_values().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::thread;

    fn pair(r: &str, d: &str, confidence: u8) -> Pair {
        Pair::new(PathBuf::from(r), PathBuf::from(d), confidence)
    }

    #[test]
    fn keeps_first_pair_per_key() {
        let arena = PairArena::new();
        assert!(arena.insert(pair("a", "b", 5)).unwrap());
        assert!(!arena.insert(pair("a", "b", 2)).unwrap());

        let pairs = arena.into_pairs().unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].confidence, 5);
    }

    #[test]
    fn output_is_ordered_by_key() {
        let arena = PairArena::new();
        arena.insert(pair("b", "z", 5)).unwrap();
        arena.insert(pair("a", "y", 5)).unwrap();
        arena.insert(pair("b", "a", 5)).unwrap();

        let keys: Vec<_> = arena
            .into_pairs()
            .unwrap()
            .into_iter()
            .map(|p| (p.reference_image, p.duplicate_image))
            .collect();
        assert_eq!(
            keys,
            vec![
                (PathBuf::from("a"), PathBuf::from("y")),
                (PathBuf::from("b"), PathBuf::from("a")),
                (PathBuf::from("b"), PathBuf::from("z")),
            ]
        );
    }

    #[test]
    fn concurrent_inserts_are_all_recorded() {
        let arena = PairArena::new();
        thread::scope(|scope| {
            for t in 0..8 {
                let arena = &arena;
                scope.spawn(move || {
                    for i in 0..50 {
                        arena
                            .insert(pair(&format!("r{t}"), &format!("d{i}"), 4))
                            .unwrap();
                    }
                });
            }
        });
        assert_eq!(arena.len().unwrap(), 400);
    }
}
