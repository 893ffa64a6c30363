//! Run-wide artist weight memo
//!
//! An artist appears on many genre pages, each with its own font size. The
//! first weight committed for an artist is the one every later record
//! reports. Which unit commits first is decided by lock order, not by
//! listing order.

use parking_lot::Mutex;
use std::collections::HashMap;

/// Artist name to first-committed weight, shared by every dispatched unit
///
/// A single coarse lock guards the map. It is held only for the
/// lookup-or-insert, never across network I/O.
#[derive(Debug, Default)]
pub struct ArtistWeightCache {
    weights: Mutex<HashMap<String, String>>,
}

impl ArtistWeightCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached weight for `artist`, storing `candidate` if there is none
    ///
    /// Once a key is set its value never changes.
    pub fn get_or_set(&self, artist: &str, candidate: &str) -> String {
        let mut weights = self.weights.lock();
        if let Some(existing) = weights.get(artist) {
            return existing.clone();
        }
        weights.insert(artist.to_string(), candidate.to_string());
        candidate.to_string()
    }

    /// Cached weight for `artist`, if any unit has committed one
    #[must_use]
    pub fn get(&self, artist: &str) -> Option<String> {
        self.weights.lock().get(artist).cloned()
    }

    /// Number of distinct artists seen so far
    #[must_use]
    pub fn len(&self) -> usize {
        self.weights.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.weights.lock().is_empty()
    }
}
