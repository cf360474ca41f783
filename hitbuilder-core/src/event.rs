//! Per-window collections of hits.

use crate::hit::DetectorHit;
use crate::{Error, Result};
use std::fmt;

/// Largest number of hits an event holds.
pub const MAX_EVENT_HITS: usize = i16::MAX as usize;

/// Hits reconstructed for one analysis window of one array.
///
/// Hits are kept in insertion order. The "hit occurred" flag is independent
/// of the hit collection: callers set it when a *qualifying* hit was seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectorEvent {
    hits: Vec<DetectorHit>,
    hit_flag: bool,
}

impl DetectorEvent {
    /// Creates an empty event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an event with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            hits: Vec::with_capacity(capacity.min(MAX_EVENT_HITS)),
            hit_flag: false,
        }
    }

    /// Appends a hit. Returns `false` and drops the hit once the event is
    /// full.
    pub fn push_hit(&mut self, hit: DetectorHit) -> bool {
        if self.hits.len() >= MAX_EVENT_HITS {
            log::warn!(
                "event already holds {MAX_EVENT_HITS} hits, dropping channel {}",
                hit.channel()
            );
            return false;
        }
        self.hits.push(hit);
        true
    }

    /// Number of hits in the event.
    #[inline]
    #[must_use]
    pub fn multiplicity(&self) -> usize {
        self.hits.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Returns the hit at `index`.
    ///
    /// # Errors
    /// Returns [`Error::HitIndexOutOfRange`] if there is no such hit.
    pub fn hit_at(&self, index: usize) -> Result<&DetectorHit> {
        self.hits.get(index).ok_or(Error::HitIndexOutOfRange {
            index,
            multiplicity: self.hits.len(),
        })
    }

    #[must_use]
    pub fn hits(&self) -> &[DetectorHit] {
        &self.hits
    }

    pub fn iter(&self) -> impl Iterator<Item = &DetectorHit> {
        self.hits.iter()
    }

    /// Whether a qualifying hit was flagged.
    #[inline]
    #[must_use]
    pub fn hit(&self) -> bool {
        self.hit_flag
    }

    pub fn set_hit(&mut self, flag: bool) {
        self.hit_flag = flag;
    }

    /// Removes all hits and resets the flag.
    pub fn clear(&mut self) {
        self.hits.clear();
        self.hit_flag = false;
    }

    /// Clears derived quantities on every hit.
    ///
    /// Needed after analysis options that feed derived state (cross-talk
    /// correction) change for events that were already built.
    pub fn clear_transients(&mut self) {
        for hit in &mut self.hits {
            hit.clear_transients();
        }
    }

    /// Hit with the largest energy, if any.
    #[must_use]
    pub fn leading_hit(&self) -> Option<&DetectorHit> {
        self.hits
            .iter()
            .max_by(|a, b| a.energy().total_cmp(&b.energy()))
    }

    /// Consumes the event, yielding its hits.
    #[must_use]
    pub fn into_hits(self) -> Vec<DetectorHit> {
        self.hits
    }
}

impl FromIterator<DetectorHit> for DetectorEvent {
    fn from_iter<I: IntoIterator<Item = DetectorHit>>(iter: I) -> Self {
        let mut event = Self::new();
        for hit in iter {
            event.push_hit(hit);
        }
        event
    }
}

impl fmt::Display for DetectorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} hits (hit flag {})",
            self.multiplicity(),
            self.hit_flag
        )?;
        for hit in &self.hits {
            writeln!(f, "  {hit}")?;
        }
        Ok(())
    }
}
