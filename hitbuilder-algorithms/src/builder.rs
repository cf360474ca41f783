//! Event building.
//!
//! An [`EventBuilder`] consumes one array's decoded hits in stream order and
//! groups them into [`DetectorEvent`]s:
//!
//! - **By trigger** (default): hits accumulate until [`EventBuilder::trigger`]
//!   closes the event. Timestamps are not compared.
//! - **By timestamp**: a hit more than the build window after the reference
//!   timestamp closes the event and opens the next one. With a static window
//!   the reference is the event's first hit, otherwise it slides to the latest
//!   accepted hit. Trigger boundaries are ignored in this mode.
//!
//! Closing an event applies cross-talk correction, suppression and addback in
//! that order (see [`crate::coincidence`]). Veto hits steer suppression and
//! are never stored in the event.

use crate::array::DetectorArray;
use crate::coincidence::{addback, correct_cross_talk, suppress};
use hitbuilder_core::{AnalysisOptions, ChannelMap, DetectorEvent, DetectorHit};

/// Counters accumulated while building events.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStatistics {
    /// Events closed.
    pub events: usize,
    /// Detector hits received.
    pub hits_in: usize,
    /// Veto hits received.
    pub vetoes_in: usize,
    /// Hits stored in closed events.
    pub hits_out: usize,
    /// Hits removed by suppression.
    pub suppressed: usize,
    /// Hits absorbed by addback.
    pub merged: usize,
}

/// Groups one array's hit stream into events.
pub struct EventBuilder<'a> {
    array: &'a dyn DetectorArray,
    channels: &'a ChannelMap,
    options: &'a AnalysisOptions,
    pending: Vec<DetectorHit>,
    vetoes: Vec<DetectorHit>,
    reference: Option<u64>,
    stats: BuildStatistics,
}

impl<'a> EventBuilder<'a> {
    /// Creates a builder for `array`. `channels` provides the cross-talk
    /// factors.
    #[must_use]
    pub fn new(
        array: &'a dyn DetectorArray,
        channels: &'a ChannelMap,
        options: &'a AnalysisOptions,
    ) -> Self {
        Self {
            array,
            channels,
            options,
            pending: Vec::new(),
            vetoes: Vec::new(),
            reference: None,
            stats: BuildStatistics::default(),
        }
    }

    /// Options in use.
    #[must_use]
    pub fn options(&self) -> &AnalysisOptions {
        self.options
    }

    /// Counters so far.
    #[must_use]
    pub fn statistics(&self) -> BuildStatistics {
        self.stats
    }

    /// Adds the next hit of the stream.
    ///
    /// When building by timestamp and the hit falls outside the current
    /// window, the completed event is returned and the hit opens the next
    /// one.
    pub fn push(&mut self, hit: DetectorHit) -> Option<DetectorEvent> {
        let mut completed = None;

        if self.options.build_events_by_timestamp() {
            let ts = hit.timestamp();
            match self.reference {
                Some(reference) if ts.saturating_sub(reference) > self.options.build_window() => {
                    completed = Some(self.close());
                    self.reference = Some(ts);
                }
                Some(reference) => {
                    if !self.options.static_window() {
                        self.reference = Some(reference.max(ts));
                    }
                }
                None => self.reference = Some(ts),
            }
        }

        if hit.is_veto() {
            self.stats.vetoes_in += 1;
            self.vetoes.push(hit);
        } else {
            self.stats.hits_in += 1;
            self.pending.push(hit);
        }
        completed
    }

    /// Signals a trigger boundary.
    ///
    /// When building by trigger this closes the current event, which may be
    /// empty. When building by timestamp the boundary is ignored.
    pub fn trigger(&mut self) -> Option<DetectorEvent> {
        if self.options.build_events_by_timestamp() {
            return None;
        }
        Some(self.close())
    }

    /// Closes the last event if it holds any hits.
    pub fn finish(&mut self) -> Option<DetectorEvent> {
        if self.pending.is_empty() && self.vetoes.is_empty() {
            return None;
        }
        Some(self.close())
    }

    fn close(&mut self) -> DetectorEvent {
        let mut hits = std::mem::take(&mut self.pending);
        let vetoes = std::mem::take(&mut self.vetoes);
        self.reference = None;

        if self.options.is_correcting_cross_talk() {
            correct_cross_talk(&mut hits, self.channels);
        }

        let (hits, suppressed) = suppress(
            hits,
            &vetoes,
            self.options.suppression_window(),
            self.options.suppression_energy(),
        );
        self.stats.suppressed += suppressed;

        let before_addback = hits.len();
        let array = self.array;
        let hits = addback(hits, self.options.addback_window(), |a, b| {
            array.are_neighbours(a, b)
        });
        self.stats.merged += before_addback - hits.len();

        let mut event = DetectorEvent::with_capacity(hits.len());
        for hit in hits {
            if event.push_hit(hit) {
                self.stats.hits_out += 1;
            }
        }
        self.stats.events += 1;
        event
    }
}
