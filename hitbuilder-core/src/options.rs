//! Run-level analysis options.
//!
//! One [`AnalysisOptions`] record parameterizes event building for a run. It
//! is read-only while events are built and is stored in the run's output
//! container so the run can be reproduced.
#![allow(clippy::struct_excessive_bools)]

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tunable thresholds and feature toggles for hit building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    build_window: u64,
    build_events_by_timestamp: bool,
    addback_window: u64,
    suppression_window: f64,
    suppression_energy: f64,
    static_window: bool,
    waveform_fitting: bool,
    correct_cross_talk: bool,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        let mut options = Self {
            build_window: 0,
            build_events_by_timestamp: false,
            addback_window: 0,
            suppression_window: 0.0,
            suppression_energy: 0.0,
            static_window: false,
            waveform_fitting: false,
            correct_cross_talk: false,
        };
        options.clear();
        options
    }
}

impl AnalysisOptions {
    /// Type name stored with persisted records.
    pub const CLASS_NAME: &'static str = "AnalysisOptions";
    /// Schema version stored with persisted records.
    pub const CLASS_VERSION: u32 = 2;
    /// Key under which the record is written.
    pub const KEY: &'static str = "AnalysisOptions";

    /// Creates options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets every field to its default.
    pub fn clear(&mut self) {
        self.build_window = 2000;
        self.build_events_by_timestamp = false;
        self.addback_window = 300;
        self.suppression_window = 300.0;
        self.suppression_energy = 0.0;
        self.static_window = false;
        self.waveform_fitting = false;
        self.correct_cross_talk = true;
    }

    /// Event build window in timestamp units.
    #[must_use]
    pub fn build_window(&self) -> u64 {
        self.build_window
    }

    /// Whether events are built by timestamp rather than by trigger.
    #[must_use]
    pub fn build_events_by_timestamp(&self) -> bool {
        self.build_events_by_timestamp
    }

    /// Addback coincidence window in timestamp units.
    #[must_use]
    pub fn addback_window(&self) -> u64 {
        self.addback_window
    }

    /// Suppression coincidence window in timestamp units.
    #[must_use]
    pub fn suppression_window(&self) -> f64 {
        self.suppression_window
    }

    /// Hits at or above this energy are never suppressed.
    #[must_use]
    pub fn suppression_energy(&self) -> f64 {
        self.suppression_energy
    }

    /// Whether the build window is anchored at the first hit.
    #[must_use]
    pub fn static_window(&self) -> bool {
        self.static_window
    }

    #[must_use]
    pub fn waveform_fitting(&self) -> bool {
        self.waveform_fitting
    }

    #[must_use]
    pub fn is_correcting_cross_talk(&self) -> bool {
        self.correct_cross_talk
    }

    pub fn set_build_window(&mut self, window: u64) {
        self.build_window = window;
    }

    pub fn set_build_events_by_timestamp(&mut self, flag: bool) {
        self.build_events_by_timestamp = flag;
    }

    pub fn set_addback_window(&mut self, window: u64) {
        self.addback_window = window;
    }

    /// Sets the suppression window.
    ///
    /// # Errors
    /// Returns [`Error::Config`] for negative or non-finite values.
    pub fn set_suppression_window(&mut self, window: f64) -> Result<()> {
        self.suppression_window = non_negative("suppression window", window)?;
        Ok(())
    }

    /// Sets the suppression energy threshold.
    ///
    /// # Errors
    /// Returns [`Error::Config`] for negative or non-finite values.
    pub fn set_suppression_energy(&mut self, energy: f64) -> Result<()> {
        self.suppression_energy = non_negative("suppression energy", energy)?;
        Ok(())
    }

    pub fn set_static_window(&mut self, flag: bool) {
        self.static_window = flag;
    }

    pub fn set_waveform_fitting(&mut self, flag: bool) {
        self.waveform_fitting = flag;
    }

    /// Turns cross-talk correction on or off.
    ///
    /// Events built before the change keep corrected energies computed with
    /// the old setting; call `DetectorEvent::clear_transients` on them. An
    /// advisory saying so is logged unless `opt` contains `q` (quiet).
    pub fn set_correct_cross_talk(&mut self, flag: bool, opt: &str) {
        self.correct_cross_talk = flag;
        if opt.chars().any(|c| c.eq_ignore_ascii_case(&'q')) {
            return;
        }
        log::warn!(
            "cross-talk correction set to {flag}: call DetectorEvent::clear_transients() on the current event to drop stale corrected energies"
        );
    }

    /// Checks the invariants of a record obtained from outside (e.g. a
    /// persisted container).
    ///
    /// # Errors
    /// Returns [`Error::Config`] if a window or threshold is negative.
    pub fn validate(&self) -> Result<()> {
        non_negative("suppression window", self.suppression_window)?;
        non_negative("suppression energy", self.suppression_energy)?;
        Ok(())
    }

    /// Sets the build window.
    #[must_use]
    pub fn with_build_window(mut self, window: u64) -> Self {
        self.build_window = window;
        self
    }

    /// Selects timestamp-based event building.
    #[must_use]
    pub fn with_build_events_by_timestamp(mut self, flag: bool) -> Self {
        self.build_events_by_timestamp = flag;
        self
    }

    /// Sets the addback window.
    #[must_use]
    pub fn with_addback_window(mut self, window: u64) -> Self {
        self.addback_window = window;
        self
    }

    /// Selects a static (first-hit anchored) build window.
    #[must_use]
    pub fn with_static_window(mut self, flag: bool) -> Self {
        self.static_window = flag;
        self
    }

    /// Enables waveform fitting in the decoder.
    #[must_use]
    pub fn with_waveform_fitting(mut self, flag: bool) -> Self {
        self.waveform_fitting = flag;
        self
    }

    /// Sets cross-talk correction without the advisory.
    #[must_use]
    pub fn with_correct_cross_talk(mut self, flag: bool) -> Self {
        self.correct_cross_talk = flag;
        self
    }
}

fn non_negative(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(Error::Config(format!(
            "{name} must be a finite non-negative number, got {value}"
        )))
    }
}

impl fmt::Display for AnalysisOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "build_window: {}", self.build_window)?;
        writeln!(
            f,
            "build_events_by_timestamp: {}",
            self.build_events_by_timestamp
        )?;
        writeln!(f, "addback_window: {}", self.addback_window)?;
        writeln!(f, "suppression_window: {}", self.suppression_window)?;
        writeln!(f, "suppression_energy: {}", self.suppression_energy)?;
        writeln!(f, "static_window: {}", self.static_window)?;
        writeln!(f, "waveform_fitting: {}", self.waveform_fitting)?;
        writeln!(f, "correct_cross_talk: {}", self.correct_cross_talk)
    }
}
