//! Decoded detector hits.
//!
//! A [`DetectorHit`] is split into the fields that are persisted with the
//! event ([`HitCore`]) and quantities derived during analysis
//! ([`HitTransients`]). Clearing the transients never touches the core.

use crate::channel::{ChannelAddress, ChannelRole};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of a waveform fit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WaveformFit {
    /// Pulse amplitude above baseline (ADC units).
    pub amplitude: f64,
    /// Leading-edge time in samples from the start of the trace.
    pub time: f64,
    /// 10%-90% rise time in samples.
    pub rise_time: f64,
    /// Baseline estimate (ADC units).
    pub baseline: f64,
}

/// Persisted part of a hit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitCore {
    /// Digitizer channel id.
    pub channel: u32,
    /// Array address; `None` for channels missing from the channel map.
    pub address: Option<ChannelAddress>,
    /// Signal role of the channel.
    pub role: ChannelRole,
    /// Calibrated energy.
    pub energy: f64,
    /// Calibrated timestamp.
    pub timestamp: u64,
    /// Raw charge the energy was derived from.
    pub charge: f64,
}

/// Derived, non-persisted part of a hit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HitTransients {
    /// Refined amplitude/timing from the waveform.
    pub fit: Option<WaveformFit>,
    /// Energy after cross-talk correction.
    pub corrected_energy: Option<f64>,
    /// Number of additional hits summed into this one by addback.
    pub merged: u16,
}

/// A decoded hit.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorHit {
    core: HitCore,
    transients: HitTransients,
}

impl DetectorHit {
    /// Creates a hit with empty transients.
    #[must_use]
    pub fn new(core: HitCore) -> Self {
        Self {
            core,
            transients: HitTransients::default(),
        }
    }

    /// Creates a detector-role hit on a known address.
    #[must_use]
    pub fn at(channel: u32, address: ChannelAddress, energy: f64, timestamp: u64) -> Self {
        Self::new(HitCore {
            channel,
            address: Some(address),
            role: ChannelRole::Detector,
            energy,
            timestamp,
            charge: energy,
        })
    }

    #[inline]
    #[must_use]
    pub fn core(&self) -> &HitCore {
        &self.core
    }

    #[inline]
    #[must_use]
    pub fn transients(&self) -> &HitTransients {
        &self.transients
    }

    #[inline]
    pub fn transients_mut(&mut self) -> &mut HitTransients {
        &mut self.transients
    }

    #[inline]
    #[must_use]
    pub fn channel(&self) -> u32 {
        self.core.channel
    }

    #[inline]
    #[must_use]
    pub fn address(&self) -> Option<ChannelAddress> {
        self.core.address
    }

    #[inline]
    #[must_use]
    pub fn timestamp(&self) -> u64 {
        self.core.timestamp
    }

    #[inline]
    #[must_use]
    pub fn is_veto(&self) -> bool {
        self.core.role == ChannelRole::Veto
    }

    /// Persisted (uncorrected) energy.
    #[inline]
    #[must_use]
    pub fn raw_energy(&self) -> f64 {
        self.core.energy
    }

    /// Energy used for analysis: the cross-talk corrected value when one has
    /// been computed, otherwise the persisted energy.
    #[inline]
    #[must_use]
    pub fn energy(&self) -> f64 {
        self.transients.corrected_energy.unwrap_or(self.core.energy)
    }

    /// Drops every derived quantity, keeping the persisted core intact.
    pub fn clear_transients(&mut self) {
        self.transients = HitTransients::default();
    }

    /// Sums `other` into this hit.
    ///
    /// Energies add, the earlier timestamp wins together with its channel and
    /// address. A corrected energy is kept if either side has one.
    pub fn absorb(&mut self, other: &DetectorHit) {
        let corrected = match (
            self.transients.corrected_energy,
            other.transients.corrected_energy,
        ) {
            (None, None) => None,
            _ => Some(self.energy() + other.energy()),
        };
        let energy = self.core.energy + other.core.energy;
        let charge = self.core.charge + other.core.charge;
        if other.core.timestamp < self.core.timestamp {
            self.core.timestamp = other.core.timestamp;
            self.core.channel = other.core.channel;
            self.core.address = other.core.address;
            self.transients.fit = other.transients.fit;
        }
        self.core.energy = energy;
        self.core.charge = charge;
        self.transients.corrected_energy = corrected;
        self.transients.merged = self
            .transients
            .merged
            .saturating_add(other.transients.merged)
            .saturating_add(1);
    }
}

impl fmt::Display for DetectorHit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "channel {}", self.core.channel)?;
        match self.core.address {
            Some(a) => write!(f, " (det {} seg {})", a.detector, a.segment)?,
            None => f.write_str(" (unmapped)")?,
        }
        write!(
            f,
            " energy {:.3} time {}",
            self.energy(),
            self.core.timestamp
        )?;
        if self.transients.merged > 0 {
            write!(f, " addback +{}", self.transients.merged)?;
        }
        Ok(())
    }
}
