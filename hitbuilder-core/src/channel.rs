//! Channel identity and calibration lookup.
//!
//! The unpacker supplies a [`ChannelInfo`] alongside each fragment. Only the
//! application of these constants lives here; producing them is done
//! elsewhere.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Where a channel sits in its array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelAddress {
    /// Detector number within the array.
    pub detector: u16,
    /// Segment, crystal or layout index within the detector.
    pub segment: u16,
}

impl ChannelAddress {
    #[inline]
    #[must_use]
    pub fn new(detector: u16, segment: u16) -> Self {
        Self { detector, segment }
    }
}

/// What a channel's signal is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelRole {
    /// Regular detector signal, kept as a hit.
    #[default]
    Detector,
    /// Anti-coincidence shield signal used only to veto hits.
    Veto,
}

/// Identity and calibration of a single channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Digitizer channel id.
    pub channel: u32,
    /// Position in the array.
    pub address: ChannelAddress,
    /// Signal role.
    #[serde(default)]
    pub role: ChannelRole,
    /// Energy polynomial coefficients, constant term first.
    #[serde(default)]
    pub energy_coefficients: Vec<f64>,
    /// Offset added to raw timestamps.
    #[serde(default)]
    pub time_offset: i64,
    /// Multiplicative cross-talk correction factor.
    #[serde(default = "unit_factor")]
    pub cross_talk_factor: f64,
}

fn unit_factor() -> f64 {
    1.0
}

impl ChannelInfo {
    /// Creates an uncalibrated detector channel.
    #[must_use]
    pub fn new(channel: u32, address: ChannelAddress) -> Self {
        Self {
            channel,
            address,
            role: ChannelRole::Detector,
            energy_coefficients: Vec::new(),
            time_offset: 0,
            cross_talk_factor: 1.0,
        }
    }

    /// Sets the channel role.
    #[must_use]
    pub fn with_role(mut self, role: ChannelRole) -> Self {
        self.role = role;
        self
    }

    /// Sets the energy calibration polynomial.
    #[must_use]
    pub fn with_energy_coefficients(mut self, coefficients: Vec<f64>) -> Self {
        self.energy_coefficients = coefficients;
        self
    }

    /// Sets the timestamp offset.
    #[must_use]
    pub fn with_time_offset(mut self, offset: i64) -> Self {
        self.time_offset = offset;
        self
    }

    /// Sets the cross-talk correction factor.
    #[must_use]
    pub fn with_cross_talk_factor(mut self, factor: f64) -> Self {
        self.cross_talk_factor = factor;
        self
    }

    /// Calibrated energy for a raw charge. Uncalibrated channels pass the
    /// charge through.
    #[must_use]
    pub fn calibrate_energy(&self, charge: f64) -> f64 {
        if self.energy_coefficients.is_empty() {
            return charge;
        }
        self.energy_coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * charge + c)
    }

    /// Calibrated timestamp, saturating at the ends of the range.
    #[must_use]
    pub fn calibrate_timestamp(&self, timestamp: u64) -> u64 {
        timestamp.saturating_add_signed(self.time_offset)
    }
}

/// Lookup from channel id to [`ChannelInfo`].
#[derive(Debug, Clone, Default)]
pub struct ChannelMap {
    channels: HashMap<u32, ChannelInfo>,
}

impl ChannelMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a channel.
    pub fn insert(&mut self, info: ChannelInfo) {
        self.channels.insert(info.channel, info);
    }

    /// Looks up a channel.
    #[must_use]
    pub fn get(&self, channel: u32) -> Option<&ChannelInfo> {
        self.channels.get(&channel)
    }

    /// Looks up a channel, reporting unknown ids as an error.
    ///
    /// # Errors
    /// Returns [`Error::UnknownChannel`] if the id is not mapped.
    pub fn require(&self, channel: u32) -> Result<&ChannelInfo> {
        self.get(channel).ok_or(Error::UnknownChannel(channel))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Loads a JSON list of channel records.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let records: Vec<ChannelInfo> = serde_json::from_reader(reader)?;
        Ok(records.into_iter().collect())
    }

    /// Loads a JSON list of channel records from a string.
    ///
    /// # Errors
    /// Returns an error if the string cannot be parsed.
    pub fn from_json(json: &str) -> Result<Self> {
        let records: Vec<ChannelInfo> = serde_json::from_str(json)?;
        Ok(records.into_iter().collect())
    }
}

impl FromIterator<ChannelInfo> for ChannelMap {
    fn from_iter<I: IntoIterator<Item = ChannelInfo>>(iter: I) -> Self {
        let mut map = Self::new();
        for info in iter {
            map.insert(info);
        }
        map
    }
}
