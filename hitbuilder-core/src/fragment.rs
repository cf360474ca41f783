//! Raw per-channel fragments as delivered by the unpacker.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity tag of the detector array a fragment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrayKind {
    /// Plastic scintillator paddle array.
    Sceptar,
    /// Deuterated scintillator neutron array.
    Descant,
}

impl fmt::Display for ArrayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayKind::Sceptar => f.write_str("SCEPTAR"),
            ArrayKind::Descant => f.write_str("DESCANT"),
        }
    }
}

/// One raw timestamped reading from a single detector channel.
///
/// Timestamps are non-decreasing within a channel but not across channels.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFragment {
    /// Digitizer channel id.
    pub channel: u32,
    /// Raw timestamp in digitizer ticks.
    pub timestamp: u64,
    /// Integrated charge (uncalibrated energy proxy).
    pub charge: f64,
    /// Waveform samples, if the digitizer recorded them.
    pub waveform: Option<Vec<i16>>,
    /// Array this fragment was read from.
    pub array: ArrayKind,
}

impl RawFragment {
    /// Creates a fragment without waveform samples.
    #[must_use]
    pub fn new(array: ArrayKind, channel: u32, timestamp: u64, charge: f64) -> Self {
        Self {
            channel,
            timestamp,
            charge,
            waveform: None,
            array,
        }
    }

    /// Attaches waveform samples.
    #[must_use]
    pub fn with_waveform(mut self, samples: Vec<i16>) -> Self {
        self.waveform = Some(samples);
        self
    }
}
