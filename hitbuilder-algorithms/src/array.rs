//! Detector-array variants.
//!
//! Each array type implements [`DetectorArray`]: how its fragments decode,
//! which channels are neighbours for addback, and where its detectors sit.
//! Position tables are passed in at construction and shared via `Arc`.

use crate::builder::EventBuilder;
use crate::decoder::ChannelHitDecoder;
use hitbuilder_core::{
    validate_distance, AnalysisOptions, ArrayKind, ChannelAddress, ChannelInfo, ChannelMap,
    DetectorHit, Error, PositionTable, RawFragment, Result, Vec3,
};
use std::sync::Arc;

/// Capabilities shared by all detector arrays.
pub trait DetectorArray: Send + Sync {
    /// Array identity tag.
    fn kind(&self) -> ArrayKind;

    /// Decoder used for this array's fragments.
    fn decoder(&self) -> &ChannelHitDecoder;

    /// Whether hits on `a` and `b` may be summed by addback.
    fn are_neighbours(&self, a: ChannelAddress, b: ChannelAddress) -> bool;

    /// Position of a channel, optionally rescaled to `distance`.
    ///
    /// # Errors
    /// Returns [`Error::PositionOutOfRange`] for addresses outside the table.
    fn position(&self, address: ChannelAddress, distance: Option<f64>) -> Result<Vec3>;

    /// Decodes one fragment of this array.
    fn decode(
        &self,
        fragment: &RawFragment,
        channel: Option<&ChannelInfo>,
        options: &AnalysisOptions,
    ) -> DetectorHit {
        self.decoder().decode(fragment, channel, options)
    }

    /// Position of a decoded hit.
    ///
    /// # Errors
    /// Returns [`Error::UnknownChannel`] for hits without an array address.
    fn hit_position(&self, hit: &DetectorHit, distance: Option<f64>) -> Result<Vec3> {
        let address = hit.address().ok_or(Error::UnknownChannel(hit.channel()))?;
        self.position(address, distance)
    }

    /// Starts correlating a hit stream of this array.
    fn event_builder<'a>(
        &'a self,
        channels: &'a ChannelMap,
        options: &'a AnalysisOptions,
    ) -> EventBuilder<'a>
    where
        Self: Sized,
    {
        EventBuilder::new(self, channels, options)
    }
}

/// Plastic scintillator paddle array.
///
/// Paddles are numbered around the array; consecutive numbers are adjacent.
pub struct Sceptar {
    positions: Arc<PositionTable>,
    decoder: ChannelHitDecoder,
}

impl Sceptar {
    /// Number of paddle slots (paddles are numbered from 1).
    pub const PADDLES: usize = 21;

    /// Creates the array with the default decoder.
    #[must_use]
    pub fn new(positions: Arc<PositionTable>) -> Self {
        Self {
            positions,
            decoder: ChannelHitDecoder::default(),
        }
    }

    /// Replaces the decoder.
    #[must_use]
    pub fn with_decoder(mut self, decoder: ChannelHitDecoder) -> Self {
        self.decoder = decoder;
        self
    }
}

impl DetectorArray for Sceptar {
    fn kind(&self) -> ArrayKind {
        ArrayKind::Sceptar
    }

    fn decoder(&self) -> &ChannelHitDecoder {
        &self.decoder
    }

    fn are_neighbours(&self, a: ChannelAddress, b: ChannelAddress) -> bool {
        a.detector.abs_diff(b.detector) <= 1
    }

    fn position(&self, address: ChannelAddress, distance: Option<f64>) -> Result<Vec3> {
        self.positions
            .position(usize::from(address.detector), 0, distance)
    }
}

/// Neutron detector array.
///
/// The position table holds one row per detector and one column per array
/// layout; a hit's segment selects the layout. Positions are reported at
/// `default_distance` unless a distance is given.
pub struct Descant {
    positions: Arc<PositionTable>,
    decoder: ChannelHitDecoder,
    default_distance: f64,
    neighbour_distance: f64,
}

impl Descant {
    /// Number of detectors in the full array.
    pub const DETECTORS: usize = 70;
    /// Number of array layouts (sub-positions per detector).
    pub const LAYOUTS: usize = 2;
    /// Nominal target-to-detector distance in millimetres.
    pub const DEFAULT_DISTANCE: f64 = 222.0;

    /// Creates the array at the nominal distance with same-detector addback.
    #[must_use]
    pub fn new(positions: Arc<PositionTable>) -> Self {
        Self {
            positions,
            decoder: ChannelHitDecoder::default(),
            default_distance: Self::DEFAULT_DISTANCE,
            neighbour_distance: 0.0,
        }
    }

    /// Replaces the decoder.
    #[must_use]
    pub fn with_decoder(mut self, decoder: ChannelHitDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    /// Distance used when no explicit distance is requested.
    ///
    /// # Errors
    /// Returns [`Error::Config`] for a negative or non-finite distance.
    pub fn with_default_distance(mut self, distance: f64) -> Result<Self> {
        self.default_distance = validate_distance(distance)?;
        Ok(self)
    }

    /// Largest separation (at the default distance) for two detectors to
    /// count as neighbours. Zero restricts addback to the same detector.
    #[must_use]
    pub fn with_neighbour_distance(mut self, distance: f64) -> Self {
        self.neighbour_distance = distance;
        self
    }
}

impl DetectorArray for Descant {
    fn kind(&self) -> ArrayKind {
        ArrayKind::Descant
    }

    fn decoder(&self) -> &ChannelHitDecoder {
        &self.decoder
    }

    fn are_neighbours(&self, a: ChannelAddress, b: ChannelAddress) -> bool {
        if a.detector == b.detector {
            return true;
        }
        match (self.position(a, None), self.position(b, None)) {
            (Ok(pa), Ok(pb)) => (pa - pb).magnitude() <= self.neighbour_distance,
            _ => false,
        }
    }

    fn position(&self, address: ChannelAddress, distance: Option<f64>) -> Result<Vec3> {
        self.positions.position(
            usize::from(address.detector),
            usize::from(address.segment),
            Some(distance.unwrap_or(self.default_distance)),
        )
    }
}
