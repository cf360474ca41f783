//! hitbuilder-algorithms: Hit decoding and event building.
//!
//! This crate turns a detector array's raw fragments into events:
//! - **Decoding** - calibration and optional waveform fitting per fragment
//! - **Event building** - grouping by trigger or by timestamp window
//! - **Addback** - summing neighbouring hits within a window
//! - **Suppression** - vetoing low-energy hits coincident with a veto channel
//!
#![warn(missing_docs)]

pub mod array;
mod builder;
pub mod coincidence;
mod decoder;
mod error;
mod processing;

pub use array::{Descant, DetectorArray, Sceptar};
pub use builder::{BuildStatistics, EventBuilder};
pub use coincidence::{addback, correct_cross_talk, suppress};
pub use decoder::{ChannelHitDecoder, PulseShapeConfig, PulseShapeFitter, WaveformFitter};
pub use error::FitError;
pub use processing::{
    build_arrays_parallel, build_events, decode_and_build, ArrayStream, BuildOutput, StreamItem,
};

// Re-export the core types every caller needs alongside the algorithms
pub use hitbuilder_core::{AnalysisOptions, ChannelMap, DetectorEvent, DetectorHit, RawFragment};
