//! hitbuilder-core: Core data model for detector hit building.
//!
//! This crate provides the value types shared by the decoder and the event
//! builder (fragments, hits, events), the run-level [`AnalysisOptions`],
//! channel calibration lookup and the static detector position table.
//!

pub mod channel;
pub mod error;
pub mod event;
pub mod fragment;
pub mod geometry;
pub mod hit;
pub mod options;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use channel::{ChannelAddress, ChannelInfo, ChannelMap, ChannelRole};
pub use error::{Error, Result};
pub use event::{DetectorEvent, MAX_EVENT_HITS};
pub use fragment::{ArrayKind, RawFragment};
pub use geometry::{validate_distance, PositionTable, Vec3};
pub use hit::{DetectorHit, HitCore, HitTransients, WaveformFit};
pub use options::AnalysisOptions;
