//! hitbuilder-io: Output containers for hitbuilder runs.
//!
//! This crate provides keyed containers (JSON documents, or HDF5 files with
//! the `hdf5` feature), a workspace tracking the active container, and
//! persistence of the run's [`hitbuilder_core::AnalysisOptions`].
//!

pub mod container;
mod error;
#[cfg(feature = "hdf5")]
mod hdf5;
mod persistence;
pub mod workspace;

pub use container::{Backend, Container, Entry, OpenMode};
pub use error::{Error, Result};
pub use persistence::OptionsPersistence;
pub use workspace::{ActiveGuard, ContainerHandle, Workspace};
