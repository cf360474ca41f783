//! I/O error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for container operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Container and persistence errors.
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Container document or payload could not be (de)serialized.
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// HDF5 library error.
    #[cfg(feature = "hdf5")]
    #[error("HDF5 error: {0}")]
    Hdf5(#[from] hdf5::Error),

    /// Write attempted on a container opened read-only.
    #[error("container {} is open read-only", .0.display())]
    ReadOnly(PathBuf),

    /// Key already present and overwrite not requested.
    #[error("key {0:?} already exists")]
    KeyExists(String),

    /// No entry with the requested class.
    #[error("no {class} entry in {}", .path.display())]
    EntryNotFound { class: String, path: PathBuf },

    /// No target container given and none active.
    #[error("no container provided and no container active")]
    NoContainer,

    /// Handle does not refer to an open container.
    #[error("container handle {0} is not open")]
    UnknownHandle(usize),

    /// Invalid file format.
    #[error("invalid file format: {0}")]
    InvalidFormat(String),

    /// Core library error.
    #[error("core error: {0}")]
    CoreError(#[from] hitbuilder_core::Error),
}
