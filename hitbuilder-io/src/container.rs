//! Keyed output containers.
//!
//! A container is a file holding an ordered list of named entries. Each
//! entry records the class and schema version of the object it stores and
//! the object's serialized payload. Writes go straight through to disk.
//!
//! Paths ending in `.h5`, `.hdf5` or `.nxs` use the HDF5 backend (feature
//! `hdf5`); everything else is a JSON document.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Container file format version.
pub const FORMAT_VERSION: &str = "1.0";

/// How a container is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing file, no writes.
    Read,
    /// Existing file (created if missing), writable.
    Update,
    /// New empty file, replacing any existing one.
    Create,
}

impl OpenMode {
    #[must_use]
    pub fn is_writable(self) -> bool {
        !matches!(self, Self::Read)
    }
}

impl std::fmt::Display for OpenMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read => write!(f, "READ"),
            Self::Update => write!(f, "UPDATE"),
            Self::Create => write!(f, "CREATE"),
        }
    }
}

/// One stored object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub key: String,
    pub class: String,
    pub version: u32,
    pub payload: String,
}

impl Entry {
    /// Deserializes the payload.
    ///
    /// # Errors
    /// Returns an error if the payload is not a valid `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_str(&self.payload)?)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct ContainerDocument {
    format_version: String,
    entries: Vec<Entry>,
}

/// Storage format of a container file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Json,
    #[cfg(feature = "hdf5")]
    Hdf5,
}

impl Backend {
    /// Picks the backend from the file extension.
    ///
    /// # Errors
    /// Returns [`Error::InvalidFormat`] for HDF5 paths when the `hdf5`
    /// feature is disabled.
    pub fn for_path(path: &Path) -> Result<Self> {
        let is_hdf5 = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| matches!(e.to_ascii_lowercase().as_str(), "h5" | "hdf5" | "nxs"));

        if !is_hdf5 {
            return Ok(Self::Json);
        }
        #[cfg(feature = "hdf5")]
        {
            Ok(Self::Hdf5)
        }
        #[cfg(not(feature = "hdf5"))]
        {
            Err(Error::InvalidFormat(format!(
                "{} needs the hdf5 feature",
                path.display()
            )))
        }
    }

    fn load(self, path: &Path) -> Result<Vec<Entry>> {
        match self {
            Self::Json => {
                let reader = BufReader::new(File::open(path)?);
                let document: ContainerDocument = serde_json::from_reader(reader)?;
                if document.format_version != FORMAT_VERSION {
                    return Err(Error::InvalidFormat(format!(
                        "unsupported container format {}",
                        document.format_version
                    )));
                }
                Ok(document.entries)
            }
            #[cfg(feature = "hdf5")]
            Self::Hdf5 => crate::hdf5::load_entries(path),
        }
    }

    fn store(self, path: &Path, entries: &[Entry]) -> Result<()> {
        match self {
            Self::Json => {
                let mut writer = BufWriter::new(File::create(path)?);
                let document = ContainerDocument {
                    format_version: FORMAT_VERSION.to_string(),
                    entries: entries.to_vec(),
                };
                serde_json::to_writer_pretty(&mut writer, &document)?;
                writer.flush()?;
                Ok(())
            }
            #[cfg(feature = "hdf5")]
            Self::Hdf5 => crate::hdf5::store_entries(path, entries),
        }
    }
}

/// An open container.
#[derive(Debug)]
pub struct Container {
    path: PathBuf,
    mode: OpenMode,
    backend: Backend,
    entries: Vec<Entry>,
}

impl Container {
    /// Opens the container at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read (or, for writable modes,
    /// created) or is not a valid container.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let backend = Backend::for_path(&path)?;
        let entries = match mode {
            OpenMode::Read => backend.load(&path)?,
            OpenMode::Update if path.exists() => backend.load(&path)?,
            OpenMode::Update | OpenMode::Create => {
                backend.store(&path, &[])?;
                Vec::new()
            }
        };
        Ok(Self {
            path,
            mode,
            backend,
            entries,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    #[must_use]
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Entries in write order.
    #[must_use]
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.key == key)
    }

    /// First entry whose declared class is `class`.
    #[must_use]
    pub fn find_class(&self, class: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.class == class)
    }

    /// Stores `object` under `key`.
    ///
    /// With `overwrite` an existing entry of the same key is replaced in
    /// place; without it an existing key is an error.
    ///
    /// # Errors
    /// Returns [`Error::ReadOnly`] on a read-only container,
    /// [`Error::KeyExists`] when the key is taken and `overwrite` is false,
    /// or an I/O error if the file cannot be written.
    pub fn write_object<T: Serialize>(
        &mut self,
        key: &str,
        class: &str,
        version: u32,
        object: &T,
        overwrite: bool,
    ) -> Result<()> {
        if !self.mode.is_writable() {
            return Err(Error::ReadOnly(self.path.clone()));
        }
        let entry = Entry {
            key: key.to_string(),
            class: class.to_string(),
            version,
            payload: serde_json::to_string(object)?,
        };

        let mut entries = self.entries.clone();
        match entries.iter_mut().find(|e| e.key == key) {
            Some(_) if !overwrite => return Err(Error::KeyExists(key.to_string())),
            Some(existing) => *existing = entry,
            None => entries.push(entry),
        }
        self.backend.store(&self.path, &entries)?;
        self.entries = entries;
        Ok(())
    }

    /// Switches the open mode, reloading the contents from disk.
    ///
    /// Reopening with [`OpenMode::Create`] truncates the file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be reloaded. The container keeps
    /// its previous mode in that case.
    pub fn reopen(&mut self, mode: OpenMode) -> Result<()> {
        let entries = match mode {
            OpenMode::Create => {
                self.backend.store(&self.path, &[])?;
                Vec::new()
            }
            OpenMode::Read | OpenMode::Update => self.backend.load(&self.path)?,
        };
        log::info!(
            "reopened {} in {mode} mode (was {})",
            self.path.display(),
            self.mode
        );
        self.entries = entries;
        self.mode = mode;
        Ok(())
    }
}
