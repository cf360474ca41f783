//! Detector geometry: 3D points and the static position table.
//!
//! A [`PositionTable`] is populated once at process start (from a geometry
//! document or programmatically) and is read-only afterwards. Arrays share it
//! through an `Arc`, so lookups never need a lock.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// A point (or direction) in detector space, in millimetres.
///
/// Serializes as `[x, y, z]`.
pub type Vec3 = nalgebra::Vector3<f64>;

/// Checks a target-to-detector distance.
///
/// # Errors
/// Returns [`Error::Config`] for negative or non-finite distances.
pub fn validate_distance(distance: f64) -> Result<f64> {
    if distance.is_finite() && distance >= 0.0 {
        Ok(distance)
    } else {
        Err(Error::Config(format!(
            "distance must be finite and non-negative, got {distance}"
        )))
    }
}

/// Precomputed positions indexed by `[detector][sub_position]`.
///
/// Every row has the same number of sub-positions; the constructor rejects
/// ragged input so that lookups can report a single table shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<Vec3>>", into = "Vec<Vec<Vec3>>")]
pub struct PositionTable {
    rows: Vec<Vec<Vec3>>,
    subs: usize,
}

impl PositionTable {
    /// Builds a table from one row of sub-positions per detector.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the rows differ in length.
    pub fn new(rows: Vec<Vec<Vec3>>) -> Result<Self> {
        let subs = rows.first().map_or(0, Vec::len);
        if let Some((detector, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != subs) {
            return Err(Error::Config(format!(
                "position table row {detector} has {} sub-positions, expected {subs}",
                row.len()
            )));
        }
        Ok(Self { rows, subs })
    }

    /// Builds a table with a single sub-position per detector.
    #[must_use]
    pub fn from_points(points: Vec<Vec3>) -> Self {
        Self {
            subs: usize::from(!points.is_empty()),
            rows: points.into_iter().map(|p| vec![p]).collect(),
        }
    }

    /// Loads a table from a JSON geometry document (`[[[x, y, z], ...], ...]`).
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or is not a valid table.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Loads a table from a JSON string.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid table.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Number of detectors in the table.
    #[must_use]
    pub fn detectors(&self) -> usize {
        self.rows.len()
    }

    /// Number of sub-positions per detector.
    #[must_use]
    pub fn sub_positions(&self) -> usize {
        self.subs
    }

    /// Looks up a position, optionally rescaled to `distance` from the origin.
    ///
    /// A zero vector has no direction and is returned unchanged by a rescale.
    ///
    /// # Errors
    /// Returns [`Error::PositionOutOfRange`] for indices outside the table and
    /// [`Error::Config`] for a negative or non-finite `distance`.
    pub fn position(&self, detector: usize, sub: usize, distance: Option<f64>) -> Result<Vec3> {
        let distance = distance.map(validate_distance).transpose()?;
        let point = self
            .rows
            .get(detector)
            .and_then(|row| row.get(sub))
            .ok_or(Error::PositionOutOfRange {
                detector,
                sub,
                detectors: self.rows.len(),
                subs: self.subs,
            })?;
        Ok(match distance {
            Some(d) => point.try_normalize(0.0).map_or(*point, |unit| unit * d),
            None => *point,
        })
    }
}

impl TryFrom<Vec<Vec<Vec3>>> for PositionTable {
    type Error = Error;

    fn try_from(rows: Vec<Vec<Vec3>>) -> Result<Self> {
        Self::new(rows)
    }
}

impl From<PositionTable> for Vec<Vec<Vec3>> {
    fn from(table: PositionTable) -> Self {
        table.rows
    }
}
