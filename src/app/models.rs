//! Data models for HITRAN XSC
//!
//! This module defines the core data structures used throughout the library:
//! molecule identifiers, cross-section metadata records, range bounds used by
//! queries, and the read-only molecule directory abstraction.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{MetadataError, MetadataResult};

/// HITRAN molecule identifier
///
/// Opaque and stable across sessions; values come from the HITRAN molecule
/// directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MoleculeId(pub u32);

impl From<u32> for MoleculeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for MoleculeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Metadata describing one downloadable absorption cross-section file
///
/// Records are immutable once ingested. A re-fetch replaces them wholesale,
/// never field by field. The API's `__identity__` and `__class__` tags and any
/// other unknown fields are ignored on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossSectionRecord {
    /// HITRAN cross-section id
    pub id: i64,
    /// Molecule this cross-section belongs to
    pub molecule_id: MoleculeId,
    /// Lower wavenumber bound (cm-1)
    pub numin: f64,
    /// Upper wavenumber bound (cm-1)
    pub numax: f64,
    /// Pressure (Torr)
    pub pressure: f64,
    /// Temperature (K)
    pub temperature: f64,
    /// First date the dataset is valid for
    pub valid_from: NaiveDate,
    /// Last date the dataset is valid for
    pub valid_to: NaiveDate,
    /// Name of the `.xsc` file on hitran.org
    pub filename: String,
    /// Spectral resolution
    pub resolution: f64,
    /// Units of `resolution` (e.g. "cm-1")
    pub resolution_units: String,
    /// Broadening gas (e.g. "air")
    pub broadener: String,
    /// HITRAN source id
    pub source_id: i64,
    /// Peak cross-section value
    pub sigma_max: f64,
    /// Number of points in the file
    pub npnts: u64,
}

impl CrossSectionRecord {
    /// Validate a single JSON object into a record
    ///
    /// `index` is the position of the value inside its batch and is reported
    /// back in [`MetadataError::MalformedRecord`].
    pub fn from_value(index: usize, value: &Value) -> MetadataResult<Self> {
        if !value.is_object() {
            return Err(MetadataError::MalformedRecord {
                index,
                reason: format!("expected an object, found {}", json_kind(value)),
            });
        }

        Self::deserialize(value).map_err(|e| MetadataError::MalformedRecord {
            index,
            reason: e.to_string(),
        })
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A pair of bounds used by range queries
///
/// Queries compare against these bounds with strict inequalities, so a value
/// equal to either bound never matches. Reversed bounds are kept as given and
/// simply match nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundRange {
    pub low: f64,
    pub high: f64,
}

impl BoundRange {
    pub fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }

    /// `low < value < high`
    pub fn strictly_contains(&self, value: f64) -> bool {
        self.low < value && value < self.high
    }

    /// True when `[numin, numax]` extends strictly past both bounds
    pub fn strictly_covered_by(&self, numin: f64, numax: f64) -> bool {
        numin < self.low && numax > self.high
    }
}

impl fmt::Display for BoundRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.low, self.high)
    }
}

impl FromStr for BoundRange {
    type Err = String;

    /// Parse `"low..high"` or `"low:high"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (low, high) = s
            .split_once("..")
            .or_else(|| s.split_once(':'))
            .ok_or_else(|| format!("expected LOW..HIGH or LOW:HIGH, got '{}'", s))?;

        let parse = |part: &str| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| format!("invalid bound '{}': {}", part.trim(), e))
        };

        Ok(Self::new(parse(low)?, parse(high)?))
    }
}

/// Read-only directory of molecule display names
pub trait MoleculeDirectory: Send + Sync {
    /// Display name for a molecule, if known
    fn name(&self, id: MoleculeId) -> Option<String>;

    /// All molecule ids the directory knows about, in ascending order
    fn ids(&self) -> Vec<MoleculeId>;
}

/// Molecule directory backed by an in-memory map
#[derive(Debug, Clone, Default)]
pub struct InMemoryMoleculeDirectory {
    names: BTreeMap<MoleculeId, String>,
}

impl InMemoryMoleculeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or rename a molecule
    pub fn with_molecule(mut self, id: MoleculeId, name: impl Into<String>) -> Self {
        self.names.insert(id, name.into());
        self
    }
}

impl FromIterator<(MoleculeId, String)> for InMemoryMoleculeDirectory {
    fn from_iter<I: IntoIterator<Item = (MoleculeId, String)>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().collect(),
        }
    }
}

impl MoleculeDirectory for InMemoryMoleculeDirectory {
    fn name(&self, id: MoleculeId) -> Option<String> {
        self.names.get(&id).cloned()
    }

    fn ids(&self) -> Vec<MoleculeId> {
        self.names.keys().copied().collect()
    }
}
