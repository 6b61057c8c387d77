//! Transport record schema
//!
//! Field names follow the dashboard's English vocabulary; the legacy
//! Spanish field names and type labels are still accepted on input.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseTransportTypeError;

/// Opaque record identifier assigned by the remote system on creation.
///
/// Accepts numeric or string ids on the wire and always serializes as a
/// string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawId", into = "String")]
pub struct RecordId(pub String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

impl From<RawId> for RecordId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Number(n) => RecordId(n.to_string()),
            RawId::Text(s) => RecordId(s),
        }
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        RecordId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Closed enumeration of transport types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransportType {
    #[serde(alias = "Terrestre")]
    Land,
    #[serde(alias = "Aéreo", alias = "Aereo")]
    Air,
    #[serde(alias = "Marítimo", alias = "Maritimo")]
    Sea,
}

impl TransportType {
    pub const ALL: [TransportType; 3] = [TransportType::Land, TransportType::Air, TransportType::Sea];

    /// Canonical label, also used for text ordering.
    pub fn label(&self) -> &'static str {
        match self {
            TransportType::Land => "Land",
            TransportType::Air => "Air",
            TransportType::Sea => "Sea",
        }
    }

    fn legacy_labels(&self) -> &'static [&'static str] {
        match self {
            TransportType::Land => &["terrestre"],
            TransportType::Air => &["aéreo", "aereo"],
            TransportType::Sea => &["marítimo", "maritimo"],
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TransportType {
    type Err = ParseTransportTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        TransportType::ALL
            .into_iter()
            .find(|t| t.label().to_lowercase() == needle || t.legacy_labels().contains(&needle.as_str()))
            .ok_or_else(|| ParseTransportTypeError(s.to_string()))
    }
}

/// A persisted transport record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    #[serde(alias = "nombre")]
    pub name: String,
    /// Capacity in kilograms
    #[serde(alias = "capacidad")]
    pub capacity: f64,
    #[serde(rename = "type", alias = "tipo")]
    pub kind: TransportType,
}

/// A record that has not been created remotely yet (no id).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecord {
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "capacidad")]
    pub capacity: f64,
    #[serde(rename = "type", alias = "tipo")]
    pub kind: TransportType,
}

impl NewRecord {
    pub fn new(name: impl Into<String>, capacity: f64, kind: TransportType) -> Self {
        Self {
            name: name.into(),
            capacity,
            kind,
        }
    }

    /// Attach a server-assigned id.
    pub fn with_id(self, id: RecordId) -> Record {
        Record {
            id,
            name: self.name,
            capacity: self.capacity,
            kind: self.kind,
        }
    }
}

/// Partial update of a record. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordPatch {
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "nombre")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", alias = "capacidad")]
    pub capacity: Option<f64>,
    #[serde(
        default,
        rename = "type",
        skip_serializing_if = "Option::is_none",
        alias = "tipo"
    )]
    pub kind: Option<TransportType>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.capacity.is_none() && self.kind.is_none()
    }

    /// Merge the patch into `record` in place.
    pub fn apply(&self, record: &mut Record) {
        if let Some(name) = &self.name {
            record.name = name.clone();
        }
        if let Some(capacity) = self.capacity {
            record.capacity = capacity;
        }
        if let Some(kind) = self.kind {
            record.kind = kind;
        }
    }
}

impl From<NewRecord> for RecordPatch {
    fn from(record: NewRecord) -> Self {
        Self {
            name: Some(record.name),
            capacity: Some(record.capacity),
            kind: Some(record.kind),
        }
    }
}
