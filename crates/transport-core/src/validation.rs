//! Field-level validation for record drafts.
//!
//! A draft holds the raw form input; it may be invalid while the user is
//! typing. `validate_field` runs on every change so the submit action can be
//! disabled live, and `validate_all` gates submission.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use transport_gateway::{NewRecord, Record, RecordPatch, TransportType};

pub const NAME_REQUIRED: &str = "required";
pub const CAPACITY_INVALID: &str = "must be a positive number";
pub const TYPE_REQUIRED: &str = "must select a type";

/// Editable fields of a record draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Name,
    Capacity,
    Type,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Name, Field::Capacity, Field::Type];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Capacity => "capacity",
            Field::Type => "type",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw, possibly invalid, form input for a record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDraft {
    pub name: String,
    pub capacity: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl RecordDraft {
    pub fn new(name: impl Into<String>, capacity: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            capacity: capacity.into(),
            kind: kind.into(),
        }
    }

    /// Pre-fill a draft from a persisted record (edit mode).
    pub fn from_record(record: &Record) -> Self {
        Self {
            name: record.name.clone(),
            capacity: record.capacity.to_string(),
            kind: record.kind.label().to_string(),
        }
    }

    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Capacity => &self.capacity,
            Field::Type => &self.kind,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Name => self.name = value,
            Field::Capacity => self.capacity = value,
            Field::Type => self.kind = value,
        }
    }

    /// Convert into a submittable record, or return every field error.
    pub fn to_new_record(&self) -> Result<NewRecord, ValidationErrors> {
        let errors = validate_all(self);
        if !errors.is_empty() {
            return Err(errors);
        }
        match (parse_capacity(&self.capacity), self.kind.parse::<TransportType>()) {
            (Some(capacity), Ok(kind)) => Ok(NewRecord::new(self.name.trim(), capacity, kind)),
            // validate_all already rejected both of these
            _ => Err(errors),
        }
    }
}

fn capacity_ok(capacity: f64) -> bool {
    capacity.is_finite() && capacity > 0.0
}

/// Coerce raw capacity input into a finite, positive number.
pub fn parse_capacity(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|c| capacity_ok(*c))
}

/// Validate a single field value.
pub fn validate_field(field: Field, value: &str) -> Option<&'static str> {
    match field {
        Field::Name if value.trim().is_empty() => Some(NAME_REQUIRED),
        Field::Capacity if parse_capacity(value).is_none() => Some(CAPACITY_INVALID),
        Field::Type if value.parse::<TransportType>().is_err() => Some(TYPE_REQUIRED),
        _ => None,
    }
}

/// Validate every field of a draft. Submission is allowed only when the
/// returned map is empty.
pub fn validate_all(draft: &RecordDraft) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    for field in Field::ALL {
        if let Some(message) = validate_field(field, draft.get(field)) {
            errors.insert(field, message);
        }
    }
    errors
}

fn check_values(name: Option<&str>, capacity: Option<f64>) -> ValidationErrors {
    let mut errors = ValidationErrors::default();
    if name.is_some_and(|n| n.trim().is_empty()) {
        errors.insert(Field::Name, NAME_REQUIRED);
    }
    if capacity.is_some_and(|c| !capacity_ok(c)) {
        errors.insert(Field::Capacity, CAPACITY_INVALID);
    }
    errors
}

/// Check a typed record before it is sent for creation.
pub fn validate_new_record(record: &NewRecord) -> ValidationErrors {
    check_values(Some(&record.name), Some(record.capacity))
}

/// Check a stored record, e.g. one returned by a load.
pub fn validate_record(record: &Record) -> ValidationErrors {
    check_values(Some(&record.name), Some(record.capacity))
}

/// Check the fields a patch sets. Absent fields are not checked.
pub fn validate_patch(patch: &RecordPatch) -> ValidationErrors {
    check_values(patch.name.as_deref(), patch.capacity)
}

/// Map of field to error message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    errors: BTreeMap<Field, String>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: Field) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.errors.insert(field, message.into());
    }

    pub fn remove(&mut self, field: Field) {
        self.errors.remove(&field);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.errors.iter().map(|(f, m)| (*f, m.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(field, msg)| format!("{field}: {msg}")).collect();
        write!(f, "{}", parts.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}
