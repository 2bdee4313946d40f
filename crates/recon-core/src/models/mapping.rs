//! Column mapping model
//!
//! A mapping ties canonical CDR fields to source column headers. Each side of
//! a job carries its own mapping; the set of canonical fields is closed and
//! unknown keys are rejected at the boundary and again by the engine.

use crate::{ReconError, ReconResult};
use serde_json::Value;
use std::collections::HashMap;

/// The closed set of canonical CDR fields a source column can map to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CanonicalField {
    ANumber,
    BNumber,
    SeizeTime,
    AnswerTime,
    EndTime,
    BilledDuration,
    Rate,
    Lrn,
}

impl CanonicalField {
    /// All canonical fields, in schema order
    pub const ALL: [CanonicalField; 8] = [
        CanonicalField::ANumber,
        CanonicalField::BNumber,
        CanonicalField::SeizeTime,
        CanonicalField::AnswerTime,
        CanonicalField::EndTime,
        CanonicalField::BilledDuration,
        CanonicalField::Rate,
        CanonicalField::Lrn,
    ];

    /// Fields a mapping must supply
    pub const REQUIRED: [CanonicalField; 5] = [
        CanonicalField::ANumber,
        CanonicalField::BNumber,
        CanonicalField::SeizeTime,
        CanonicalField::BilledDuration,
        CanonicalField::Lrn,
    ];

    /// Stable key used in mapping JSON
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::ANumber => "a_number",
            CanonicalField::BNumber => "b_number",
            CanonicalField::SeizeTime => "seize_time",
            CanonicalField::AnswerTime => "answer_time",
            CanonicalField::EndTime => "end_time",
            CanonicalField::BilledDuration => "billed_duration",
            CanonicalField::Rate => "rate",
            CanonicalField::Lrn => "lrn",
        }
    }

    /// Parse a mapping JSON key
    pub fn from_key(key: &str) -> Option<CanonicalField> {
        match key {
            "a_number" => Some(CanonicalField::ANumber),
            "b_number" => Some(CanonicalField::BNumber),
            "seize_time" => Some(CanonicalField::SeizeTime),
            "answer_time" => Some(CanonicalField::AnswerTime),
            "end_time" => Some(CanonicalField::EndTime),
            "billed_duration" => Some(CanonicalField::BilledDuration),
            "rate" => Some(CanonicalField::Rate),
            "lrn" => Some(CanonicalField::Lrn),
            _ => None,
        }
    }
}

/// Mapping from canonical field to source column header for one side
#[derive(Debug, Clone, Default)]
pub struct ColumnMapping {
    columns: HashMap<CanonicalField, String>,
}

impl ColumnMapping {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign a source column to a canonical field
    pub fn set(&mut self, field: CanonicalField, column: impl Into<String>) {
        self.columns.insert(field, column.into());
    }

    /// Source column mapped to a canonical field, if any
    pub fn column(&self, field: CanonicalField) -> Option<&str> {
        self.columns.get(&field).map(String::as_str)
    }

    /// Build a mapping from a JSON object of `canonical_field: column_name`.
    ///
    /// Rejects non-object values, keys outside the canonical set, and any
    /// non-string value.
    pub fn from_json_value(value: &Value) -> ReconResult<Self> {
        let object = value.as_object().ok_or_else(|| {
            ReconError::InvalidMapping("mapping must be a JSON object".to_string())
        })?;

        let mut mapping = ColumnMapping::new();
        for (key, val) in object {
            let field = CanonicalField::from_key(key).ok_or_else(|| {
                ReconError::InvalidMapping(format!("unknown mapping key: {}", key))
            })?;
            let column = val.as_str().ok_or_else(|| {
                ReconError::InvalidMapping(format!("mapping value for {} must be a string", key))
            })?;
            mapping.set(field, column);
        }

        Ok(mapping)
    }

    /// Verify every required canonical field is mapped
    pub fn validate(&self) -> ReconResult<()> {
        for field in CanonicalField::REQUIRED {
            if !self.columns.contains_key(&field) {
                return Err(ReconError::MissingMappingField(field.as_str().to_string()));
            }
        }
        Ok(())
    }
}
