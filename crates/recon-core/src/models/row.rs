//! Canonical CDR row model
//!
//! One normalized call record, identical in shape for both sides of a job.
//! Rows are created at ingest, never mutated, and dropped with the job.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A normalized call record ready for staging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalRow {
    /// Calling party number, ASCII digits only (possibly empty)
    pub a_number: String,

    /// Called party number, ASCII digits only (possibly empty)
    pub b_number: String,

    /// Call seize instant as Unix epoch seconds (None if unparseable)
    pub seize_time: Option<i64>,

    /// Answer instant, only populated when the caller mapped the column
    pub answer_time: Option<i64>,

    /// End instant, only populated when the caller mapped the column
    pub end_time: Option<i64>,

    /// Billed duration in seconds, never negative
    pub billed_duration: i64,

    /// Per-minute rate, zero when unmapped or unparseable
    pub rate: Decimal,

    /// Location Routing Number, ASCII digits only (possibly empty)
    pub lrn: String,

    /// 0-based index into the source data rows (headers excluded)
    pub raw_index: i64,
}
