//! Job input and output models
//!
//! `JobInput` is everything the engine needs for one reconciliation call;
//! `JobOutput` is the complete result. Nothing is persisted between jobs.

use crate::models::{ColumnMapping, Discrepancy, ReconSummary};
use serde::Serialize;
use std::path::PathBuf;

/// Input for a single reconciliation job
#[derive(Debug, Clone)]
pub struct JobInput {
    /// Path to side A (your switch export); may be a UUID-named upload copy
    pub file_a_path: PathBuf,

    /// Original file name of side A, used for format dispatch
    pub file_a_declared_name: String,

    /// Path to side B (the provider export)
    pub file_b_path: PathBuf,

    /// Original file name of side B
    pub file_b_declared_name: String,

    /// Column mapping for side A
    pub mapping_a: ColumnMapping,

    /// Column mapping for side B
    pub mapping_b: ColumnMapping,
}

/// Complete result of a reconciliation job
#[derive(Debug, Clone, Serialize)]
pub struct JobOutput {
    /// Job UUID (also keys the scratch artifacts, deleted before return)
    pub job_id: String,

    /// Aggregate counts and dollar totals
    pub summary: ReconSummary,

    /// Bounded, cost-ranked discrepancy sample in display order
    pub discrepancies: Vec<Discrepancy>,

    /// True when the total discrepancy count exceeds the sample length
    pub has_more: bool,

    /// Full discrepancy count regardless of sampling
    pub total_discrepancy_count: i64,
}
