//! Domain models for the reconciliation engine
//!
//! This module contains all the core domain models shared across the
//! ingest, staging, and matching layers.

pub mod discrepancy;
pub mod job;
pub mod mapping;
pub mod row;
pub mod summary;

pub use discrepancy::{Discrepancy, DiscrepancyType};
pub use job::{JobInput, JobOutput};
pub use mapping::{CanonicalField, ColumnMapping};
pub use row::CanonicalRow;
pub use summary::ReconSummary;
