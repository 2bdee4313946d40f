//! Staging layer for the CDR reconciliation engine
//!
//! This crate provides job-scoped scratch resources and the embedded SQL
//! staging store both sides of a job are loaded into. It includes:
//!
//! - `ScratchSpace`: a per-job scratch directory keyed by the job UUID,
//!   deleted on every exit path
//! - `StagingStore`: a SQLite-backed store with bulk insert, post-load
//!   indexes, match-id tables, lazy cursors, and the SQL aggregates the
//!   summary is built from

pub mod scratch;
pub mod staging;

pub use scratch::ScratchSpace;
pub use staging::{CandidatePair, HungExemplar, Side, SideTotals, StagedRow, StagingStore};

// Re-export commonly used types
pub use recon_core::{ReconError, ReconResult};
