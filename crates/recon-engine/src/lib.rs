//! Reconciliation engine for two-sided CDR comparison
//!
//! This crate contains the business logic that turns two staged CDR exports
//! into a reconciliation report:
//!
//! - `billing` - 6-second increment cost arithmetic
//! - `matcher` - lazy candidate cursor with serial greedy 1-to-1 selection
//! - `classifier` - typed discrepancies for unmatched rows and matched pairs
//! - `hung` - detection of identically-durated unmatched clusters
//! - `collector` - bounded per-type top-K sample with full counts and sums
//! - `summary` - SQL-backed aggregate totals
//! - `reconcile` - the single `reconcile()` entry point
//!
//! # Architecture
//!
//! The engine is all-or-nothing: a job either returns a complete result or
//! an error, and its scratch resources are released on every exit path.
//! Matching consumes the candidate cursor lazily and selection is strictly
//! serial; everything that sums over whole sides runs as SQL in the staging
//! store.

pub mod billing;
pub mod classifier;
pub mod collector;
pub mod hung;
pub mod matcher;
pub mod reconcile;
pub mod summary;

pub use collector::BoundedCollector;
pub use reconcile::reconcile;

// Re-export commonly used types
pub use recon_core::{
    models::{JobInput, JobOutput},
    EngineConfig, ReconError, ReconResult,
};
