//! CDR Reconciliation Core Library
//!
//! This crate provides the foundational types and error handling for the
//! reconciliation engine. It includes:
//!
//! - Domain models (canonical rows, column mappings, discrepancies, summaries)
//! - Unified error handling with the public error-kind mapping
//! - Engine configuration

pub mod config;
pub mod error;
pub mod models;

pub use config::EngineConfig;
pub use error::{ErrorKind, ReconError};

/// Result type alias using ReconError
pub type ReconResult<T> = Result<T, ReconError>;
