//! Input ingestion for the CDR reconciliation engine
//!
//! This crate turns caller-supplied files into canonical CDR rows:
//!
//! - `decode` dispatches on the declared file extension (csv, xlsx, xls, zip)
//!   and yields an ordered stream of untyped row records
//! - `cell` models the dynamic cell values the decoders produce
//! - `normalize` holds the four pure normalization functions and the
//!   row canonicalization that applies a column mapping

pub mod cell;
pub mod decode;
pub mod normalize;

pub use cell::CellValue;
pub use decode::{decode, FileFormat, RowIter, RowRecord};
pub use normalize::{
    canonicalize, normalize_duration, normalize_phone, normalize_rate, normalize_timestamp,
};
