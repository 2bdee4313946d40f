//! Input decoding
//!
//! `decode` turns a file into an ordered stream of row records. Format
//! dispatch uses the declared file name, not the storage path: uploads are
//! commonly stored under a UUID while the original name carries the
//! extension.

mod archive;
mod delimited;
mod spreadsheet;

use crate::cell::CellValue;
use recon_core::{ReconError, ReconResult};
use std::collections::HashMap;
use std::path::Path;
use tracing::debug;

/// One decoded data row: 0-based index plus cells keyed by header
#[derive(Debug, Clone)]
pub struct RowRecord {
    pub index: i64,
    pub cells: HashMap<String, CellValue>,
}

impl RowRecord {
    /// Cell under the given header, Null when the header or cell is absent
    pub fn cell(&self, header: &str) -> &CellValue {
        self.cells.get(header).unwrap_or(&CellValue::Null)
    }
}

/// Ordered stream of decoded rows
pub type RowIter = Box<dyn Iterator<Item = ReconResult<RowRecord>> + Send>;

/// Supported input formats, dispatched from the declared extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Xlsx,
    Xls,
    Zip,
}

impl FileFormat {
    /// Parse a declared file name into a format
    pub fn from_declared_name(name: &str) -> ReconResult<FileFormat> {
        let extension = name
            .rsplit('.')
            .next()
            .filter(|ext| !ext.is_empty() && ext.len() < name.len())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" => Ok(FileFormat::Xlsx),
            "xls" => Ok(FileFormat::Xls),
            "zip" => Ok(FileFormat::Zip),
            _ => Err(ReconError::UnsupportedExtension(name.to_string())),
        }
    }
}

/// Decode a file into a row stream.
///
/// `scratch_dir` receives any intermediate files (archive extraction); the
/// decoder deletes them when the stream is dropped, including on error
/// paths.
pub fn decode(path: &Path, declared_name: &str, scratch_dir: &Path) -> ReconResult<RowIter> {
    let format = FileFormat::from_declared_name(declared_name)?;
    debug!(
        "Decoding {} as {:?} (declared name {})",
        path.display(),
        format,
        declared_name
    );

    match format {
        FileFormat::Csv => delimited::decode(path),
        FileFormat::Xlsx | FileFormat::Xls => spreadsheet::decode(path),
        FileFormat::Zip => archive::decode(path, scratch_dir),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_dispatch() {
        assert_eq!(
            FileFormat::from_declared_name("export.CSV").unwrap(),
            FileFormat::Csv
        );
        assert_eq!(
            FileFormat::from_declared_name("march.xlsx").unwrap(),
            FileFormat::Xlsx
        );
        assert_eq!(
            FileFormat::from_declared_name("upload.zip").unwrap(),
            FileFormat::Zip
        );
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let err = FileFormat::from_declared_name("notes.pdf").unwrap_err();
        assert_eq!(err.error_code(), "input_error");
        assert!(FileFormat::from_declared_name("no_extension").is_err());
    }
}
