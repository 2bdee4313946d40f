//! Zip archive decoding
//!
//! An archive is expected to carry exactly one useful export. Directory
//! entries, macOS resource forks, and dot-files are ignored; of the
//! remaining supported entries CSV is preferred, then lexicographic order.
//! The chosen entry is extracted to the job scratch directory and decoded
//! recursively; the extracted copy is deleted when the stream is dropped.

use crate::decode::{RowIter, RowRecord};
use recon_core::{ReconError, ReconResult};
use std::fs::File;
use std::io;
use std::path::Path;
use tempfile::TempPath;
use tracing::debug;

const SUPPORTED_ENTRY_EXTENSIONS: [&str; 3] = ["csv", "xlsx", "xls"];

pub fn decode(path: &Path, scratch_dir: &Path) -> ReconResult<RowIter> {
    let file = File::open(path)
        .map_err(|e| ReconError::Decode(format!("failed to open {}: {}", path.display(), e)))?;
    let mut zip = zip::ZipArchive::new(file)
        .map_err(|e| ReconError::Decode(format!("failed to open archive: {}", e)))?;

    let entry_name = select_entry(zip.file_names())
        .ok_or_else(|| ReconError::NoArchiveEntry(path.display().to_string()))?;
    debug!("Selected archive entry: {}", entry_name);

    let extension = entry_extension(&entry_name).unwrap_or_default();
    let extracted = extract_entry(&mut zip, &entry_name, scratch_dir)?;

    // Recurse with a synthetic declared name carrying the entry extension.
    let inner = super::decode(&extracted, &format!("entry.{}", extension), scratch_dir)?;

    Ok(Box::new(ScratchBackedRows {
        inner,
        _extracted: extracted,
    }))
}

/// Pick the entry to decode: supported extension, not a directory, not
/// macOS metadata, not hidden; CSV first, then lexicographic.
fn select_entry<'a>(names: impl Iterator<Item = &'a str>) -> Option<String> {
    let mut candidates: Vec<&str> = names
        .filter(|name| !name.ends_with('/'))
        .filter(|name| !name.starts_with("__MACOSX"))
        .filter(|name| {
            let base = name.rsplit('/').next().unwrap_or(name);
            !base.starts_with('.')
        })
        .filter(|name| {
            entry_extension(name)
                .map(|ext| SUPPORTED_ENTRY_EXTENSIONS.contains(&ext.as_str()))
                .unwrap_or(false)
        })
        .collect();

    candidates.sort_by_key(|name| {
        let is_csv = entry_extension(name).as_deref() == Some("csv");
        (!is_csv, name.to_string())
    });

    candidates.first().map(|name| name.to_string())
}

fn entry_extension(name: &str) -> Option<String> {
    let base = name.rsplit('/').next().unwrap_or(name);
    let ext = base.rsplit('.').next()?;
    if ext.len() < base.len() {
        Some(ext.to_ascii_lowercase())
    } else {
        None
    }
}

fn extract_entry(
    zip: &mut zip::ZipArchive<File>,
    entry_name: &str,
    scratch_dir: &Path,
) -> ReconResult<TempPath> {
    let mut entry = zip
        .by_name(entry_name)
        .map_err(|e| ReconError::Decode(format!("failed to read entry {}: {}", entry_name, e)))?;

    let mut scratch_file = tempfile::Builder::new()
        .prefix("entry-")
        .tempfile_in(scratch_dir)
        .map_err(|e| ReconError::Io(format!("failed to create scratch file: {}", e)))?;

    io::copy(&mut entry, &mut scratch_file)
        .map_err(|e| ReconError::Decode(format!("failed to extract {}: {}", entry_name, e)))?;

    Ok(scratch_file.into_temp_path())
}

/// Row stream holding the extracted scratch file alive until fully consumed
struct ScratchBackedRows {
    inner: RowIter,
    _extracted: TempPath,
}

impl Iterator for ScratchBackedRows {
    type Item = ReconResult<RowRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }
}
