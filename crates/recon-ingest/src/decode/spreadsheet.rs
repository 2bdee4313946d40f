//! Spreadsheet decoding
//!
//! Reads XLS/XLSX workbooks natively with calamine. Only the first sheet is
//! considered. Cell types are preserved: numeric cells stay numeric and date
//! cells surface their raw Excel serial, which is what the timestamp
//! normalizer keys on.

use crate::cell::CellValue;
use crate::decode::{RowIter, RowRecord};
use calamine::{open_workbook_auto, Data, Reader};
use recon_core::{ReconError, ReconResult};
use std::collections::HashMap;
use std::path::Path;

pub fn decode(path: &Path) -> ReconResult<RowIter> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| ReconError::Decode(format!("failed to open workbook: {}", e)))?;

    let sheet_names = workbook.sheet_names();
    let first_sheet = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| ReconError::Decode("workbook has no sheets".to_string()))?;

    let range = workbook
        .worksheet_range(&first_sheet)
        .map_err(|e| ReconError::Decode(format!("failed to read sheet {}: {}", first_sheet, e)))?;

    let mut header_row: Option<Vec<String>> = None;
    let mut rows = Vec::new();
    let mut next_index: i64 = 0;

    for raw_row in range.rows() {
        if raw_row.iter().all(cell_is_blank) {
            continue;
        }

        let headers = match &header_row {
            Some(headers) => headers,
            None => {
                header_row = Some(raw_row.iter().map(header_label).collect());
                continue;
            }
        };

        let mut cells = HashMap::with_capacity(headers.len());
        for (i, header) in headers.iter().enumerate() {
            if header.is_empty() {
                continue;
            }
            let value = raw_row.get(i).map(convert_cell).unwrap_or(CellValue::Null);
            cells.insert(header.clone(), value);
        }

        rows.push(Ok(RowRecord {
            index: next_index,
            cells,
        }));
        next_index += 1;
    }

    Ok(Box::new(rows.into_iter()))
}

fn cell_is_blank(cell: &Data) -> bool {
    match cell {
        Data::Empty => true,
        Data::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

fn header_label(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

fn convert_cell(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                CellValue::Null
            } else {
                CellValue::Text(trimmed.to_string())
            }
        }
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Date(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::Text(s.clone()),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
        Data::Error(_) => CellValue::Null,
    }
}
