//! Delimited text decoding
//!
//! RFC 4180 conventions: quoted fields, doubled-quote escapes. Fully empty
//! records are skipped; the first non-empty record supplies the headers.
//! Rows shorter than the header row surface missing cells as Null.

use crate::cell::CellValue;
use crate::decode::{RowIter, RowRecord};
use recon_core::{ReconError, ReconResult};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub fn decode(path: &Path) -> ReconResult<RowIter> {
    let file = File::open(path)
        .map_err(|e| ReconError::Decode(format!("failed to open {}: {}", path.display(), e)))?;

    let reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file));

    Ok(Box::new(DelimitedRows {
        inner: reader.into_records(),
        headers: None,
        next_index: 0,
    }))
}

struct DelimitedRows {
    inner: csv::StringRecordsIntoIter<BufReader<File>>,
    headers: Option<Vec<String>>,
    next_index: i64,
}

impl Iterator for DelimitedRows {
    type Item = ReconResult<RowRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.inner.next()? {
                Ok(record) => record,
                Err(e) => {
                    return Some(Err(ReconError::Decode(format!(
                        "malformed delimited data: {}",
                        e
                    ))))
                }
            };

            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }

            let headers = match &self.headers {
                Some(headers) => headers,
                None => {
                    self.headers =
                        Some(record.iter().map(|h| h.trim().to_string()).collect());
                    continue;
                }
            };

            let mut cells = HashMap::with_capacity(headers.len());
            for (i, header) in headers.iter().enumerate() {
                if header.is_empty() {
                    continue;
                }
                let value = match record.get(i).map(str::trim) {
                    Some(field) if !field.is_empty() => CellValue::Text(field.to_string()),
                    _ => CellValue::Null,
                };
                cells.insert(header.clone(), value);
            }

            let index = self.next_index;
            self.next_index += 1;
            return Some(Ok(RowRecord { index, cells }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn collect(path: &Path) -> Vec<RowRecord> {
        decode(path)
            .unwrap()
            .collect::<ReconResult<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_basic_rows() {
        let file = write_csv("ani,dnis\n5551234567,5559876543\n5550001111,5552223333\n");
        let rows = collect(file.path());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].index, 0);
        assert_eq!(
            rows[0].cell("ani"),
            &CellValue::Text("5551234567".to_string())
        );
        assert_eq!(rows[1].index, 1);
    }

    #[test]
    fn test_empty_rows_skipped_and_header_found() {
        let file = write_csv("\n,,\nani,dnis\n111,222\n");
        let rows = collect(file.path());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].index, 0);
        assert_eq!(rows[0].cell("dnis"), &CellValue::Text("222".to_string()));
    }

    #[test]
    fn test_quoted_fields() {
        let file = write_csv("name,number\n\"Smith, Jane\",\"555\"\"1\"\"\"\n");
        let rows = collect(file.path());
        assert_eq!(
            rows[0].cell("name"),
            &CellValue::Text("Smith, Jane".to_string())
        );
        assert_eq!(
            rows[0].cell("number"),
            &CellValue::Text("555\"1\"".to_string())
        );
    }

    #[test]
    fn test_short_row_yields_null() {
        let file = write_csv("a,b,c\n1,2\n");
        let rows = collect(file.path());
        assert_eq!(rows[0].cell("c"), &CellValue::Null);
    }
}
