//! Dynamic cell values
//!
//! Decoders preserve the source type of each cell: numeric cells stay
//! numeric and spreadsheet date cells carry their raw Excel serial. The
//! normalizer switches on the tag, so coercions live here.

/// A raw cell value as produced by a decoder
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Spreadsheet date cell, as days since 1899-12-30
    Date(f64),
}

impl CellValue {
    /// True for null cells and blank text
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Null => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Display form of the cell, empty string for null.
    ///
    /// Floats holding whole numbers print without a fraction so phone
    /// numbers read from numeric columns keep their digits intact.
    pub fn to_text(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Text(s) => s.clone(),
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", *f as i64)
                } else {
                    format!("{}", f)
                }
            }
            CellValue::Bool(b) => b.to_string(),
            CellValue::Date(serial) => format!("{}", serial),
        }
    }

    /// Numeric form of the cell, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Null => None,
            CellValue::Text(s) => s.trim().parse::<f64>().ok(),
            CellValue::Integer(i) => Some(*i as f64),
            CellValue::Float(f) => Some(*f),
            CellValue::Bool(_) => None,
            CellValue::Date(serial) => Some(*serial),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_empty() {
        assert!(CellValue::Null.is_empty());
        assert!(CellValue::Text("   ".to_string()).is_empty());
        assert!(!CellValue::Text("0".to_string()).is_empty());
        assert!(!CellValue::Integer(0).is_empty());
    }

    #[test]
    fn test_whole_float_keeps_digits() {
        let cell = CellValue::Float(5551234567.0);
        assert_eq!(cell.to_text(), "5551234567");
    }

    #[test]
    fn test_text_numeric_coercion() {
        assert_eq!(CellValue::Text(" 12.5 ".to_string()).as_f64(), Some(12.5));
        assert_eq!(CellValue::Text("n/a".to_string()).as_f64(), None);
    }
}
