//! Untyped tables as they come off disk.

use std::io::Read;
use std::path::Path;

use crate::error::{ParsegenError, Result};

/// A table whose cells are all strings, exactly as read from CSV.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    /// Column names from the header row.
    pub headers: Vec<String>,
    /// Data rows, one string per field.
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    /// Read a CSV file with a header row
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            ParsegenError::Dataset(format!("Failed to open {}: {}", path.display(), e))
        })?;
        Self::from_csv_reader(file)
    }

    /// Read CSV from any reader.
    ///
    /// Rows whose width differs from the header are rejected rather than padded.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();

        let mut rows = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record?;
            if record.len() != headers.len() {
                return Err(ParsegenError::Dataset(format!(
                    "row {} has {} cells, expected {}",
                    i,
                    record.len(),
                    headers.len()
                )));
            }
            rows.push(record.iter().map(String::from).collect());
        }

        Ok(Self { headers, rows })
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_csv_with_quoted_newlines() {
        let csv = "Date,Description,Debit Amt,Credit Amt,Balance\n\
                   01-08-2024,\"Salary\nCredit\",,1000.0,1000.0\n";
        let table = RawTable::from_csv_reader(csv.as_bytes()).unwrap();
        assert_eq!(table.headers.len(), 5);
        assert_eq!(table.row_count(), 1);
        assert_eq!(table.rows[0][1], "Salary\nCredit");
        assert_eq!(table.rows[0][2], "");
    }

    #[test]
    fn test_read_csv_header_only() {
        let table = RawTable::from_csv_reader("a,b\n".as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert!(table.is_empty());
    }

    #[test]
    fn test_read_csv_ragged_row_rejected() {
        let csv = "a,b,c\n1,2,3\n4,5\n";
        let err = RawTable::from_csv_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("row 1 has 2 cells, expected 3"));
    }

    #[test]
    fn test_read_missing_file() {
        let err = RawTable::from_csv_path(Path::new("/nonexistent/table.csv")).unwrap_err();
        assert!(matches!(err, ParsegenError::Dataset(_)));
    }
}
