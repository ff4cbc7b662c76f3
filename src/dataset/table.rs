//! Typed datasets: the produced and reference sides of a comparison.

use std::fmt;
use std::io::Write;
use std::path::Path;

use crate::error::{ParsegenError, Result};

use super::raw::RawTable;
use super::schema::{Coercion, Schema};

/// One typed cell.
///
/// `Number` never holds NaN; missing values are `Null`, and `Null == Null`.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
    Null,
}

impl Cell {
    /// Render the cell for CSV export; `Null` is the empty string.
    pub fn to_csv_field(&self) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Number(n) => format_number(*n),
            Cell::Null => String::new(),
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Text(s) => write!(f, "{}", s),
            Cell::Number(n) => write!(f, "{}", format_number(*n)),
            Cell::Null => write!(f, "NaN"),
        }
    }
}

/// Shortest round-trip form, with a trailing `.0` on integral values.
pub fn format_number(value: f64) -> String {
    let mut s = value.to_string();
    if value.is_finite() && !s.contains('.') {
        s.push_str(".0");
    }
    s
}

/// Column names plus typed rows
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl Dataset {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        Self { columns, rows }
    }

    /// Type a raw table under a schema
    pub fn from_raw(raw: RawTable, schema: &Schema, coercion: Coercion) -> Self {
        let kinds: Vec<_> = raw.headers.iter().map(|h| schema.kind_of(h)).collect();
        let rows = raw
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(kinds.iter())
                    .map(|(raw_cell, kind)| Schema::type_cell(*kind, raw_cell, coercion))
                    .collect()
            })
            .collect();

        Self {
            columns: raw.headers,
            rows,
        }
    }

    /// Load and type a CSV file in one step.
    pub fn load_csv(path: &Path, schema: &Schema, coercion: Coercion) -> Result<Self> {
        let raw = RawTable::from_csv_path(path)?;
        Ok(Self::from_raw(raw, schema, coercion))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First `n` rows.
    pub fn head(&self, n: usize) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }

    /// First `n` rows as an aligned text table with a zero-based index.
    pub fn preview(&self, n: usize) -> String {
        if self.rows.is_empty() {
            return format!(
                "Empty DataFrame\nColumns: [{}]\nIndex: []",
                self.columns.join(", ")
            );
        }

        let head = self.head(n);
        let rendered: Vec<Vec<String>> = head
            .rows
            .iter()
            .map(|row| row.iter().map(|c| c.to_string().replace('\n', "\\n")).collect())
            .collect();

        let index_width = (head.rows.len().saturating_sub(1)).to_string().len();
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, name)| {
                rendered
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|s| s.chars().count())
                    .chain(std::iter::once(name.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut lines = Vec::with_capacity(rendered.len() + 1);
        let mut header = " ".repeat(index_width);
        for (name, width) in self.columns.iter().zip(&widths) {
            header.push_str(&format!("  {:>width$}", name, width = width));
        }
        lines.push(header);

        for (i, row) in rendered.iter().enumerate() {
            let mut line = format!("{:<width$}", i, width = index_width);
            for (value, width) in row.iter().zip(&widths) {
                line.push_str(&format!("  {:>width$}", value, width = width));
            }
            lines.push(line);
        }

        lines.join("\n")
    }

    /// Write header and rows as CSV without an index column.
    pub fn write_csv_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(Cell::to_csv_field))?;
        }
        writer.flush()?;
        Ok(())
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let file = std::fs::File::create(path).map_err(|e| {
            ParsegenError::Dataset(format!("Failed to create {}: {}", path.display(), e))
        })?;
        self.write_csv_to(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::new(
            vec![
                "Date".into(),
                "Description".into(),
                "Debit Amt".into(),
                "Credit Amt".into(),
                "Balance".into(),
            ],
            vec![
                vec![
                    Cell::Text("01-01-2024".into()),
                    Cell::Text("Coffee".into()),
                    Cell::Number(5.0),
                    Cell::Null,
                    Cell::Number(95.0),
                ],
                vec![
                    Cell::Text("02-01-2024".into()),
                    Cell::Text("Salary".into()),
                    Cell::Null,
                    Cell::Number(1000.5),
                    Cell::Number(1095.5),
                ],
            ],
        )
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(5.0), "5.0");
        assert_eq!(format_number(1095.5), "1095.5");
        assert_eq!(format_number(-0.25), "-0.25");
        assert_eq!(format_number(f64::INFINITY), "inf");
    }

    #[test]
    fn test_from_raw_types_by_schema() {
        let raw = RawTable::new(
            vec!["Date".into(), "Debit Amt".into()],
            vec![vec!["01-01-2024".into(), "5.00".into()]],
        );
        let ds = Dataset::from_raw(raw, &Schema::statement(), Coercion::Strict);
        assert_eq!(
            ds.rows()[0],
            vec![Cell::Text("01-01-2024".into()), Cell::Number(5.0)]
        );
    }

    #[test]
    fn test_from_raw_keeps_every_column() {
        let raw = RawTable::new(
            vec!["index".into(), "Date".into()],
            vec![vec!["7".into(), "01-01-2024".into()]],
        );
        let ds = Dataset::from_raw(raw, &Schema::statement(), Coercion::Strict);
        assert_eq!(ds.columns(), &["index".to_string(), "Date".to_string()]);
        assert_eq!(ds.rows()[0][0], Cell::Text("7".into()));
    }

    #[test]
    fn test_head() {
        let ds = sample();
        assert_eq!(ds.head(1).row_count(), 1);
        assert_eq!(ds.head(10).row_count(), 2);
    }

    #[test]
    fn test_preview_layout() {
        let preview = sample().preview(5);
        let lines: Vec<&str> = preview.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Debit Amt"));
        assert!(lines[1].starts_with('0'));
        assert!(lines[1].contains("Coffee"));
        assert!(lines[1].contains("NaN"));
        assert!(lines[2].contains("1095.5"));
    }

    #[test]
    fn test_preview_empty() {
        let ds = Dataset::new(vec!["Date".into()], vec![]);
        assert_eq!(ds.preview(5), "Empty DataFrame\nColumns: [Date]\nIndex: []");
    }

    #[test]
    fn test_write_csv_nulls_empty() {
        let mut buf = Vec::new();
        sample().write_csv_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Date,Description,Debit Amt,Credit Amt,Balance");
        assert_eq!(lines[1], "01-01-2024,Coffee,5.0,,95.0");
        assert_eq!(lines[2], "02-01-2024,Salary,,1000.5,1095.5");
    }

    #[test]
    fn test_write_then_load_is_equal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        sample().write_csv(&path).unwrap();
        let loaded = Dataset::load_csv(&path, &Schema::statement(), Coercion::Strict).unwrap();
        assert_eq!(loaded, sample());
    }
}
