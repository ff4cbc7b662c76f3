//! Exact comparison of a produced dataset against the reference.

use crate::dataset::{Cell, Coercion, Dataset, RawTable, Schema};

use super::result::ValidationResult;

/// Headline diagnostic for every kind of difference
pub const MISMATCH: &str = "Data mismatch.";

/// Compare two typed datasets.
///
/// Column names and order must match, then row count, then every cell.
/// There is no float tolerance: `5.00` and `5.0` are equal because both parse
/// to the same value, but `5.0` and `5.0000001` are not.
pub fn compare(produced: &Dataset, reference: &Dataset) -> ValidationResult {
    match first_difference(produced, reference) {
        None => ValidationResult::pass(),
        Some(detail) => {
            let mut result = ValidationResult::fail(MISMATCH);
            result.add_error(detail);
            result
        }
    }
}

fn first_difference(produced: &Dataset, reference: &Dataset) -> Option<String> {
    if produced.columns() != reference.columns() {
        return Some(format!(
            "columns differ: produced {:?}, expected {:?}",
            produced.columns(),
            reference.columns()
        ));
    }

    if produced.row_count() != reference.row_count() {
        return Some(format!(
            "row count differs: produced {}, expected {}",
            produced.row_count(),
            reference.row_count()
        ));
    }

    for (row, (ours, theirs)) in produced.rows().iter().zip(reference.rows()).enumerate() {
        for (col, name) in reference.columns().iter().enumerate() {
            let ours = ours.get(col).unwrap_or(&Cell::Null);
            let theirs = theirs.get(col).unwrap_or(&Cell::Null);
            if ours != theirs {
                return Some(format!(
                    "first difference at row {}, column '{}': produced {}, expected {}",
                    row,
                    name,
                    describe(ours),
                    describe(theirs)
                ));
            }
        }
    }

    None
}

fn describe(cell: &Cell) -> String {
    match cell {
        Cell::Text(s) => format!("{:?}", s),
        Cell::Number(_) => cell.to_string(),
        Cell::Null => "NaN".to_string(),
    }
}

/// Judges produced tables against one normalized reference
#[derive(Debug, Clone)]
pub struct Comparator {
    schema: Schema,
    reference: Dataset,
}

impl Comparator {
    /// Normalize the reference's amount columns before any comparison; the
    /// on-disk types are not trusted.
    ///
    /// Rows are held in order from zero on both sides, so no index column is
    /// ever stripped: a produced table with an extra leading column mismatches.
    pub fn new(schema: Schema, reference: RawTable) -> Self {
        let reference = Dataset::from_raw(reference, &schema, Coercion::Lenient);
        Self { schema, reference }
    }

    pub fn reference(&self) -> &Dataset {
        &self.reference
    }

    /// Type a produced table the way it will be compared
    pub fn normalize(&self, produced: RawTable) -> Dataset {
        Dataset::from_raw(produced, &self.schema, Coercion::Strict)
    }

    pub fn check(&self, produced: &Dataset) -> ValidationResult {
        compare(produced, &self.reference)
    }
}
