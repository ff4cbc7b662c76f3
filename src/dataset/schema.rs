//! Target schema and cell coercion rules.

use serde::Serialize;

use super::Cell;

/// How a column's cells are typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    Text,
    Amount,
}

/// How strictly amount cells are converted to numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Non-numeric amounts become `Null` (the `errors='coerce'` rule).
    Lenient,
    /// Non-numeric amounts are kept as text so they fail comparison.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnKind,
}

/// Ordered column set every dataset is compared under
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    columns: Vec<Column>,
}

pub const DATE: &str = "Date";
pub const DESCRIPTION: &str = "Description";
pub const DEBIT: &str = "Debit Amt";
pub const CREDIT: &str = "Credit Amt";
pub const BALANCE: &str = "Balance";

impl Schema {
    pub fn new(columns: Vec<(&str, ColumnKind)>) -> Self {
        Self {
            columns: columns
                .into_iter()
                .map(|(name, kind)| Column {
                    name: name.to_string(),
                    kind,
                })
                .collect(),
        }
    }

    /// The bank statement schema: `[Date, Description, Debit Amt, Credit Amt, Balance]`
    pub fn statement() -> Self {
        Self::new(vec![
            (DATE, ColumnKind::Text),
            (DESCRIPTION, ColumnKind::Text),
            (DEBIT, ColumnKind::Amount),
            (CREDIT, ColumnKind::Amount),
            (BALANCE, ColumnKind::Amount),
        ])
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn amount_columns(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|c| c.kind == ColumnKind::Amount)
            .map(|c| c.name.as_str())
            .collect()
    }

    /// Kind of a named column; columns outside the schema are text.
    pub fn kind_of(&self, name: &str) -> ColumnKind {
        self.columns
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.kind)
            .unwrap_or(ColumnKind::Text)
    }

    /// Type one raw cell for a column of the given kind.
    pub fn type_cell(kind: ColumnKind, raw: &str, coercion: Coercion) -> Cell {
        if raw.is_empty() {
            return Cell::Null;
        }
        match kind {
            ColumnKind::Text => Cell::Text(raw.to_string()),
            ColumnKind::Amount => match coerce_numeric(raw) {
                Some(value) => Cell::Number(value),
                // An exported missing value reads back as NaN
                None if raw.trim().parse::<f64>().is_ok_and(f64::is_nan) => Cell::Null,
                None => match coercion {
                    Coercion::Lenient => Cell::Null,
                    Coercion::Strict => Cell::Text(raw.to_string()),
                },
            },
        }
    }
}

/// Parse a float the way `to_numeric` does; NaN and garbage yield `None`.
pub fn coerce_numeric(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_nan() => None,
        Ok(value) => Some(value),
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_schema_order() {
        let schema = Schema::statement();
        assert_eq!(
            schema.names(),
            vec!["Date", "Description", "Debit Amt", "Credit Amt", "Balance"]
        );
        assert_eq!(schema.amount_columns(), vec!["Debit Amt", "Credit Amt", "Balance"]);
    }

    #[test]
    fn test_kind_of_unknown_column_is_text() {
        let schema = Schema::statement();
        assert_eq!(schema.kind_of("Balance"), ColumnKind::Amount);
        assert_eq!(schema.kind_of("Cheque No"), ColumnKind::Text);
    }

    #[test]
    fn test_coerce_numeric() {
        assert_eq!(coerce_numeric("5.00"), Some(5.0));
        assert_eq!(coerce_numeric(" 12.5 "), Some(12.5));
        assert_eq!(coerce_numeric("-3"), Some(-3.0));
        assert_eq!(coerce_numeric("1,234.00"), None);
        assert_eq!(coerce_numeric("NaN"), None);
        assert_eq!(coerce_numeric("Dr"), None);
        assert_eq!(coerce_numeric(""), None);
    }

    #[test]
    fn test_type_cell_lenient_nulls_garbage() {
        let cell = Schema::type_cell(ColumnKind::Amount, "n/a", Coercion::Lenient);
        assert_eq!(cell, Cell::Null);
    }

    #[test]
    fn test_type_cell_strict_keeps_garbage() {
        let cell = Schema::type_cell(ColumnKind::Amount, "n/a", Coercion::Strict);
        assert_eq!(cell, Cell::Text("n/a".to_string()));
    }

    #[test]
    fn test_type_cell_empty_is_null() {
        assert_eq!(Schema::type_cell(ColumnKind::Text, "", Coercion::Strict), Cell::Null);
        assert_eq!(Schema::type_cell(ColumnKind::Amount, "", Coercion::Strict), Cell::Null);
    }

    #[test]
    fn test_type_cell_nan_is_null_in_both_modes() {
        assert_eq!(Schema::type_cell(ColumnKind::Amount, "NaN", Coercion::Strict), Cell::Null);
        assert_eq!(Schema::type_cell(ColumnKind::Amount, "nan", Coercion::Lenient), Cell::Null);
    }

    #[test]
    fn test_type_cell_text_not_numeric() {
        let cell = Schema::type_cell(ColumnKind::Text, "123", Coercion::Lenient);
        assert_eq!(cell, Cell::Text("123".to_string()));
    }
}
