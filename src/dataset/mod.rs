//! Tabular data model
//!
//! - RawTable: string cells straight from CSV
//! - Schema: the fixed column set and per-column typing rules
//! - Dataset: typed rows used for preview, comparison and export

mod raw;
pub mod schema;
mod table;

pub use raw::RawTable;
pub use schema::{Coercion, Column, ColumnKind, Schema, coerce_numeric};
pub use table::{Cell, Dataset, format_number};
