//! Validation - decides whether a produced dataset matches the reference

mod compare;
mod result;

pub use compare::{Comparator, MISMATCH, compare};
pub use result::ValidationResult;
