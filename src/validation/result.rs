//! Verdict type shared by the comparison step and the generation loop

use serde::Serialize;

/// Outcome of checking a produced dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub passed: bool,
    /// Human-readable summary, one error per line
    pub output: String,
    /// First entry is the headline diagnostic, later ones add detail
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn pass() -> Self {
        Self {
            passed: true,
            output: String::new(),
            errors: Vec::new(),
        }
    }

    /// Failing result with a single error
    pub fn fail(error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            passed: false,
            output: error.clone(),
            errors: vec![error],
        }
    }

    /// Add an error; the result stops passing
    pub fn add_error(&mut self, error: impl Into<String>) {
        let error = error.into();
        if !self.output.is_empty() {
            self.output.push('\n');
        }
        self.output.push_str(&error);
        self.errors.push(error);
        self.passed = false;
    }

}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::pass()
    }
}
