//! Target identity and the file layout derived from it.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::{ParsegenError, Result};

/// Directory holding `<target>/<target>_sample.*` inputs
pub const DATA_DIR: &str = "data";
/// Directory accepted parsers are written to
pub const PARSER_DIR: &str = "custom_parsers";
/// Directory side-artifact exports are written to
pub const OUTPUT_DIR: &str = "output";

/// A named document source. Immutable for the lifetime of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target(String);

impl Target {
    /// Validate a target name.
    ///
    /// The name is spliced into file paths and must stay a single path segment.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(ParsegenError::Config("target name is empty".to_string()));
        }
        if trimmed
            .chars()
            .any(|c| c == '/' || c == '\\' || c.is_whitespace() || c.is_control())
            || trimmed == "."
            || trimmed == ".."
        {
            return Err(ParsegenError::Config(format!(
                "invalid target name '{}': must be a single path segment",
                name
            )));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Every path a run reads or writes for one target
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetPaths {
    pub sample_document: PathBuf,
    pub reference: PathBuf,
    pub parser_dir: PathBuf,
    pub parser: PathBuf,
    pub output_dir: PathBuf,
    pub output: PathBuf,
}

impl TargetPaths {
    /// Lay out paths under `root`:
    ///
    /// - `data/<t>/<t>_sample.<document_ext>`
    /// - `data/<t>/<t>_sample.csv`
    /// - `custom_parsers/<t>_parser.<source_ext>`
    /// - `output/<t>_output.csv`
    pub fn new(root: &Path, target: &Target, document_ext: &str, source_ext: &str) -> Self {
        let t = target.as_str();
        let data_dir = root.join(DATA_DIR).join(t);
        let parser_dir = root.join(PARSER_DIR);
        let output_dir = root.join(OUTPUT_DIR);

        Self {
            sample_document: data_dir.join(format!("{}_sample.{}", t, document_ext)),
            reference: data_dir.join(format!("{}_sample.csv", t)),
            parser: parser_dir.join(format!("{}_parser.{}", t, source_ext)),
            output: output_dir.join(format!("{}_output.csv", t)),
            parser_dir,
            output_dir,
        }
    }

    /// Input files that do not exist
    pub fn missing_inputs(&self) -> Vec<&Path> {
        [self.sample_document.as_path(), self.reference.as_path()]
            .into_iter()
            .filter(|p| !p.exists())
            .collect()
    }
}
