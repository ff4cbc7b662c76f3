//! Persists the accepted parser and its exported dataset.

use std::path::{Path, PathBuf};

use crate::dataset::Dataset;
use crate::domain::TargetPaths;
use crate::error::{ParsegenError, Result};

/// Package marker written next to saved parsers
const PACKAGE_MARKER: &str = "__init__.py";

/// Writes a target's artifacts into the configured layout
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    paths: TargetPaths,
}

impl ArtifactStore {
    pub fn new(paths: TargetPaths) -> Self {
        Self { paths }
    }

    /// Create the parser and output directories.
    ///
    /// An empty `__init__.py` makes saved parsers importable as a package; an
    /// existing marker is left alone.
    pub fn prepare(&self) -> Result<()> {
        create_dir(&self.paths.parser_dir)?;
        create_dir(&self.paths.output_dir)?;

        let marker = self.paths.parser_dir.join(PACKAGE_MARKER);
        if !marker.exists() {
            std::fs::write(&marker, "").map_err(|e| {
                ParsegenError::Artifact(format!("Failed to write {}: {}", marker.display(), e))
            })?;
        }
        Ok(())
    }

    /// Export the produced dataset as CSV
    pub fn save_output(&self, dataset: &Dataset) -> Result<PathBuf> {
        dataset.write_csv(&self.paths.output).map_err(|e| {
            ParsegenError::Artifact(format!(
                "Failed to write {}: {}",
                self.paths.output.display(),
                e
            ))
        })?;
        log::info!("Saved produced dataset to {}", self.paths.output.display());
        Ok(self.paths.output.clone())
    }

    /// Write the accepted parser source, overwriting an earlier one
    pub fn save_parser(&self, code: &str) -> Result<PathBuf> {
        std::fs::write(&self.paths.parser, code).map_err(|e| {
            ParsegenError::Artifact(format!(
                "Failed to write {}: {}",
                self.paths.parser.display(),
                e
            ))
        })?;
        log::info!("Saved parser to {}", self.paths.parser.display());
        Ok(self.paths.parser.clone())
    }
}

fn create_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .map_err(|e| ParsegenError::Artifact(format!("Failed to create {}: {}", dir.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Cell;
    use crate::domain::Target;

    fn store(root: &Path) -> ArtifactStore {
        let target = Target::new("icici").unwrap();
        ArtifactStore::new(TargetPaths::new(root, &target, "pdf", "py"))
    }

    #[test]
    fn test_prepare_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.prepare().unwrap();

        assert!(dir.path().join("custom_parsers").is_dir());
        assert!(dir.path().join("output").is_dir());
        let marker = dir.path().join("custom_parsers/__init__.py");
        assert_eq!(std::fs::read_to_string(marker).unwrap(), "");
    }

    #[test]
    fn test_prepare_keeps_existing_marker() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("custom_parsers")).unwrap();
        std::fs::write(dir.path().join("custom_parsers/__init__.py"), "# pkg\n").unwrap();

        store(dir.path()).prepare().unwrap();
        let marker = std::fs::read_to_string(dir.path().join("custom_parsers/__init__.py")).unwrap();
        assert_eq!(marker, "# pkg\n");
    }

    #[test]
    fn test_save_parser_and_output() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(dir.path());
        store.prepare().unwrap();

        let parser = store.save_parser("def parse(p):\n    pass\n").unwrap();
        assert_eq!(parser, dir.path().join("custom_parsers/icici_parser.py"));
        assert_eq!(
            std::fs::read_to_string(&parser).unwrap(),
            "def parse(p):\n    pass\n"
        );

        let dataset = Dataset::new(
            vec!["Date".into(), "Debit Amt".into()],
            vec![vec![Cell::Text("01-08-2024".into()), Cell::Number(5.0)]],
        );
        let output = store.save_output(&dataset).unwrap();
        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            "Date,Debit Amt\n01-08-2024,5.0\n"
        );
    }

    #[test]
    fn test_save_without_prepare_fails() {
        let dir = tempfile::tempdir().unwrap();
        let result = store(dir.path()).save_parser("x");
        assert!(matches!(result, Err(ParsegenError::Artifact(_))));
    }
}
