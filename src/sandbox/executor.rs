//! Isolated execution harness - core interface
//!
//! An executor runs one candidate against the sample document and hands back
//! whatever table it produced. Judging that table is the validator's job.

use std::path::Path;

use async_trait::async_trait;
use thiserror::Error;

use crate::dataset::RawTable;

/// Why a candidate could not produce a table
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("LLM returned empty or invalid code.")]
    EmptyCode,

    #[error("Could not prepare execution workspace: {0}")]
    Workspace(std::io::Error),

    #[error("Could not start interpreter '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Code execution timed out after {ms}ms and was killed")]
    Timeout { ms: u64 },

    #[error("Code execution failed with error (exit code {}): {stderr}", exit_code.map_or("none".to_string(), |c| c.to_string()))]
    Failed { exit_code: Option<i32>, stderr: String },

    #[error("Code execution produced no dataset")]
    MissingOutput,

    #[error("Code execution returned a malformed dataset: {0}")]
    MalformedOutput(String),
}

/// Runs candidate code in isolation
#[async_trait]
pub trait Executor: Send + Sync {
    /// Execute `code`'s `parse` entry point against `sample`.
    ///
    /// Empty or whitespace-only code must fail with `EmptyCode` without
    /// running anything.
    async fn execute(&self, code: &str, sample: &Path) -> Result<RawTable, ExecutionError>;

    /// Short description for logs
    fn description(&self) -> &str {
        "executor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedExecutor {
        table: RawTable,
    }

    #[async_trait]
    impl Executor for FixedExecutor {
        async fn execute(&self, code: &str, _sample: &Path) -> Result<RawTable, ExecutionError> {
            if code.trim().is_empty() {
                return Err(ExecutionError::EmptyCode);
            }
            Ok(self.table.clone())
        }
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            ExecutionError::EmptyCode.to_string(),
            "LLM returned empty or invalid code."
        );
        assert_eq!(
            ExecutionError::Timeout { ms: 500 }.to_string(),
            "Code execution timed out after 500ms and was killed"
        );
        let failed = ExecutionError::Failed {
            exit_code: Some(1),
            stderr: "NameError: name 'camelot' is not defined".to_string(),
        };
        assert_eq!(
            failed.to_string(),
            "Code execution failed with error (exit code 1): NameError: name 'camelot' is not defined"
        );
        let killed = ExecutionError::Failed {
            exit_code: None,
            stderr: String::new(),
        };
        assert!(killed.to_string().contains("exit code none"));
    }

    #[tokio::test]
    async fn test_executor_trait_default_description() {
        let executor = FixedExecutor {
            table: RawTable::default(),
        };
        assert_eq!(executor.description(), "executor");
        assert!(matches!(
            executor.execute("  ", Path::new("/tmp/x.pdf")).await,
            Err(ExecutionError::EmptyCode)
        ));
        assert!(executor.execute("code", Path::new("/tmp/x.pdf")).await.is_ok());
    }
}
