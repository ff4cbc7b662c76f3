//! One generate → execute → validate cycle.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// How an attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// Produced dataset matched the reference
    Success,
    /// Generator, code extraction or execution failed
    ExecutionFailure,
    /// Code ran but its output differed from the reference
    Mismatch,
}

impl std::fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttemptOutcome::Success => write!(f, "success"),
            AttemptOutcome::ExecutionFailure => write!(f, "execution-failure"),
            AttemptOutcome::Mismatch => write!(f, "mismatch"),
        }
    }
}

/// Record of a finished attempt.
///
/// The candidate source itself is not kept; only the winning attempt's code is
/// persisted, by the artifact store.
#[derive(Debug, Clone, Serialize)]
pub struct Attempt {
    /// 1-based position within the attempt budget
    pub ordinal: u32,
    /// Short SHA-256 of the candidate code, `None` when no code was obtained
    pub code_digest: Option<String>,
    pub outcome: AttemptOutcome,
    pub diagnostic: String,
    pub started_at: DateTime<Utc>,
    pub elapsed_ms: u64,
}

impl Attempt {
    pub fn is_success(&self) -> bool {
        self.outcome == AttemptOutcome::Success
    }
}

/// First 12 hex chars of the SHA-256 of `code`
pub fn code_digest(code: &str) -> String {
    let digest = Sha256::digest(code.as_bytes());
    hex::encode(digest)[..12].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_digest_stable() {
        let a = code_digest("def parse(path):\n    pass\n");
        let b = code_digest("def parse(path):\n    pass\n");
        assert_eq!(a, b);
        assert_eq!(a.len(), 12);
        assert_ne!(a, code_digest("def parse(p): pass"));
    }

    #[test]
    fn test_code_digest_known_value() {
        // sha256("") = e3b0c44298fc1c149afbf4c8996fb924...
        assert_eq!(code_digest(""), "e3b0c44298fc");
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(AttemptOutcome::Success.to_string(), "success");
        assert_eq!(AttemptOutcome::ExecutionFailure.to_string(), "execution-failure");
        assert_eq!(AttemptOutcome::Mismatch.to_string(), "mismatch");
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_string(&AttemptOutcome::ExecutionFailure).unwrap();
        assert_eq!(json, "\"execution_failure\"");
    }
}
