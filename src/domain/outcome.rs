//! Run states and the report handed back to the caller.

use std::path::PathBuf;

use serde::Serialize;

use super::attempt::Attempt;

/// State of the generation loop.
///
/// `Idle → Validating → Failed | Iterating → Succeeded | Exhausted`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "detail", rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Validating,
    /// Run aborted before or outside the attempt budget (missing inputs etc.)
    Failed(String),
    /// Working on the given 1-based attempt
    Iterating(u32),
    /// Artifact persisted from the given attempt
    Succeeded(u32),
    /// Every attempt failed; nothing persisted
    Exhausted,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Failed(_) | RunState::Succeeded(_) | RunState::Exhausted
        )
    }
}

/// Where the accepted parser went
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactInfo {
    pub parser: PathBuf,
    pub output: PathBuf,
    pub attempt: u32,
    pub code_digest: String,
}

/// Everything a caller learns from a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub target: String,
    pub state: RunState,
    pub max_attempts: u32,
    pub attempts: Vec<Attempt>,
    pub artifact: Option<ArtifactInfo>,
}

impl RunReport {
    pub fn new(target: impl Into<String>, max_attempts: u32) -> Self {
        Self {
            target: target.into(),
            state: RunState::Idle,
            max_attempts,
            attempts: Vec::new(),
            artifact: None,
        }
    }

    /// Number of attempts actually made
    pub fn attempt_count(&self) -> u32 {
        self.attempts.len() as u32
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.state, RunState::Succeeded(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!RunState::Idle.is_terminal());
        assert!(!RunState::Validating.is_terminal());
        assert!(!RunState::Iterating(1).is_terminal());
        assert!(RunState::Failed("missing".into()).is_terminal());
        assert!(RunState::Succeeded(2).is_terminal());
        assert!(RunState::Exhausted.is_terminal());
    }

    #[test]
    fn test_report_new() {
        let report = RunReport::new("icici", 3);
        assert_eq!(report.state, RunState::Idle);
        assert_eq!(report.attempt_count(), 0);
        assert!(!report.succeeded());
        assert!(report.artifact.is_none());
    }

    #[test]
    fn test_state_serialization() {
        let json = serde_json::to_value(RunState::Succeeded(2)).unwrap();
        assert_eq!(json["state"], "succeeded");
        assert_eq!(json["detail"], 2);

        let json = serde_json::to_value(RunState::Exhausted).unwrap();
        assert_eq!(json["state"], "exhausted");
    }
}
