//! Domain types for parsegen
//!
//! - Target / TargetPaths: the named document source and its file layout
//! - Attempt: one generate → execute → validate cycle
//! - RunState / RunReport: loop state machine and the caller-facing result

pub mod attempt;
pub mod outcome;
pub mod target;

pub use attempt::{Attempt, AttemptOutcome, code_digest};
pub use outcome::{ArtifactInfo, RunReport, RunState};
pub use target::{Target, TargetPaths};
