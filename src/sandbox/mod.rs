//! Isolated execution harness
//!
//! Runs generated parsers out of process and returns the table they produce.

mod executor;
mod subprocess;

pub use executor::{ExecutionError, Executor};
pub use subprocess::{RunnerShim, SubprocessConfig, SubprocessExecutor};
