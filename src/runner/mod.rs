//! Generation loop - the attempt state machine
//!
//! Idle → Validating → Failed | Iterating → Succeeded | Exhausted

mod loop_runner;

pub use loop_runner::{GenerationLoop, LoopConfig, MAX_ATTEMPTS};
