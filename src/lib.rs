//! Parsegen - generate document parsers with an LLM and keep the first one that works
//!
//! A generation loop asks a model for a `parse(path)` function, runs it out of
//! process against a sample document and accepts it only when its output
//! matches a reference dataset exactly.

pub mod artifact;
pub mod dataset;
pub mod domain;
pub mod error;
pub mod llm;
pub mod prompt;
pub mod runner;
pub mod sandbox;
pub mod validation;

pub use error::{ParsegenError, Result};
