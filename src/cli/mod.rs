//! CLI module for parsegen - command-line interface.

pub mod commands;

pub use commands::Cli;
