//! Command-line interface for labelforge.
//!
//! Provides commands for release generation, history inspection, and
//! cleanup of failed release output.

mod commands;

pub use commands::{parse_cli, run, run_with_cli};
