//! CLI command implementations for dgx-spark-exporter.
//!
//! This module provides implementations for all CLI subcommands:
//! - `check`: Data source validation
//! - `config`: Configuration file generation
//! - `test`: Collection passes printed to stdout

pub mod check;
pub mod config;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use test::command_test;
