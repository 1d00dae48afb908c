//! Command-line interface
//!
//! Each subcommand performs one restartable step of the signing workflow.

pub mod commands;

pub use commands::{AppContext, CliResult};
