//! Command-line interface for writing-process log analysis.
//!
//! Argument parsing, configuration and the subcommands built on `wlog-core`.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
