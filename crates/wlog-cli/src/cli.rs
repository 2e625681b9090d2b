//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Writing-process log analysis.
///
/// Reconciles keystroke, cursor and text-snapshot records into one
/// linear token stream and derives writing-process measures from it.
#[derive(Debug, Parser)]
#[command(name = "wlog", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Print the reconciled token stream and a status line.
    Linearize {
        /// Log file, or `-` for stdin.
        log: PathBuf,

        /// Minimum gap, in seconds, rendered as a pause token.
        #[arg(long)]
        pause_threshold: Option<f64>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Step through the token stream, showing the reconstruction after each token.
    Steps {
        /// Log file, or `-` for stdin.
        log: PathBuf,

        /// Only print the text reconstructed up to this token index.
        #[arg(long)]
        index: Option<usize>,
    },

    /// Compute writing-process measures for one or more logs.
    Measures {
        /// Log files (`-` for stdin).
        #[arg(required = true)]
        logs: Vec<PathBuf>,

        /// Minimum gap, in seconds, counted as a pause.
        #[arg(long)]
        pause_criteria: Option<f64>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the process counts report.
    Counts {
        /// Log file, or `-` for stdin.
        log: PathBuf,
    },

    /// Write the plain-text diagnostic export.
    Export {
        /// Log file, or `-` for stdin.
        log: PathBuf,

        /// Identifier written as `noteId`.
        #[arg(long)]
        id: Option<String>,

        /// Title written in the header (defaults to `export_title` from config).
        #[arg(long)]
        title: Option<String>,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Linearize key records alone, ignoring snapshots.
    Keys {
        /// Log file, or `-` for stdin.
        log: PathBuf,

        /// Gaps strictly longer than this, in seconds, become pauses.
        #[arg(long)]
        pause_threshold: Option<f64>,
    },

    /// List insertion and deletion revision groups.
    Revisions {
        /// Log file, or `-` for stdin.
        log: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show what the writing surface displayed at a point in time.
    Replay {
        /// Log file, or `-` for stdin.
        log: PathBuf,

        /// Timestamp in milliseconds.
        #[arg(long, allow_negative_numbers = true)]
        at: i64,
    },

    /// Print the final text of one or more logs.
    FinalText {
        /// Log files (`-` for stdin).
        #[arg(required = true)]
        logs: Vec<PathBuf>,
    },
}
