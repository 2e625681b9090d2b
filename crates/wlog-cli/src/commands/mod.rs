//! CLI subcommand implementations.

pub mod counts;
pub mod export;
pub mod final_text;
pub mod keys;
pub mod linearize;
pub mod measures;
pub mod replay;
pub mod revisions;
pub mod steps;
pub mod util;
