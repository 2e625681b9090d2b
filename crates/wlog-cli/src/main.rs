use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use wlog_cli::commands::{
    counts, export, final_text, keys, linearize, measures, replay, revisions, steps,
};
use wlog_cli::{Cli, Commands, Config};

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        // No subcommand, show help
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = load_config(cli.config.as_deref())?;
    match command {
        Commands::Linearize {
            log,
            pause_threshold,
            json,
        } => linearize::run(log, &config.engine(*pause_threshold, None), *json)?,
        Commands::Steps { log, index } => steps::run(log, &config.engine(None, None), *index)?,
        Commands::Measures {
            logs,
            pause_criteria,
            json,
        } => measures::run(logs, &config.engine(None, *pause_criteria), *json)?,
        Commands::Counts { log } => counts::run(log, &config.engine(None, None))?,
        Commands::Export {
            log,
            id,
            title,
            output,
        } => {
            let options = export::ExportOptions {
                id: id.as_deref(),
                title: title.as_deref().unwrap_or(&config.export_title),
                output: output.as_deref(),
            };
            export::run(log, &config.engine(None, None), &options)?;
        }
        Commands::Keys {
            log,
            pause_threshold,
        } => keys::run(log, config.engine(*pause_threshold, None).pause_threshold())?,
        Commands::Revisions { log, json } => revisions::run(log, *json)?,
        Commands::Replay { log, at } => replay::run(log, *at)?,
        Commands::FinalText { logs } => final_text::run(logs)?,
    }

    Ok(())
}
