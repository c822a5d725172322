use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use autotime_store::LogStore;
use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use autotime_cli::commands::{feed, show, watch};
use autotime_cli::{Cli, Commands, Config, Tally, Tracker};

/// Load config and open the tracker, printing every stored day.
fn open_tracker<W: Write>(
    config_path: Option<&Path>,
    writer: &mut W,
) -> Result<(Tracker, Config)> {
    let config = load_config(config_path)?;
    let tracker = Tracker::open(LogStore::new(&config.log_path), config.policy())?;
    tracker
        .print_log(writer)
        .context("failed to print daily log")?;
    Ok((tracker, config))
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

/// Turns lost saves into a failing exit once tracking ends.
fn ensure_persisted(tally: Tally) -> Result<()> {
    if tally.failed_saves > 0 {
        anyhow::bail!(
            "{} of {} daily log updates could not be saved",
            tally.failed_saves,
            tally.arrivals
        );
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    // Day records own stdout, diagnostics go to stderr
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Watch) => {
            let (mut tracker, config) = open_tracker(cli.config.as_deref(), &mut out)?;
            let tally = watch::run(&config, &mut tracker, &mut out)?;
            ensure_persisted(tally)?;
        }
        Some(Commands::Feed) => {
            let (mut tracker, _config) = open_tracker(cli.config.as_deref(), &mut out)?;
            let stdin = io::stdin();
            let tally = feed::run(stdin.lock(), &mut out, &mut tracker, || {
                Local::now().naive_local()
            })?;
            ensure_persisted(tally)?;
        }
        Some(Commands::Show { json }) => {
            let config = load_config(cli.config.as_deref())?;
            let store = LogStore::new(&config.log_path);
            show::run(&mut out, &store, &config.policy(), *json)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    Ok(())
}
