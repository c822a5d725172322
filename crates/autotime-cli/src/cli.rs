//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Working hours from desktop lock and unlock events.
///
/// The first unlock of a day is the arrival; the last lock before the next
/// workday's first unlock is the departure.
#[derive(Debug, Parser)]
#[command(name = "autotime", version, about, long_about = None)]
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
    /// Track lock and unlock signals from the session bus until the monitor exits.
    Watch,

    /// Track session events read from stdin, one `[TIMESTAMP] locked|unlocked` per line.
    Feed,

    /// Print the recorded workdays.
    Show {
        /// Output the raw records as JSON.
        #[arg(long)]
        json: bool,
    },
}
