//! CLI subcommand implementations.

pub mod feed;
pub mod show;
pub mod watch;
