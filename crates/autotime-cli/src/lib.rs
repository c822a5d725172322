//! Autotime CLI library.
//!
//! This crate provides the `autotime` binary: configuration, the session
//! monitor and the commands that drive the lock interpreter.

mod cli;
pub mod commands;
mod config;
pub mod monitor;
pub mod tracker;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use tracker::{Tally, TrackError, Tracker};
