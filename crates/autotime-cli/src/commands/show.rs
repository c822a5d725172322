//! Show command for printing the recorded workdays.

use std::io::Write;

use anyhow::{Context, Result};
use autotime_core::WorkPolicy;
use autotime_store::LogStore;

use crate::tracker::write_log;

/// Runs the show command.
///
/// Reads the snapshot without locking it, so it works while a tracker runs.
pub fn run<W: Write>(writer: &mut W, store: &LogStore, policy: &WorkPolicy, json: bool) -> Result<()> {
    let log = store
        .load()
        .with_context(|| format!("failed to load {}", store.path().display()))?;

    if json {
        serde_json::to_writer_pretty(&mut *writer, &log).context("failed to encode log")?;
        writeln!(writer)?;
        return Ok(());
    }

    if log.is_empty() {
        writeln!(writer, "No workdays recorded.")?;
        return Ok(());
    }
    write_log(writer, &log, policy).context("failed to write daily log")
}
