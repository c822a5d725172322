//! Feed command for replaying session events from a text stream.
//!
//! Each line is `[TIMESTAMP] STATE`, where `STATE` is `locked`/`unlocked`
//! (or `lock`/`unlock`, `true`/`false`) and the optional timestamp is local
//! time as `YYYY-MM-DDTHH:MM[:SS]`. Lines without a timestamp are stamped
//! with the time they are read. Blank lines and `#` comments are skipped.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use autotime_core::SessionState;
use chrono::NaiveDateTime;

use crate::tracker::{Tally, Tracker};

const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// A parsed feed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeedEvent {
    pub state: SessionState,
    pub at: Option<NaiveDateTime>,
}

/// Runs the feed command, reading events until end of input.
pub fn run<R, W, C>(reader: R, writer: &mut W, tracker: &mut Tracker, clock: C) -> Result<Tally>
where
    R: BufRead,
    W: Write,
    C: Fn() -> NaiveDateTime,
{
    let mut tally = Tally::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("failed to read line {}", idx + 1))?;
        let Some(event) =
            parse_line(&line).with_context(|| format!("invalid event on line {}", idx + 1))?
        else {
            continue;
        };

        let now = event.at.unwrap_or_else(&clock);
        tally
            .record(tracker.handle(event.state, now, writer))
            .with_context(|| format!("failed to handle event on line {}", idx + 1))?;
    }
    Ok(tally)
}

/// Parses one feed line, returning `None` for blank lines and comments.
pub fn parse_line(line: &str) -> Result<Option<FeedEvent>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let mut parts = trimmed.split_whitespace();
    let (timestamp, state) = match (parts.next(), parts.next(), parts.next()) {
        (Some(state), None, None) => (None, state),
        (Some(timestamp), Some(state), None) => (Some(parse_timestamp(timestamp)?), state),
        _ => anyhow::bail!("expected `[TIMESTAMP] STATE`, got {trimmed:?}"),
    };

    let state: SessionState = state.parse()?;
    Ok(Some(FeedEvent {
        state,
        at: timestamp,
    }))
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(s, format).ok())
        .with_context(|| format!("invalid timestamp {s:?}, expected YYYY-MM-DDTHH:MM[:SS]"))
}
