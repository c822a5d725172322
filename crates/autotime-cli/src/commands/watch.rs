//! Watch command: tracks the live desktop session.
//!
//! The session monitor runs as a child process. Its output is decoded line
//! by line and every complete event is handled before the next line is read.

use std::io::{BufRead, BufReader, Write};
use std::process::Child;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};

use crate::Config;
use crate::monitor::{self, MonitorParser};
use crate::tracker::{Tally, Tracker};

/// Runs the watch command until the monitor exits.
pub fn run<W: Write>(config: &Config, tracker: &mut Tracker, writer: &mut W) -> Result<Tally> {
    let mut child = monitor::spawn(config)?;
    tracing::info!(interface = %config.screensaver_interface, "watching session lock state");
    let tally = supervise(&mut child, config, tracker, writer, || Local::now().naive_local())?;
    tracing::info!(events = tally.events, "session monitor exited");
    Ok(tally)
}

/// Tracks a running monitor's output, then reaps it.
///
/// If tracking fails the monitor is killed before the error is returned.
fn supervise<W, C>(
    child: &mut Child,
    config: &Config,
    tracker: &mut Tracker,
    writer: &mut W,
    clock: C,
) -> Result<Tally>
where
    W: Write,
    C: Fn() -> NaiveDateTime,
{
    let parser = MonitorParser::new(config.screensaver_interface.clone());
    let tracked = child
        .stdout
        .take()
        .context("failed to capture monitor stdout")
        .and_then(|stdout| track(BufReader::new(stdout), parser, tracker, writer, clock));
    let tally = match tracked {
        Ok(tally) => tally,
        Err(err) => {
            stop(child, &config.monitor_command);
            return Err(err);
        }
    };

    let status = child
        .wait()
        .with_context(|| format!("failed to wait for {}", config.monitor_command))?;
    if !status.success() {
        anyhow::bail!("{} exited with status {status}", config.monitor_command);
    }
    Ok(tally)
}

fn stop(child: &mut Child, command: &str) {
    if let Err(err) = child.kill() {
        tracing::warn!(%command, error = %err, "failed to kill session monitor");
    }
    match child.wait() {
        Ok(status) => tracing::debug!(%command, %status, "session monitor stopped"),
        Err(err) => tracing::warn!(%command, error = %err, "failed to reap session monitor"),
    }
}

/// Decodes monitor output and feeds each event to the tracker.
fn track<R, W, C>(
    reader: R,
    mut parser: MonitorParser,
    tracker: &mut Tracker,
    writer: &mut W,
    clock: C,
) -> Result<Tally>
where
    R: BufRead,
    W: Write,
    C: Fn() -> NaiveDateTime,
{
    let mut tally = Tally::default();
    for line in reader.lines() {
        let line = line.context("failed to read monitor output")?;
        if let Some(state) = parser.feed_line(&line) {
            tally.record(tracker.handle(state, clock(), writer))?;
        }
    }
    Ok(tally)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::cell::Cell;
    use std::io;
    use std::process::{Command, Stdio};

    use autotime_core::WorkPolicy;
    use autotime_store::LogStore;
    use chrono::Duration;

    const GNOME: &str = "org.gnome.ScreenSaver";

    #[test]
    fn track_handles_monitor_output() {
        let temp = tempfile::tempdir().unwrap();
        let store = LogStore::new(temp.path().join("autotime.json"));
        let mut tracker = Tracker::open(store, WorkPolicy::default()).unwrap();

        let header = "signal time=1704096000.1 sender=:1.40 -> destination=(null destination) serial=812 path=/org/gnome/ScreenSaver; interface=org.gnome.ScreenSaver; member=ActiveChanged";
        let output = format!("{header}\n   boolean false\n{header}\n   boolean true\n{header}\n   boolean false\n");

        // Each event arrives sixteen hours after the previous one.
        let start = NaiveDateTime::parse_from_str("2024-01-01T08:00", "%Y-%m-%dT%H:%M").unwrap();
        let ticks = Cell::new(0);
        let clock = || {
            let now = start + Duration::hours(16) * ticks.get();
            ticks.set(ticks.get() + 1);
            now
        };

        let mut written = Vec::new();
        let tally = track(
            output.as_bytes(),
            MonitorParser::new(GNOME),
            &mut tracker,
            &mut written,
            clock,
        )
        .unwrap();

        assert_eq!(tally.events, 3);
        assert_eq!(tally.arrivals, 2);
        assert_eq!(
            String::from_utf8(written).unwrap(),
            "-----\n\
             2024-01-01: 08:00 - xx:xx = xh xxm (xxh xxm)\n\
             -----\n\
             2024-01-01: 08:00 - 00:00 = 15h 30m (7h 30m)\n\
             2024-01-02: 16:00 - xx:xx = xh xxm (xxh xxm)\n"
        );
    }

    /// A console whose every write fails, like a closed pipe.
    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_tracking_stops_the_monitor() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            log_path: temp.path().join("autotime.json"),
            monitor_command: "sh".to_string(),
            ..Config::default()
        };
        let mut tracker =
            Tracker::open(LogStore::new(&config.log_path), config.policy()).unwrap();

        // Emits unlock events forever, so it only ends if it is killed.
        let script = "while :; do \
            echo 'signal time=1 sender=:1.40 -> destination=(null destination) serial=1 path=/org/gnome/ScreenSaver; interface=org.gnome.ScreenSaver; member=ActiveChanged'; \
            echo '   boolean false'; \
            done";
        let mut child = Command::new("sh")
            .arg("-c")
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .spawn()
            .unwrap();

        let at = NaiveDateTime::parse_from_str("2024-01-01T08:00", "%Y-%m-%dT%H:%M").unwrap();
        let err = supervise(&mut child, &config, &mut tracker, &mut BrokenPipe, || at).unwrap_err();

        assert!(err.to_string().starts_with("failed to write day record"));
        assert!(child.try_wait().unwrap().is_some());
        // The arrival was saved before the console failed.
        let stored = LogStore::new(&config.log_path).load().unwrap();
        assert_eq!(stored.len(), 1);
    }

    #[test]
    fn run_fails_when_monitor_is_missing() {
        let temp = tempfile::tempdir().unwrap();
        let config = Config {
            log_path: temp.path().join("autotime.json"),
            monitor_command: temp.path().join("no-such-monitor").display().to_string(),
            ..Config::default()
        };
        let mut tracker =
            Tracker::open(LogStore::new(&config.log_path), config.policy()).unwrap();

        let err = run(&config, &mut tracker, &mut Vec::<u8>::new()).unwrap_err();
        assert!(err.to_string().starts_with("failed to start"));
    }
}
