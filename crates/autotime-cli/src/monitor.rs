//! Screen locker notifications read from `dbus-monitor`.
//!
//! `dbus-monitor` prints each message as an unindented header line followed
//! by indented argument lines:
//!
//! ```text
//! signal time=1704096000.1 sender=:1.40 -> destination=(null destination) serial=812 path=/org/gnome/ScreenSaver; interface=org.gnome.ScreenSaver; member=ActiveChanged
//!    boolean true
//! ```
//!
//! Only `ActiveChanged` signals on the configured interface are turned into
//! session states. Everything else is skipped.

use std::process::{Child, Command, Stdio};
use std::sync::LazyLock;

use anyhow::{Context, Result};
use autotime_core::SessionState;
use regex::Regex;

use crate::Config;

/// Header of a signal message, capturing the interface and member.
static SIGNAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^signal\b.*\binterface=([\w.]+);\s*member=(\w+)").unwrap()
});

/// A boolean argument line.
static BOOLEAN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+boolean\s+(true|false)\s*$").unwrap());

const ACTIVE_CHANGED: &str = "ActiveChanged";

/// Arguments for `dbus-monitor` subscribing to `ActiveChanged` on `interface`.
pub fn monitor_args(interface: &str) -> Vec<String> {
    vec![
        "--session".to_string(),
        format!("type='signal',interface='{interface}',member='{ACTIVE_CHANGED}'"),
    ]
}

/// Starts the configured monitor with its stdout piped.
pub fn spawn(config: &Config) -> Result<Child> {
    let args = monitor_args(&config.screensaver_interface);
    tracing::debug!(command = %config.monitor_command, ?args, "starting session monitor");

    Command::new(&config.monitor_command)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .with_context(|| format!("failed to start {}", config.monitor_command))
}

/// Line-by-line decoder for `dbus-monitor` output.
#[derive(Debug, Clone)]
pub struct MonitorParser {
    interface: String,
    awaiting_argument: bool,
}

impl MonitorParser {
    pub fn new(interface: impl Into<String>) -> Self {
        Self {
            interface: interface.into(),
            awaiting_argument: false,
        }
    }

    /// Consumes one output line, returning a state once a complete
    /// `ActiveChanged` signal has been read.
    pub fn feed_line(&mut self, line: &str) -> Option<SessionState> {
        if let Some(caps) = BOOLEAN_RE.captures(line) {
            if !std::mem::take(&mut self.awaiting_argument) {
                return None;
            }
            return Some(SessionState::from_locked(&caps[1] == "true"));
        }

        // Any other unindented line starts a new message.
        if !line.starts_with(char::is_whitespace) {
            self.awaiting_argument = SIGNAL_RE
                .captures(line)
                .is_some_and(|caps| caps[1] == *self.interface && &caps[2] == ACTIVE_CHANGED);
        }
        None
    }
}
