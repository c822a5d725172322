//! Configuration loading and management.

use std::path::{Path, PathBuf};

use autotime_core::WorkPolicy;
use autotime_core::policy::{
    DEFAULT_MAX_BACKSCAN_DAYS, DEFAULT_TARGET_WORK_HOURS, DEFAULT_UNPAID_BREAK_MINUTES,
};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the daily log snapshot.
    pub log_path: PathBuf,
    /// Minutes deducted from each closed day.
    pub unpaid_break_minutes: u32,
    /// Expected hours per day.
    pub target_work_hours: u32,
    /// How many days back to look for the previous workday.
    pub max_backscan_days: u32,
    /// Program that prints session bus signals.
    pub monitor_command: String,
    /// D-Bus interface emitting `ActiveChanged`.
    pub screensaver_interface: String,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs_data_path().unwrap_or_else(|| PathBuf::from("."));
        Self {
            log_path: data_dir.join("autotime.json"),
            unpaid_break_minutes: DEFAULT_UNPAID_BREAK_MINUTES,
            target_work_hours: DEFAULT_TARGET_WORK_HOURS,
            max_backscan_days: DEFAULT_MAX_BACKSCAN_DAYS,
            monitor_command: "dbus-monitor".to_string(),
            screensaver_interface: "org.gnome.ScreenSaver".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (AUTOTIME_*)
        figment = figment.merge(Env::prefixed("AUTOTIME_"));

        figment.extract()
    }

    /// The accounting parameters handed to the interpreter.
    pub const fn policy(&self) -> WorkPolicy {
        WorkPolicy {
            unpaid_break_minutes: self.unpaid_break_minutes,
            target_work_hours: self.target_work_hours,
            max_backscan_days: self.max_backscan_days,
        }
    }
}

/// Returns the platform-specific config directory for autotime.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("autotime"))
}

/// Returns the platform-specific data directory for autotime.
///
/// On Linux: `~/.local/share/autotime`
pub fn dirs_data_path() -> Option<PathBuf> {
    dirs::data_dir().map(|p| p.join("autotime"))
}
