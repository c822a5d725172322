//! Desktop session lock states.

use std::fmt;
use std::str::FromStr;

/// The two transitions a screen locker reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
    Locked,
    Unlocked,
}

impl SessionState {
    /// Maps a screensaver `ActiveChanged` argument onto a state.
    pub const fn from_locked(is_locked: bool) -> Self {
        if is_locked { Self::Locked } else { Self::Unlocked }
    }

    pub const fn is_locked(self) -> bool {
        matches!(self, Self::Locked)
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SessionState {
    type Err = UnknownSessionState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "locked" | "lock" | "true" => Ok(Self::Locked),
            "unlocked" | "unlock" | "false" => Ok(Self::Unlocked),
            _ => Err(UnknownSessionState(s.to_string())),
        }
    }
}

/// Error type for unrecognized session state strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownSessionState(String);

impl fmt::Display for UnknownSessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown session state: {}", self.0)
    }
}

impl std::error::Error for UnknownSessionState {}
