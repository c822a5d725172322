//! Core domain logic for lock-based working hours tracking.
//!
//! This crate contains the fundamental types and logic for:
//! - Time arithmetic: signed hour/minute splits of durations
//! - Day records: arrival/departure pairs and their console rendering
//! - The daily log: records keyed by calendar date, with backscan lookups
//! - The lock interpreter: turning lock/unlock transitions into arrivals and departures

pub mod daily_log;
pub mod duration;
mod interpreter;
pub mod policy;
pub mod record;
pub mod session;

pub use daily_log::DailyLog;
pub use duration::{signed_difference, split_duration};
pub use interpreter::{LockInterpreter, Reconciliation};
pub use policy::WorkPolicy;
pub use record::{DayRecord, RecordError};
pub use session::{SessionState, UnknownSessionState};
