//! Position and trade records.

use chrono::DateTime;
use chrono_tz::Tz;
use std::fmt;

/// An open long position. Created on entry, destroyed on exit; at most
/// one exists at a time (enforced by the engine's state type).
#[derive(Debug, Clone)]
pub struct Position {
    pub entry_time: DateTime<Tz>,
    pub entry_price: f64,
    pub stop_price: f64,
}

impl Position {
    /// A stop of 0.0 means the stop is disabled and never fires.
    pub fn stop_hit(&self, price: f64) -> bool {
        self.stop_price > 0.0 && price <= self.stop_price
    }

    pub fn held_minutes(&self, now: DateTime<Tz>) -> i64 {
        (now - self.entry_time).num_minutes()
    }
}

/// Why a position was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// RSI crossed above the exit threshold.
    Signal,
    /// Price fell to the stop boundary.
    Stop,
    /// Forced liquidation at session end (or loop shutdown).
    SessionClose,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitReason::Signal => write!(f, "signal"),
            ExitReason::Stop => write!(f, "stop"),
            ExitReason::SessionClose => write!(f, "session_close"),
        }
    }
}

/// A completed round trip. Immutable once emitted.
#[derive(Debug, Clone)]
pub struct Trade {
    pub entry_time: DateTime<Tz>,
    pub entry_price: f64,
    pub exit_time: DateTime<Tz>,
    pub exit_price: f64,
    pub exit_reason: ExitReason,
    pub pnl: f64,
}

impl Trade {
    pub fn close(position: &Position, exit_time: DateTime<Tz>, exit_price: f64, reason: ExitReason) -> Self {
        Trade {
            entry_time: position.entry_time,
            entry_price: position.entry_price,
            exit_time,
            exit_price,
            exit_reason: reason,
            pnl: exit_price - position.entry_price,
        }
    }
}
