#![allow(dead_code)]

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use chrono_tz::America::New_York;
use chrono_tz::Tz;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use meanrev::domain::bar::MinuteBar;
use meanrev::domain::error::MeanrevError;
use meanrev::domain::session::Session;
use meanrev::ports::bar_port::LatestBarSource;

/// Bar at minute `min` past 10:00 New York on 2024-01-15.
pub fn bar_at(min: u32, close: f64) -> MinuteBar {
    MinuteBar {
        symbol: "NVDA".to_string(),
        timestamp: New_York.with_ymd_and_hms(2024, 1, 15, 10, min, 0).unwrap(),
        open: close,
        high: close + 0.05,
        low: close - 0.05,
        close,
        volume: 1_000,
    }
}

/// One session from a sequence of closes, one bar per minute starting
/// at the open.
pub fn session_from_closes(closes: &[f64]) -> Session {
    let bars: Vec<MinuteBar> = closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let mut bar = bar_at(0, close);
            bar.timestamp = New_York.with_ymd_and_hms(2024, 1, 15, 9, 30, 0).unwrap()
                + chrono::Duration::minutes(i as i64);
            bar
        })
        .collect();
    Session {
        date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        bars,
    }
}

/// Monotone decline: `steps + 1` closes from `start` falling by `step`
/// per bar.
pub fn falling_closes(start: f64, step: f64, steps: usize) -> Vec<f64> {
    (0..=steps).map(|i| start - step * i as f64).collect()
}

/// Pinned wall clock inside regular trading hours (10:00 New York).
pub fn mid_session_clock() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap()
}

/// Scripted [`LatestBarSource`]: replays a fixed sequence of poll
/// outcomes, then raises the shared stop flag, emulating an operator
/// cancelling the live loop.
pub struct ScriptedSource {
    script: VecDeque<Result<Option<MinuteBar>, MeanrevError>>,
    stop: Arc<AtomicBool>,
}

impl ScriptedSource {
    pub fn new(
        script: Vec<Result<Option<MinuteBar>, MeanrevError>>,
        stop: Arc<AtomicBool>,
    ) -> Self {
        Self {
            script: script.into(),
            stop,
        }
    }
}

impl LatestBarSource for ScriptedSource {
    fn latest_bar(&mut self, _symbol: &str) -> Result<Option<MinuteBar>, MeanrevError> {
        match self.script.pop_front() {
            Some(outcome) => outcome,
            None => {
                self.stop.store(true, Ordering::Relaxed);
                Ok(None)
            }
        }
    }
}

pub fn market_tz() -> Tz {
    New_York
}
