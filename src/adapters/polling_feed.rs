//! Live polling bar feed.
//!
//! Wraps a [`LatestBarSource`] as a [`BarFeed`]: each `next_event`
//! call waits for a bar newer than the last one seen, polling with a
//! bounded number of attempts per wait round and re-checking the stop
//! flag and the market clock between rounds. Fetch failures are logged
//! and retried; a bar is never fabricated.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::domain::error::MeanrevError;
use crate::domain::session::MarketHours;
use crate::ports::bar_port::{BarFeed, FeedEvent, LatestBarSource};

pub struct PollingFeed<S: LatestBarSource> {
    source: S,
    symbol: String,
    hours: MarketHours,
    stop: Arc<AtomicBool>,
    poll_interval: Duration,
    polls_per_wait: u32,
    last_seen: Option<DateTime<Tz>>,
    clock: fn() -> DateTime<Utc>,
}

impl<S: LatestBarSource> PollingFeed<S> {
    pub fn new(source: S, symbol: &str, hours: MarketHours, stop: Arc<AtomicBool>) -> Self {
        PollingFeed {
            source,
            symbol: symbol.to_string(),
            hours,
            stop,
            poll_interval: Duration::from_secs(5),
            polls_per_wait: 12,
            last_seen: None,
            clock: Utc::now,
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Override the wall clock; used by tests to pin the session clock.
    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> Self {
        self.clock = clock;
        self
    }

    /// Strictly past the close: the close minute itself is still polled,
    /// matching the inclusive window [`MarketHours::contains`] admits.
    fn session_over(&self) -> bool {
        let now = (self.clock)().with_timezone(&self.hours.timezone);
        now.time() > self.hours.close
    }

    fn poll_once(&mut self) -> Option<crate::domain::bar::MinuteBar> {
        match self.source.latest_bar(&self.symbol) {
            Ok(Some(bar)) => {
                let is_new = self.last_seen.is_none_or(|seen| bar.timestamp > seen);
                if !is_new {
                    return None;
                }
                if !self.hours.contains(&bar) {
                    debug!("dropping out-of-hours bar at {}", bar.timestamp);
                    return None;
                }
                self.last_seen = Some(bar.timestamp);
                Some(bar)
            }
            Ok(None) => None,
            Err(e) => {
                // Recoverable: skip this iteration, keep the position.
                warn!("bar fetch failed, retrying next poll: {e}");
                None
            }
        }
    }
}

impl<S: LatestBarSource> BarFeed for PollingFeed<S> {
    fn next_event(&mut self) -> Result<FeedEvent, MeanrevError> {
        loop {
            if self.stop.load(Ordering::Relaxed) {
                info!("stop requested, ending session");
                return Ok(FeedEvent::EndOfSession);
            }
            if self.session_over() {
                info!("market close reached, ending session");
                return Ok(FeedEvent::EndOfSession);
            }

            for _ in 0..self.polls_per_wait {
                if let Some(bar) = self.poll_once() {
                    return Ok(FeedEvent::Bar(bar));
                }
                if self.stop.load(Ordering::Relaxed) {
                    break;
                }
                if !self.poll_interval.is_zero() {
                    std::thread::sleep(self.poll_interval);
                }
            }
            debug!("no new bar this wait round");
        }
    }
}
