//! Market-data port traits.

use chrono::NaiveDate;

use crate::domain::bar::MinuteBar;
use crate::domain::error::MeanrevError;

/// Historical bar access for the backtest driver.
pub trait BarSource {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<MinuteBar>, MeanrevError>;
}

/// "Most recent bar" access for the live driver. Returns `Ok(None)`
/// when no bar is available yet; a fetch failure is an `Err` the
/// polling loop treats as recoverable.
pub trait LatestBarSource {
    fn latest_bar(&mut self, symbol: &str) -> Result<Option<MinuteBar>, MeanrevError>;
}

/// What a bar feed yields: the next bar, or the explicit end of the
/// session (end of data, market close, or a requested shutdown).
#[derive(Debug, Clone)]
pub enum FeedEvent {
    Bar(MinuteBar),
    EndOfSession,
}

/// A source of the next bar. This is the single abstraction the
/// evaluation loop is written against; the backtest feed drains a
/// finite sequence, the live feed blocks (boundedly) on a poll.
pub trait BarFeed {
    fn next_event(&mut self) -> Result<FeedEvent, MeanrevError>;
}
