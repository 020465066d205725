//! Result sink port traits.

use crate::domain::error::MeanrevError;
use crate::domain::position::Trade;
use crate::domain::summary::DailySummary;

/// Consumes the ordered trade sequence. One row per fill: entry and
/// exit of a trade are written as separate BUY / SELL rows.
pub trait TradeLogSink {
    fn write_trades(&mut self, trades: &[Trade]) -> Result<(), MeanrevError>;
}

/// Consumes one summary row per session, zero-trade sessions included.
pub trait SummarySink {
    fn write_summaries(&mut self, summaries: &[DailySummary]) -> Result<(), MeanrevError>;
}
