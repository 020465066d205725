//! Batch driver: replay historical sessions through the shared
//! evaluation loop.

use super::engine::{run_session, SessionResult, StrategyParams};
use super::error::MeanrevError;
use super::session::Session;
use crate::ports::bar_port::{BarFeed, FeedEvent};

/// Feed over a finite, already-segmented session: yields each bar in
/// order, then the end-of-session signal.
pub struct HistoricalFeed {
    bars: std::vec::IntoIter<crate::domain::bar::MinuteBar>,
}

impl HistoricalFeed {
    pub fn new(session: Session) -> Self {
        HistoricalFeed {
            bars: session.bars.into_iter(),
        }
    }
}

impl BarFeed for HistoricalFeed {
    fn next_event(&mut self) -> Result<FeedEvent, MeanrevError> {
        Ok(match self.bars.next() {
            Some(bar) => FeedEvent::Bar(bar),
            None => FeedEvent::EndOfSession,
        })
    }
}

#[derive(Debug, Clone)]
pub struct BacktestResult {
    pub sessions: Vec<SessionResult>,
}

impl BacktestResult {
    pub fn total_pnl(&self) -> f64 {
        self.sessions.iter().map(|s| s.summary.total_pnl).sum()
    }

    pub fn trade_count(&self) -> usize {
        self.sessions.iter().map(|s| s.trades.len()).sum()
    }
}

/// Run every session through the engine in chronological order.
/// Deterministic: identical input bars produce identical results.
pub fn run_backtest(
    sessions: Vec<Session>,
    params: &StrategyParams,
) -> Result<BacktestResult, MeanrevError> {
    let mut results = Vec::with_capacity(sessions.len());

    for session in sessions {
        let mut feed = HistoricalFeed::new(session);
        if let Some(result) = run_session(&mut feed, params)? {
            results.push(result);
        }
    }

    Ok(BacktestResult { sessions: results })
}
