//! Strategy state machine and the shared per-bar evaluation loop.
//!
//! [`SessionEngine`] holds the only mutable trading state: the current
//! position for the session being evaluated. Both the backtest driver
//! and the live polling loop feed it one bar at a time through
//! [`run_session`]; neither can open a second position or peek ahead,
//! because the open transition only exists on the `Flat` arm and each
//! evaluation sees only bars already received.

use log::debug;

use super::bar::MinuteBar;
use super::error::MeanrevError;
use super::indicator::rsi::calculate_rsi;
use super::position::{ExitReason, Position, Trade};
use super::risk;
use super::summary::{summarize_session, DailySummary};
use crate::ports::bar_port::{BarFeed, FeedEvent};

/// Strategy parameters shared by both drivers.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyParams {
    pub rsi_period: usize,
    pub entry_threshold: f64,
    pub exit_threshold: f64,
    /// Fractional stop distance below entry; 0 disables the stop.
    pub stop_pct: f64,
    /// Minimum minutes a position must be held before the RSI exit
    /// signal may fire. Stop and session-close are never delayed.
    pub min_hold_minutes: i64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        StrategyParams {
            rsi_period: 14,
            entry_threshold: 20.0,
            exit_threshold: 65.0,
            stop_pct: 0.02,
            min_hold_minutes: 0,
        }
    }
}

impl StrategyParams {
    pub fn validate(&self) -> Result<(), MeanrevError> {
        let invalid = |key: &str, reason: &str| MeanrevError::ConfigInvalid {
            section: "strategy".into(),
            key: key.into(),
            reason: reason.into(),
        };
        if self.rsi_period < 2 {
            return Err(invalid("rsi_period", "must be at least 2"));
        }
        if !(0.0..=100.0).contains(&self.entry_threshold) {
            return Err(invalid("entry_threshold", "must be within [0, 100]"));
        }
        if !(0.0..=100.0).contains(&self.exit_threshold) {
            return Err(invalid("exit_threshold", "must be within [0, 100]"));
        }
        if self.entry_threshold >= self.exit_threshold {
            return Err(invalid(
                "entry_threshold",
                "must be below exit_threshold",
            ));
        }
        if !(0.0..1.0).contains(&self.stop_pct) {
            return Err(invalid("stop_pct", "must be within [0, 1)"));
        }
        if self.min_hold_minutes < 0 {
            return Err(invalid("min_hold_minutes", "must not be negative"));
        }
        Ok(())
    }
}

/// Position state. `Long` carries the position, so opening while long
/// is unrepresentable rather than merely checked.
#[derive(Debug, Clone)]
enum PositionState {
    Flat,
    Long(Position),
}

#[derive(Debug)]
pub struct SessionEngine {
    params: StrategyParams,
    state: PositionState,
    trades: Vec<Trade>,
}

impl SessionEngine {
    pub fn new(params: StrategyParams) -> Self {
        SessionEngine {
            params,
            state: PositionState::Flat,
            trades: Vec::new(),
        }
    }

    pub fn is_long(&self) -> bool {
        matches!(self.state, PositionState::Long(_))
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    /// Evaluate one bar. `rsi` is `None` while the indicator warms up,
    /// which permits no action. At most one transition per bar; when
    /// both the stop and the exit signal hold, the stop wins.
    pub fn on_bar(&mut self, bar: &MinuteBar, rsi: Option<f64>) -> Result<(), MeanrevError> {
        bar.validate()?;
        let price = bar.close;

        match &self.state {
            PositionState::Flat => {
                if let Some(r) = rsi {
                    if r < self.params.entry_threshold {
                        let position = Position {
                            entry_time: bar.timestamp,
                            entry_price: price,
                            stop_price: risk::stop_price(price, self.params.stop_pct),
                        };
                        debug!(
                            "open long at {} price={price} rsi={r:.1} stop={}",
                            bar.timestamp, position.stop_price
                        );
                        self.state = PositionState::Long(position);
                    }
                }
            }
            PositionState::Long(position) => {
                if position.stop_hit(price) {
                    self.close(bar, ExitReason::Stop);
                } else if let Some(r) = rsi {
                    let held = position.held_minutes(bar.timestamp);
                    if r > self.params.exit_threshold && held >= self.params.min_hold_minutes {
                        self.close(bar, ExitReason::Signal);
                    }
                }
            }
        }

        Ok(())
    }

    /// Liquidate any open position at the given bar's close. Used for
    /// the session's last bar and for live-loop shutdown; a position is
    /// never left open with no corresponding trade record.
    pub fn force_close(&mut self, bar: &MinuteBar) {
        if self.is_long() {
            self.close(bar, ExitReason::SessionClose);
        }
    }

    pub fn into_trades(self) -> Vec<Trade> {
        self.trades
    }

    fn close(&mut self, bar: &MinuteBar, reason: ExitReason) {
        if let PositionState::Long(position) = &self.state {
            let trade = Trade::close(position, bar.timestamp, bar.close, reason);
            debug!(
                "close long at {} price={} reason={reason} pnl={:.4}",
                bar.timestamp, bar.close, trade.pnl
            );
            self.trades.push(trade);
            self.state = PositionState::Flat;
        }
    }
}

/// Result of evaluating one session: the emitted trades plus the
/// per-session summary.
#[derive(Debug, Clone)]
pub struct SessionResult {
    pub summary: DailySummary,
    pub trades: Vec<Trade>,
}

/// Drive one session from a bar feed until it signals end of session.
///
/// This is the single evaluation loop shared by the backtest and live
/// drivers; only the feed differs. The RSI prefix is recomputed over
/// the bars received so far, which is causally identical to the batch
/// series (see the prefix-stability note in the indicator module).
///
/// Returns `None` when the feed ends before producing any bar.
pub fn run_session(
    feed: &mut dyn BarFeed,
    params: &StrategyParams,
) -> Result<Option<SessionResult>, MeanrevError> {
    let mut bars: Vec<MinuteBar> = Vec::new();
    let mut engine = SessionEngine::new(params.clone());

    loop {
        match feed.next_event()? {
            FeedEvent::Bar(bar) => {
                bars.push(bar);
                let series = calculate_rsi(&bars, params.rsi_period);
                let idx = bars.len() - 1;
                engine.on_bar(&bars[idx], series.value_at(idx))?;
            }
            FeedEvent::EndOfSession => break,
        }
    }

    let Some(last) = bars.last() else {
        return Ok(None);
    };
    engine.force_close(last);

    let date = last.timestamp.date_naive();
    let series = calculate_rsi(&bars, params.rsi_period);
    let trades = engine.into_trades();
    let summary = summarize_session(date, &trades, &series, params);

    Ok(Some(SessionResult { summary, trades }))
}
