//! Per-session performance aggregation.

use chrono::NaiveDate;

use super::engine::StrategyParams;
use super::indicator::RsiSeries;
use super::position::Trade;

/// Starting equity for the per-session drawdown curve.
const BASELINE_EQUITY: f64 = 10_000.0;

/// One row per session, produced even when no trade executed.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySummary {
    pub date: NaiveDate,
    pub trade_count: usize,
    pub total_pnl: f64,
    /// Winning fraction; 0.0 (not NaN) when there were no trades.
    pub win_rate: f64,
    pub max_drawdown: f64,
    pub min_rsi: Option<f64>,
    pub max_rsi: Option<f64>,
    /// RSI dipped below the entry threshold at least once, whether or
    /// not a trade executed. Useful for zero-trade-day diagnostics.
    pub entry_threshold_hit: bool,
    pub exit_threshold_hit: bool,
}

/// Fold a session's trades and RSI extrema into a [`DailySummary`].
pub fn summarize_session(
    date: NaiveDate,
    trades: &[Trade],
    rsi: &RsiSeries,
    params: &StrategyParams,
) -> DailySummary {
    let total_pnl: f64 = trades.iter().map(|t| t.pnl).sum();
    let wins = trades.iter().filter(|t| t.pnl > 0.0).count();
    let win_rate = if trades.is_empty() {
        0.0
    } else {
        wins as f64 / trades.len() as f64
    };

    let (min_rsi, max_rsi) = match rsi.min_max() {
        Some((lo, hi)) => (Some(lo), Some(hi)),
        None => (None, None),
    };

    let entry_threshold_hit = rsi
        .points
        .iter()
        .any(|p| p.valid && p.value < params.entry_threshold);
    let exit_threshold_hit = rsi
        .points
        .iter()
        .any(|p| p.valid && p.value > params.exit_threshold);

    DailySummary {
        date,
        trade_count: trades.len(),
        total_pnl,
        win_rate,
        max_drawdown: max_drawdown(trades),
        min_rsi,
        max_rsi,
        entry_threshold_hit,
        exit_threshold_hit,
    }
}

/// Peak-to-trough decline of the cumulative equity curve built by
/// applying trades in order from the fixed baseline. 0 when equity
/// never falls below its running peak.
fn max_drawdown(trades: &[Trade]) -> f64 {
    let mut equity = BASELINE_EQUITY;
    let mut peak = equity;
    let mut max_dd = 0.0_f64;

    for trade in trades {
        equity += trade.pnl;
        if equity > peak {
            peak = equity;
        } else if peak > 0.0 {
            let dd = (peak - equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}
