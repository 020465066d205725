//! End-to-end engine tests over full session tapes.
//!
//! Tapes are built from closes only (one bar per minute); the RSI path
//! through entry, exit, and stop is exercised exactly as the backtest
//! driver runs it.

mod common;

use common::*;
use meanrev::domain::backtest::run_backtest;
use meanrev::domain::engine::{run_session, StrategyParams};
use meanrev::domain::position::ExitReason;
use meanrev::domain::session::MarketHours;
use meanrev::adapters::polling_feed::PollingFeed;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Duration;

fn params() -> StrategyParams {
    StrategyParams::default()
}

mod oversold_recovery {
    use super::*;

    /// 100.00 falling 0.25/bar to 96.00, then rising 0.50/bar. The
    /// first defined RSI value lands on the fifteenth bar and is 0 on
    /// a pure decline, so the entry fills there at 96.50; Wilder
    /// smoothing lifts RSI through 65 on the ninth rising bar.
    fn recovery_closes() -> Vec<f64> {
        let mut closes = falling_closes(100.0, 0.25, 16);
        for i in 1..=13 {
            closes.push(96.0 + 0.5 * i as f64);
        }
        closes
    }

    #[test]
    fn single_round_trip_on_recovery_tape() {
        let result =
            run_backtest(vec![session_from_closes(&recovery_closes())], &params()).unwrap();
        let trades = &result.sessions[0].trades;

        assert_eq!(trades.len(), 1);
        let trade = &trades[0];
        assert_eq!(trade.exit_reason, ExitReason::Signal);
        assert!((trade.entry_price - 96.5).abs() < 1e-9);
        assert!((trade.exit_price - 100.5).abs() < 1e-9);
        assert!((trade.pnl - 4.0).abs() < 1e-9);
        assert!(trade.entry_time < trade.exit_time);
    }

    #[test]
    fn summary_reflects_the_round_trip() {
        let result =
            run_backtest(vec![session_from_closes(&recovery_closes())], &params()).unwrap();
        let summary = &result.sessions[0].summary;

        assert_eq!(summary.trade_count, 1);
        assert!((summary.total_pnl - 4.0).abs() < 1e-9);
        assert!((summary.win_rate - 1.0).abs() < 1e-12);
        assert!(summary.entry_threshold_hit);
        assert!(summary.exit_threshold_hit);
        // The pure decline pins the minimum at 0.
        assert_eq!(summary.min_rsi, Some(0.0));
        assert!(summary.max_rsi.unwrap() > 65.0);
        // Equity never dips below the entry baseline on this tape.
        assert_eq!(summary.max_drawdown, 0.0);
    }
}

mod stop_loss {
    use super::*;

    /// Decline that keeps going after the entry: 96.50 entry, 94.57
    /// stop, breached by the 94.50 close eight bars later.
    fn crash_closes() -> Vec<f64> {
        falling_closes(100.0, 0.25, 22)
    }

    #[test]
    fn stop_exits_the_losing_position() {
        let result = run_backtest(vec![session_from_closes(&crash_closes())], &params()).unwrap();
        let trades = &result.sessions[0].trades;

        assert_eq!(trades.len(), 1);
        let trade = &trades[0];
        assert_eq!(trade.exit_reason, ExitReason::Stop);
        assert!((trade.entry_price - 96.5).abs() < 1e-9);
        assert!((trade.exit_price - 94.5).abs() < 1e-9);
        assert!((trade.pnl + 2.0).abs() < 1e-9);
    }

    #[test]
    fn losing_session_summary() {
        let result = run_backtest(vec![session_from_closes(&crash_closes())], &params()).unwrap();
        let summary = &result.sessions[0].summary;

        assert_eq!(summary.trade_count, 1);
        assert_eq!(summary.win_rate, 0.0);
        assert!(summary.total_pnl < 0.0);
        assert!(summary.max_drawdown > 0.0);
        assert!(summary.entry_threshold_hit);
        assert!(!summary.exit_threshold_hit);
    }
}

mod flat_tape {
    use super::*;

    #[test]
    fn constant_prices_trade_nothing() {
        let closes = vec![100.0; 30];
        let result = run_backtest(vec![session_from_closes(&closes)], &params()).unwrap();
        let summary = &result.sessions[0].summary;

        assert_eq!(summary.trade_count, 0);
        assert_eq!(summary.total_pnl, 0.0);
        assert!(!summary.entry_threshold_hit);
        assert!(!summary.exit_threshold_hit);
        // A changeless tape is neither oversold nor overbought.
        assert_eq!(summary.min_rsi, Some(50.0));
        assert_eq!(summary.max_rsi, Some(50.0));
    }
}

mod trade_sequencing {
    use super::*;

    /// Two full oversold cycles in one session. The exact fill bars do
    /// not matter here; what must hold is that trades never overlap and
    /// every one closes after it opens.
    fn two_cycle_closes() -> Vec<f64> {
        let mut closes = falling_closes(100.0, 0.25, 16);
        let mut last = 96.0;
        for _ in 0..13 {
            last += 0.5;
            closes.push(last);
        }
        for _ in 0..26 {
            last -= 0.25;
            closes.push(last);
        }
        for _ in 0..20 {
            last += 0.5;
            closes.push(last);
        }
        closes
    }

    #[test]
    fn trades_are_ordered_and_disjoint() {
        let result =
            run_backtest(vec![session_from_closes(&two_cycle_closes())], &params()).unwrap();
        let trades = &result.sessions[0].trades;

        assert!(trades.len() >= 2);
        for trade in trades {
            assert!(trade.entry_time < trade.exit_time);
        }
        for pair in trades.windows(2) {
            assert!(pair[0].exit_time <= pair[1].entry_time);
        }
    }
}

mod live_cancellation {
    use super::*;

    #[test]
    fn cancelled_live_loop_force_closes_the_position() {
        // Sixteen falling bars: entry on the fifteenth, still long when
        // the script runs out and raises the stop flag.
        let script: Vec<_> = falling_closes(100.0, 0.25, 15)
            .iter()
            .enumerate()
            .map(|(i, &close)| Ok(Some(bar_at(i as u32, close))))
            .collect();

        let stop = Arc::new(AtomicBool::new(false));
        let source = ScriptedSource::new(script, stop.clone());
        let mut feed = PollingFeed::new(source, "NVDA", MarketHours::default(), stop)
            .with_poll_interval(Duration::ZERO)
            .with_clock(mid_session_clock);

        let result = run_session(&mut feed, &params()).unwrap().unwrap();

        assert_eq!(result.trades.len(), 1);
        let trade = &result.trades[0];
        assert_eq!(trade.exit_reason, ExitReason::SessionClose);
        assert!((trade.entry_price - 96.5).abs() < 1e-9);
        // Liquidated at the last received close, one bar after entry.
        assert!((trade.exit_price - 96.25).abs() < 1e-9);
    }
}
