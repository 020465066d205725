//! RSI (Relative Strength Index) over a session's closes.
//!
//! Wilder's smoothing for average gain/loss:
//! - First average: simple mean of the first n price changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 and avg_gain > 0: RSI = 100.
//! If both averages are 0 (flat tape): RSI = 50.
//!
//! Warmup: the first n points are invalid (n changes are needed for the
//! seed average). Each point depends only on bars at or before its own
//! index, so the series is prefix-stable: recomputing over a prefix of
//! the bars yields the same leading values.

use crate::domain::bar::MinuteBar;
use crate::domain::indicator::{RsiPoint, RsiSeries};

pub fn calculate_rsi(bars: &[MinuteBar], period: usize) -> RsiSeries {
    let invalid = |bar: &MinuteBar| RsiPoint {
        timestamp: bar.timestamp,
        valid: false,
        value: 0.0,
    };

    if period == 0 || bars.len() < 2 {
        return RsiSeries {
            period,
            points: bars.iter().map(invalid).collect(),
        };
    }

    let mut points = Vec::with_capacity(bars.len());
    points.push(invalid(&bars[0]));

    let changes: Vec<f64> = bars
        .windows(2)
        .map(|w| w[1].close - w[0].close)
        .collect();

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for (i, bar) in bars.iter().enumerate().skip(1) {
        let change_idx = i - 1;
        let gain = changes[change_idx].max(0.0);
        let loss = (-changes[change_idx]).max(0.0);

        if change_idx < period - 1 {
            // Still accumulating the seed window.
            points.push(invalid(bar));
        } else if change_idx == period - 1 {
            let gains: f64 = changes[..period].iter().map(|c| c.max(0.0)).sum();
            let losses: f64 = changes[..period].iter().map(|c| (-c).max(0.0)).sum();
            avg_gain = gains / period as f64;
            avg_loss = losses / period as f64;
            points.push(RsiPoint {
                timestamp: bar.timestamp,
                valid: true,
                value: rsi_from_averages(avg_gain, avg_loss),
            });
        } else {
            avg_gain = (avg_gain * (period - 1) as f64 + gain) / period as f64;
            avg_loss = (avg_loss * (period - 1) as f64 + loss) / period as f64;
            points.push(RsiPoint {
                timestamp: bar.timestamp,
                valid: true,
                value: rsi_from_averages(avg_gain, avg_loss),
            });
        }
    }

    RsiSeries { period, points }
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        if avg_gain > 0.0 { 100.0 } else { 50.0 }
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}
