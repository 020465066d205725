//! Indicator series types.
//!
//! An [`RsiSeries`] is aligned 1:1 with a session's bars. Points inside
//! the warmup window carry `valid: false` and permit no signal.

pub mod rsi;

use chrono::DateTime;
use chrono_tz::Tz;

#[derive(Debug, Clone)]
pub struct RsiPoint {
    pub timestamp: DateTime<Tz>,
    pub valid: bool,
    pub value: f64,
}

#[derive(Debug, Clone)]
pub struct RsiSeries {
    pub period: usize,
    pub points: Vec<RsiPoint>,
}

impl RsiSeries {
    /// RSI at bar index `i`, or `None` while the indicator is warming up.
    pub fn value_at(&self, i: usize) -> Option<f64> {
        self.points
            .get(i)
            .filter(|p| p.valid)
            .map(|p| p.value)
    }

    /// Extrema over valid points; `None` when nothing is valid yet.
    pub fn min_max(&self) -> Option<(f64, f64)> {
        let mut result: Option<(f64, f64)> = None;
        for point in self.points.iter().filter(|p| p.valid) {
            result = Some(match result {
                None => (point.value, point.value),
                Some((lo, hi)) => (lo.min(point.value), hi.max(point.value)),
            });
        }
        result
    }
}
