//! Minute bar representation and data-quality checks.

use chrono::DateTime;
use chrono_tz::Tz;

use super::error::MeanrevError;

/// One minute of market data, timestamped in the market's local timezone.
#[derive(Debug, Clone)]
pub struct MinuteBar {
    pub symbol: String,
    pub timestamp: DateTime<Tz>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl MinuteBar {
    /// Reject bars the engine must not act on: a missing/NaN close would
    /// silently corrupt the P&L record, so it is a hard error here.
    pub fn validate(&self) -> Result<(), MeanrevError> {
        if !self.close.is_finite() {
            return Err(MeanrevError::DataQuality {
                timestamp: self.timestamp.to_rfc3339(),
                reason: "close is missing or not finite".into(),
            });
        }
        if self.low < 0.0 || self.high < self.low {
            return Err(MeanrevError::DataQuality {
                timestamp: self.timestamp.to_rfc3339(),
                reason: format!("invalid range: high={} low={}", self.high, self.low),
            });
        }
        Ok(())
    }
}
