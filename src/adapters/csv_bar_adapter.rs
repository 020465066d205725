//! CSV minute-bar source.
//!
//! Expected columns: `timestamp,open,high,low,close,volume` with
//! RFC 3339 timestamps. Timestamps must carry an offset; a naive
//! timestamp is a hard error, never assumed to be UTC or local.

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use std::path::PathBuf;

use crate::domain::bar::MinuteBar;
use crate::domain::error::MeanrevError;
use crate::ports::bar_port::{BarSource, LatestBarSource};

pub struct CsvBarSource {
    path: PathBuf,
    timezone: Tz,
}

impl CsvBarSource {
    pub fn new(path: PathBuf, timezone: Tz) -> Self {
        Self { path, timezone }
    }

    fn parse_timestamp(&self, value: &str) -> Result<DateTime<Tz>, MeanrevError> {
        DateTime::parse_from_rfc3339(value)
            .map(|ts| ts.with_timezone(&self.timezone))
            .map_err(|e| MeanrevError::Timestamp {
                value: value.to_string(),
                reason: format!("{e} (offset-carrying RFC 3339 required)"),
            })
    }
}

fn field<'r>(record: &'r csv::StringRecord, idx: usize, name: &str) -> Result<&'r str, MeanrevError> {
    record.get(idx).ok_or_else(|| MeanrevError::Feed {
        reason: format!("missing {name} column"),
    })
}

fn parse_f64(record: &csv::StringRecord, idx: usize, name: &str) -> Result<f64, MeanrevError> {
    field(record, idx, name)?
        .parse()
        .map_err(|e| MeanrevError::Feed {
            reason: format!("invalid {name} value: {e}"),
        })
}

impl BarSource for CsvBarSource {
    fn fetch_bars(
        &self,
        symbol: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<MinuteBar>, MeanrevError> {
        let mut rdr = csv::Reader::from_path(&self.path).map_err(|e| MeanrevError::Feed {
            reason: format!("failed to open {}: {e}", self.path.display()),
        })?;

        let mut bars = Vec::new();
        for result in rdr.records() {
            let record = result.map_err(|e| MeanrevError::Feed {
                reason: format!("CSV parse error: {e}"),
            })?;

            let timestamp = self.parse_timestamp(field(&record, 0, "timestamp")?)?;
            let date = timestamp.date_naive();
            if date < start_date || date > end_date {
                continue;
            }

            let volume: i64 = field(&record, 5, "volume")?
                .parse()
                .map_err(|e| MeanrevError::Feed {
                    reason: format!("invalid volume value: {e}"),
                })?;

            bars.push(MinuteBar {
                symbol: symbol.to_string(),
                timestamp,
                open: parse_f64(&record, 1, "open")?,
                high: parse_f64(&record, 2, "high")?,
                low: parse_f64(&record, 3, "low")?,
                close: parse_f64(&record, 4, "close")?,
                volume,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        Ok(bars)
    }
}

/// Live access over a file another process appends to: each poll
/// re-reads the file and reports the newest bar. The polling feed's
/// own dedup keeps an unchanged file from producing repeat events.
impl LatestBarSource for CsvBarSource {
    fn latest_bar(&mut self, symbol: &str) -> Result<Option<MinuteBar>, MeanrevError> {
        let min = NaiveDate::MIN;
        let max = NaiveDate::MAX;
        let bars = self.fetch_bars(symbol, min, max)?;
        Ok(bars.into_iter().next_back())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use chrono_tz::America::New_York;
    use std::fs;
    use tempfile::TempDir;

    fn write_csv(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bars.csv");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn fetch_parses_and_converts_to_market_tz() {
        let (_dir, path) = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-15T14:30:00+00:00,100.0,100.5,99.5,100.2,12000\n\
             2024-01-15T14:31:00+00:00,100.2,100.6,100.0,100.4,8000\n",
        );
        let source = CsvBarSource::new(path, New_York);
        let bars = source.fetch_bars("NVDA", date(15), date(15)).unwrap();

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].symbol, "NVDA");
        // 14:30 UTC is 09:30 in New York in January.
        assert_eq!(bars[0].timestamp.hour(), 9);
        assert_eq!(bars[0].timestamp.minute(), 30);
        assert_eq!(bars[0].close, 100.2);
        assert_eq!(bars[1].volume, 8000);
    }

    #[test]
    fn fetch_filters_by_local_date() {
        let (_dir, path) = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-15T14:30:00+00:00,100,101,99,100,1\n\
             2024-01-16T14:30:00+00:00,100,101,99,100,1\n\
             2024-01-17T14:30:00+00:00,100,101,99,100,1\n",
        );
        let source = CsvBarSource::new(path, New_York);
        let bars = source.fetch_bars("NVDA", date(16), date(16)).unwrap();
        assert_eq!(bars.len(), 1);
        assert_eq!(bars[0].timestamp.date_naive(), date(16));
    }

    #[test]
    fn fetch_sorts_out_of_order_rows() {
        let (_dir, path) = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-15T14:32:00+00:00,1,1,1,3.0,1\n\
             2024-01-15T14:30:00+00:00,1,1,1,1.0,1\n\
             2024-01-15T14:31:00+00:00,1,1,1,2.0,1\n",
        );
        let source = CsvBarSource::new(path, New_York);
        let bars = source.fetch_bars("NVDA", date(15), date(15)).unwrap();
        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn naive_timestamp_rejected() {
        let (_dir, path) = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-15 09:30:00,100,101,99,100,1\n",
        );
        let source = CsvBarSource::new(path, New_York);
        let err = source.fetch_bars("NVDA", date(15), date(15)).unwrap_err();
        assert!(matches!(err, MeanrevError::Timestamp { .. }));
    }

    #[test]
    fn garbage_close_rejected() {
        let (_dir, path) = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-15T14:30:00+00:00,100,101,99,oops,1\n",
        );
        let source = CsvBarSource::new(path, New_York);
        assert!(source.fetch_bars("NVDA", date(15), date(15)).is_err());
    }

    #[test]
    fn latest_bar_is_the_newest_row() {
        let (_dir, path) = write_csv(
            "timestamp,open,high,low,close,volume\n\
             2024-01-15T14:31:00+00:00,1,1,1,2.0,1\n\
             2024-01-15T14:30:00+00:00,1,1,1,1.0,1\n",
        );
        let mut source = CsvBarSource::new(path, New_York);
        let bar = source.latest_bar("NVDA").unwrap().unwrap();
        assert_eq!(bar.close, 2.0);
    }

    #[test]
    fn latest_bar_none_on_empty_file() {
        let (_dir, path) = write_csv("timestamp,open,high,low,close,volume\n");
        let mut source = CsvBarSource::new(path, New_York);
        assert!(source.latest_bar("NVDA").unwrap().is_none());
    }

    #[test]
    fn missing_file_is_an_error() {
        let source = CsvBarSource::new(PathBuf::from("/nonexistent/bars.csv"), New_York);
        assert!(source.fetch_bars("NVDA", date(1), date(31)).is_err());
    }
}
