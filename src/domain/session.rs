//! Market-hours window and session segmentation.
//!
//! A session is one trading day's bars restricted to the configured
//! local market-hours window. Sessions are immutable once built.

use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;

use super::bar::MinuteBar;
use super::error::MeanrevError;

/// Local market-hours window. Defaults to 09:30-16:00 America/New_York.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub timezone: Tz,
}

impl MarketHours {
    pub fn new(open: &str, close: &str, timezone: &str) -> Result<Self, MeanrevError> {
        let tz: Tz = timezone.parse().map_err(|_| MeanrevError::Timezone {
            name: timezone.to_string(),
        })?;
        let open = parse_time("open", open)?;
        let close = parse_time("close", close)?;
        if close <= open {
            return Err(MeanrevError::ConfigInvalid {
                section: "market".into(),
                key: "close".into(),
                reason: "close must be after open".into(),
            });
        }
        Ok(MarketHours {
            open,
            close,
            timezone: tz,
        })
    }

    /// Whether a bar falls inside the window, judged in the market's
    /// local timezone regardless of the timestamp's original offset.
    pub fn contains(&self, bar: &MinuteBar) -> bool {
        let local = bar.timestamp.with_timezone(&self.timezone).time();
        local >= self.open && local <= self.close
    }

    pub fn local_date(&self, bar: &MinuteBar) -> NaiveDate {
        bar.timestamp.with_timezone(&self.timezone).date_naive()
    }
}

impl Default for MarketHours {
    fn default() -> Self {
        MarketHours {
            open: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            close: NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
            timezone: chrono_tz::America::New_York,
        }
    }
}

fn parse_time(key: &str, value: &str) -> Result<NaiveTime, MeanrevError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| MeanrevError::ConfigInvalid {
        section: "market".into(),
        key: key.into(),
        reason: format!("invalid time {value:?} (expected HH:MM)"),
    })
}

/// One trading day's in-hours bars, in timestamp order.
#[derive(Debug, Clone)]
pub struct Session {
    pub date: NaiveDate,
    pub bars: Vec<MinuteBar>,
}

/// Partition a bar stream into sessions.
///
/// Out-of-hours bars are dropped, not deferred. Remaining bars are
/// grouped by local calendar date; timestamps must be strictly
/// increasing within each group, and each date's bars must be
/// contiguous in the input. A date that reappears after another date
/// has begun is a `DataQuality` error.
pub fn segment_sessions(
    bars: Vec<MinuteBar>,
    hours: &MarketHours,
) -> Result<Vec<Session>, MeanrevError> {
    let mut sessions: Vec<Session> = Vec::new();

    for bar in bars {
        if !hours.contains(&bar) {
            continue;
        }
        let date = hours.local_date(&bar);

        match sessions.last_mut() {
            Some(session) if session.date == date => {
                let prev = session.bars.last().map(|b| b.timestamp);
                if let Some(prev) = prev {
                    if bar.timestamp <= prev {
                        return Err(MeanrevError::DataQuality {
                            timestamp: bar.timestamp.to_rfc3339(),
                            reason: format!("timestamp not after previous bar {prev}"),
                        });
                    }
                }
                session.bars.push(bar);
            }
            _ => {
                if sessions.iter().any(|s| s.date == date) {
                    return Err(MeanrevError::DataQuality {
                        timestamp: bar.timestamp.to_rfc3339(),
                        reason: format!("bars for {date} are not contiguous"),
                    });
                }
                sessions.push(Session {
                    date,
                    bars: vec![bar],
                });
            }
        }
    }

    sessions.sort_by_key(|s| s.date);
    Ok(sessions)
}
