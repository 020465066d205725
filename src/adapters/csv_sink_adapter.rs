//! CSV sinks for the trade log and the per-session summary table.

use std::path::PathBuf;

use crate::domain::error::MeanrevError;
use crate::domain::position::Trade;
use crate::domain::summary::DailySummary;
use crate::ports::sink_port::{SummarySink, TradeLogSink};

fn csv_error(path: &PathBuf, e: csv::Error) -> MeanrevError {
    MeanrevError::Feed {
        reason: format!("failed to write {}: {e}", path.display()),
    }
}

/// Trade log: one row per fill. The entry is a BUY row with an empty
/// pnl field; the exit is a SELL row carrying the exit reason and pnl.
pub struct CsvTradeLog {
    path: PathBuf,
}

impl CsvTradeLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TradeLogSink for CsvTradeLog {
    fn write_trades(&mut self, trades: &[Trade]) -> Result<(), MeanrevError> {
        let mut wtr = csv::Writer::from_path(&self.path).map_err(|e| csv_error(&self.path, e))?;
        wtr.write_record(["timestamp", "side", "price", "exit_reason", "pnl"])
            .map_err(|e| csv_error(&self.path, e))?;

        for trade in trades {
            wtr.write_record([
                trade.entry_time.to_rfc3339(),
                "BUY".into(),
                format!("{:.4}", trade.entry_price),
                String::new(),
                String::new(),
            ])
            .map_err(|e| csv_error(&self.path, e))?;
            wtr.write_record([
                trade.exit_time.to_rfc3339(),
                "SELL".into(),
                format!("{:.4}", trade.exit_price),
                trade.exit_reason.to_string(),
                format!("{:.4}", trade.pnl),
            ])
            .map_err(|e| csv_error(&self.path, e))?;
        }

        wtr.flush()?;
        Ok(())
    }
}

/// Summary table: one row per session, written even for sessions with
/// zero trades.
pub struct CsvSummaryWriter {
    path: PathBuf,
}

impl CsvSummaryWriter {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

fn optional(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

impl SummarySink for CsvSummaryWriter {
    fn write_summaries(&mut self, summaries: &[DailySummary]) -> Result<(), MeanrevError> {
        let mut wtr = csv::Writer::from_path(&self.path).map_err(|e| csv_error(&self.path, e))?;
        wtr.write_record([
            "date",
            "trade_count",
            "total_pnl",
            "win_rate",
            "max_drawdown",
            "min_rsi",
            "max_rsi",
            "entry_threshold_hit",
            "exit_threshold_hit",
        ])
        .map_err(|e| csv_error(&self.path, e))?;

        for s in summaries {
            wtr.write_record([
                s.date.to_string(),
                s.trade_count.to_string(),
                format!("{:.4}", s.total_pnl),
                format!("{:.4}", s.win_rate),
                format!("{:.6}", s.max_drawdown),
                optional(s.min_rsi),
                optional(s.max_rsi),
                s.entry_threshold_hit.to_string(),
                s.exit_threshold_hit.to_string(),
            ])
            .map_err(|e| csv_error(&self.path, e))?;
        }

        wtr.flush()?;
        Ok(())
    }
}
