//! CSV report adapter.
//!
//! Writes three files into the output directory: `trades.csv` (the ledger),
//! `equity.csv` (the sampled curve) and `summary.csv` (one key/value row
//! per statistic).

use crate::domain::engine::BacktestResult;
use crate::domain::error::TradesimError;
use crate::ports::report_port::ReportPort;
use std::fs;
use std::path::Path;

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    fn write_trades(result: &BacktestResult, path: &Path) -> Result<(), TradesimError> {
        let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;

        writer
            .write_record([
                "trade_no",
                "datetime",
                "type",
                "symbol",
                "price",
                "shares",
                "total_shares",
                "remaining_balance",
                "account_balance",
                "amount",
                "profit",
                "comment",
            ])
            .map_err(csv_error)?;

        for trade in &result.trades {
            let side = match trade.side {
                crate::domain::position::TradeSide::Buy => "BUY",
                crate::domain::position::TradeSide::Sell => "SELL",
            };
            writer
                .write_record([
                    trade.trade_no.to_string(),
                    trade.datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
                    side.to_string(),
                    trade.symbol.clone(),
                    format!("{:.4}", trade.price),
                    format!("{:.6}", trade.shares),
                    format!("{:.6}", trade.total_shares),
                    format!("{:.2}", trade.remaining_balance),
                    format!("{:.2}", trade.account_balance),
                    format!("{:.2}", trade.amount),
                    format!("{:.2}", trade.profit),
                    trade.comment.clone(),
                ])
                .map_err(csv_error)?;
        }

        writer.flush().map_err(TradesimError::Io)?;
        Ok(())
    }

    fn write_equity(result: &BacktestResult, path: &Path) -> Result<(), TradesimError> {
        let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;

        writer
            .write_record(["datetime", "account_balance"])
            .map_err(csv_error)?;

        for sample in &result.equity_history {
            writer
                .write_record([
                    sample.datetime.format("%Y-%m-%d %H:%M:%S").to_string(),
                    format!("{:.2}", sample.account_balance),
                ])
                .map_err(csv_error)?;
        }

        writer.flush().map_err(TradesimError::Io)?;
        Ok(())
    }

    fn write_summary(result: &BacktestResult, path: &Path) -> Result<(), TradesimError> {
        let summary = &result.summary;
        let mut writer = csv::Writer::from_path(path).map_err(csv_error)?;

        writer.write_record(["field", "value"]).map_err(csv_error)?;

        let min_equity_time = summary
            .min_equity_time
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();

        let rows = [
            ("symbol", summary.symbol.clone()),
            (
                "total_profit_realized",
                format!("{:.2}", summary.total_profit_realized),
            ),
            (
                "current_cash_balance",
                format!("{:.2}", summary.current_cash_balance),
            ),
            ("unsold_shares", format!("{:.6}", summary.unsold_shares)),
            (
                "average_price_unsold",
                format!("{:.4}", summary.average_price_unsold),
            ),
            (
                "final_account_value",
                format!("{:.2}", summary.final_account_value),
            ),
            (
                "max_drawdown_percent",
                format!("{:.4}", summary.max_drawdown_percent),
            ),
            (
                "max_drawdown_amount",
                format!("{:.2}", summary.max_drawdown_amount),
            ),
            ("min_equity", format!("{:.2}", summary.min_equity)),
            ("min_equity_time", min_equity_time),
            ("peak_value", format!("{:.2}", summary.peak_value)),
            ("initial_balance", format!("{:.2}", summary.initial_balance)),
        ];

        for (field, value) in rows {
            writer.write_record([field, &value]).map_err(csv_error)?;
        }

        writer.flush().map_err(TradesimError::Io)?;
        Ok(())
    }
}

fn csv_error(e: csv::Error) -> TradesimError {
    TradesimError::Report {
        reason: e.to_string(),
    }
}

impl ReportPort for CsvReportAdapter {
    fn write(&self, result: &BacktestResult, output: &Path) -> Result<(), TradesimError> {
        fs::create_dir_all(output)?;
        Self::write_trades(result, &output.join("trades.csv"))?;
        Self::write_equity(result, &output.join("equity.csv"))?;
        Self::write_summary(result, &output.join("summary.csv"))?;
        Ok(())
    }
}
